//! Domain types and models

pub mod appointment;
pub mod group;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, RatedUserEntry, RatingEntry, Review};
pub use group::Group;
pub use user::{Role, User};
