//! Appointment use cases: creation, acceptance, lifecycle mutations

pub mod attendance;
pub mod ports;
pub mod service;

pub use attendance::{derive_attendance, DerivedAttendance};
pub use service::{AppointmentService, CreateAppointment, UpdateAppointment};
