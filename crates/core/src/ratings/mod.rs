//! Rating ledger use cases

pub mod service;

pub use service::{RatingService, RatingSubmission};
