//! User registry use cases

pub mod ports;
pub mod service;

pub use service::{CreateUser, UserService};
