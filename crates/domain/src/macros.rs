//! Macro for implementing Display and FromStr for domain enums
//!
//! Eliminates boilerplate for enum/string conversions by providing a single
//! implementation for both Display and FromStr traits. Parsing is
//! case-insensitive; output is the canonical wire string.
//!
//! # Example
//!
//! ```rust
//! use mawid_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SweepOutcome {
//!     Unchanged,
//!     Updated,
//! }
//!
//! impl_domain_status_conversions!(SweepOutcome {
//!     Unchanged => "unchanged",
//!     Updated => "updated",
//! });
//! ```

/// Implements Display and FromStr traits for domain enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their wire strings
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
