//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

use chrono_tz::Tz;

/// Fixed civil timezone all date/time comparisons are pinned to.
///
/// Every stored civil date and time string is interpreted in this zone,
/// independent of the server's locale.
pub const CIVIL_TIMEZONE: Tz = chrono_tz::Africa::Cairo;

/// Format of stored civil date strings (`2025-03-10`).
pub const CIVIL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of stored civil time strings (`09:30`).
pub const CIVIL_TIME_FORMAT: &str = "%H:%M";

/// Start-of-day fallback when an appointment carries no starting time.
pub const DEFAULT_STARTING_TIME: &str = "00:00";

/// End-of-day fallback when an appointment carries no ending time.
pub const DEFAULT_ENDING_TIME: &str = "23:59";

// Pagination defaults for the admin listing surface
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const MAX_PAGE_SIZE: u32 = 100;
