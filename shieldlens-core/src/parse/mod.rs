//! Line parsers for the two log streams.
//!
//! Both parsers are pure: a line either yields a complete record or nothing.
//! Rejected lines are ordinary log noise, so there is no error type here.

mod access;
mod error_log;


pub use access::{ACCESS_TIME_FORMAT, parse_access_line};
pub use error_log::parse_error_line;
