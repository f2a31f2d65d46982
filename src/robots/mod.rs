//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! Records are kept per origin for the lifetime of the process, and an origin
//! whose robots.txt cannot be obtained is treated as allowing everything.

mod parser;
mod policy;
mod record;

pub use parser::{product_token, ParsedRobots};
pub use policy::{origin_of, RobotsPolicy};
pub use record::RobotsRecord;
