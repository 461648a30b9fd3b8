//! Configuration parsing for keybridge
//!
//! This crate handles parsing the KDL configuration file that describes
//! which keyboard to read and how the virtual output keyboard presents
//! itself to the system.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
