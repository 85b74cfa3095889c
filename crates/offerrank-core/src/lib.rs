//! offerrank-core: offer types and ranking configuration shared by every offerrank crate.

pub mod config;
pub mod types;

pub use config::{ConfigError, PluginEndpoint, RankingConfig, parse_duration};
pub use types::*;
