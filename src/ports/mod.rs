//! Port traits: what the engine needs from its environment.

pub mod config_port;
pub mod data_port;
pub mod report_port;
pub mod stockset_port;
