pub mod config;

pub use config::{TestgenConfig, ToolCommand};
