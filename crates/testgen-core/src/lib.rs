pub mod common;
pub mod domain;
pub mod modules;

pub use common::{TestgenConfig, ToolCommand};
pub use domain::{Template, TestgenError, TestgenErrorCategory, TestgenResult};
