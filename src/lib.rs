pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use config::RelayConfig;
pub use core::intake::{LabelIntake, PipelineStage, StageFailure};
pub use utils::error::{RelayError, Result};
