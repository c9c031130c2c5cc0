#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod bundle;
pub mod cleanup;
pub mod config;
pub mod deploy;
pub mod error;
pub mod flatten;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod output;
pub mod pattern;
pub mod project;

pub use builder::{BuildReport, Pipeline, Task, TaskReport};
pub use config::{ConfigError, ProjectConfig};
pub use error::{PipelineError, PipelineResult};
pub use project::{CopyJob, ProjectLayout};
