pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalSnapshotSource, cli::LocalStorage, CliConfig};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3SnapshotSource, S3Storage};

pub use core::{
    etl::{EtlEngine, OutputFormat},
    lookup::JsonFileLookup,
    orchestrator::TransformationOrchestrator,
};
pub use utils::error::{EtlError, Result};
