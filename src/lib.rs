pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::storage::LocalStorage;
pub use config::DailyReadConfig;
pub use core::{
    data_master::ProjectDataMaster,
    engine::{DailyReadEngine, GenerateOptions, RunSummary},
    order_portal::OrderPortal,
};
pub use domain::model::{ProjectDataRecord, StatusPriority};
pub use utils::error::{DailyReadError, Result};
