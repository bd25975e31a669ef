pub mod data_master;
pub mod engine;
pub mod order_portal;
pub mod report;

pub use crate::domain::model::{ProjectDataRecord, StatusPriority};
pub use crate::domain::ports::{ProjectDataSource, Storage};
pub use crate::utils::error::Result;
