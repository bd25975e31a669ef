pub mod error;
pub mod git_info;
pub mod logger;
pub mod validation;
