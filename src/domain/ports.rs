use crate::domain::model::ProjectDataRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// A node backend that knows the current state of its projects.
#[async_trait]
pub trait ProjectDataSource: Send + Sync {
    fn name(&self) -> &str;
    fn dirname(&self) -> &str;

    /// Projects keyed by portal id; `project_id` narrows the fetch to one project.
    async fn get_data(
        &self,
        project_id: Option<&str>,
    ) -> Result<BTreeMap<String, ProjectDataRecord>>;
}
