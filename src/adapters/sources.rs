use crate::adapters::statusdb::StatusDbSession;
use crate::config::DailyReadConfig;
use crate::domain::model::{ProjectDataRecord, ViewRow};
use crate::domain::ports::ProjectDataSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Datelike, Local};
use serde_json::Value;
use std::collections::BTreeMap;

/// NGI Stockholm projects, read from StatusDB.
#[derive(Debug)]
pub struct StockholmProjectData {
    session: StatusDbSession,
    config: DailyReadConfig,
}

impl StockholmProjectData {
    pub const NAME: &'static str = "NGI Stockholm";
    pub const DIRNAME: &'static str = "NGIS";

    pub async fn connect(config: &DailyReadConfig) -> Result<Self> {
        let session = StatusDbSession::connect(config).await?;
        Ok(Self::new(session, config.clone()))
    }

    pub fn new(session: StatusDbSession, config: DailyReadConfig) -> Self {
        Self { session, config }
    }

    fn order_year(row: &ViewRow) -> String {
        match row.value.get("order_year") {
            Some(Value::String(year)) if !year.is_empty() => return year.clone(),
            Some(Value::Number(year)) => return year.to_string(),
            _ => {}
        }

        // key[0] 是專案的日期 (YYYY-MM-DD)
        let from_key = row
            .key
            .get(0)
            .and_then(Value::as_str)
            .and_then(|date| date.get(..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()));

        match from_key {
            Some(year) => year.to_string(),
            None => Local::now().year().to_string(),
        }
    }
}

#[async_trait]
impl ProjectDataSource for StockholmProjectData {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dirname(&self) -> &str {
        Self::DIRNAME
    }

    async fn get_data(
        &self,
        project_id: Option<&str>,
    ) -> Result<BTreeMap<String, ProjectDataRecord>> {
        let close_date = self.config.close_date(Local::now().date_naive());
        let rows = self.session.rows(&close_date).await?;

        let mut data = BTreeMap::new();
        for row in rows {
            let Some(portal_id) = row.value.get("portal_id").and_then(Value::as_str) else {
                tracing::warn!(
                    "Skipping StatusDB row {} without portal_id",
                    row.id.as_deref().unwrap_or("<no id>")
                );
                continue;
            };

            if project_id.is_some_and(|wanted| wanted != portal_id) {
                continue;
            }

            let relative_path = format!("{}/{}/{}.json", Self::DIRNAME, Self::order_year(&row), portal_id);
            let record = ProjectDataRecord::new(&relative_path, Some(row.value.clone()))?;
            data.insert(portal_id.to_string(), record);
        }

        tracing::info!("Fetched {} projects from {}", data.len(), Self::NAME);
        Ok(data)
    }
}

/// NGI SNP&SEQ; no backend is connected yet, so no projects are reported.
#[derive(Debug, Default)]
pub struct SnpseqProjectData;

#[async_trait]
impl ProjectDataSource for SnpseqProjectData {
    fn name(&self) -> &str {
        "SNP&SEQ"
    }

    fn dirname(&self) -> &str {
        "SNPSEQ"
    }

    async fn get_data(
        &self,
        _project_id: Option<&str>,
    ) -> Result<BTreeMap<String, ProjectDataRecord>> {
        tracing::debug!("{} has no data backend yet", self.name());
        Ok(BTreeMap::new())
    }
}

/// Uppsala Genome Center; no backend is connected yet.
#[derive(Debug, Default)]
pub struct UgcProjectData;

#[async_trait]
impl ProjectDataSource for UgcProjectData {
    fn name(&self) -> &str {
        "Uppsala Genome Center"
    }

    fn dirname(&self) -> &str {
        "UGC"
    }

    async fn get_data(
        &self,
        _project_id: Option<&str>,
    ) -> Result<BTreeMap<String, ProjectDataRecord>> {
        tracing::debug!("{} has no data backend yet", self.name());
        Ok(BTreeMap::new())
    }
}
