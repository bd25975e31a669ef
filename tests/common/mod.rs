#![allow(dead_code)]

use async_trait::async_trait;
use daily_read::domain::ports::ProjectDataSource;
use daily_read::{DailyReadConfig, ProjectDataMaster, ProjectDataRecord, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tempfile::TempDir;

pub const ORDERER: &str = "dummy@dummy.se";
pub const API_KEY: &str = "portal-api-key";

/// Serves a fixed set of project documents, like StatusDB would.
pub struct FixedSource {
    pub records: Vec<(String, Value)>,
}

#[async_trait]
impl ProjectDataSource for FixedSource {
    fn name(&self) -> &str {
        "Fixed test source"
    }

    fn dirname(&self) -> &str {
        "NGIS"
    }

    async fn get_data(&self, project_id: Option<&str>) -> Result<BTreeMap<String, ProjectDataRecord>> {
        let mut data = BTreeMap::new();
        for (path, value) in &self.records {
            let record = ProjectDataRecord::new(path, Some(value.clone()))?;
            if project_id.map_or(true, |id| id == record.project_id) {
                data.insert(record.project_id.clone(), record);
            }
        }
        Ok(data)
    }
}

/// Project document in the given state: "open" ends at Library QC, "closed" at delivery.
pub fn project_document(portal_id: &str, state: &str) -> Value {
    project_document_for(portal_id, state, ORDERER)
}

pub fn project_document_for(portal_id: &str, state: &str, orderer: &str) -> Value {
    let project_dates = match state {
        "closed" => json!({
            "2023-06-15": ["Samples Received"],
            "2023-06-28": ["Library QC finished"],
            "2023-07-20": ["All Raw data Delivered"]
        }),
        _ => json!({
            "2023-06-15": ["Samples Received"],
            "2023-06-28": ["Library QC finished"]
        }),
    };

    json!({
        "portal_id": portal_id,
        "orderer": orderer,
        "project_dates": project_dates
    })
}

pub fn test_config(temp_dir: &TempDir) -> DailyReadConfig {
    DailyReadConfig {
        fetch_from_ngis: false,
        data_location: temp_dir.path().join("data").to_string_lossy().into_owned(),
        request_timeout_seconds: 5,
        ..Default::default()
    }
}

pub fn portal_config(temp_dir: &TempDir, portal_url: String) -> DailyReadConfig {
    DailyReadConfig {
        order_portal_url: Some(portal_url),
        order_portal_api_key: Some(API_KEY.to_string()),
        ..test_config(temp_dir)
    }
}

/// Data master whose projects were fetched and saved, so every one of them is new.
pub async fn saved_master(config: &DailyReadConfig, projects: &[(&str, &str)]) -> ProjectDataMaster {
    let records = projects
        .iter()
        .map(|(portal_id, state)| {
            (
                format!("NGIS/2023/{}.json", portal_id),
                project_document(portal_id, state),
            )
        })
        .collect();

    let mut master =
        ProjectDataMaster::with_sources(config, vec![Box::new(FixedSource { records })]).unwrap();
    master.get_data(None).await.unwrap();
    master.save_data().unwrap();
    master
}

pub fn orders_response() -> Value {
    json!({
        "items": [
            {
                "identifier": "NGI123456",
                "iuid": "order-open",
                "status": "accepted",
                "owner": {"email": ORDERER},
                "reports": []
            },
            {
                "identifier": "NGI123455",
                "iuid": "order-closed",
                "status": "closed",
                "owner": {"email": ORDERER},
                "reports": [
                    {"iuid": "report-closed", "name": "Project Progress", "status": "published"}
                ]
            },
            {
                "identifier": "NGI123454",
                "iuid": "order-two-reports",
                "status": "processing",
                "owner": {"email": ORDERER},
                "reports": [
                    {"iuid": "report-a", "name": "Project Progress", "status": "published"},
                    {"iuid": "report-b", "name": "Project Progress", "status": "review"}
                ]
            },
            {
                "identifier": "NGI123453",
                "iuid": "order-with-report",
                "status": "processing",
                "owner": {"email": ORDERER},
                "reports": [
                    {"iuid": "report-existing", "name": "Project Progress", "status": "published"},
                    {"iuid": "invoice-1", "name": "Invoice", "status": "published"}
                ]
            }
        ]
    })
}
