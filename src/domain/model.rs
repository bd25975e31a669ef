use crate::utils::error::{DailyReadError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

pub const PROJECT_PROGRESS_REPORT: &str = "Project Progress";

/// Project statuses in the order a project moves through them.
pub const DEFAULT_STATUS_PRIORITY: [&str; 6] = [
    "None",
    "Samples Received",
    "Reception Control finished",
    "Library QC finished",
    "All Samples Sequenced",
    "All Raw data Delivered",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPriority {
    statuses: Vec<String>,
}

impl StatusPriority {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statuses: statuses.into_iter().map(Into::into).collect(),
        }
    }

    pub fn priority_of(&self, status: &str) -> Option<u32> {
        self.statuses
            .iter()
            .position(|known| known == status)
            .map(|index| index as u32)
    }

    pub fn status_of(&self, priority: u32) -> Option<&str> {
        self.statuses.get(priority as usize).map(String::as_str)
    }
}

impl Default for StatusPriority {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_PRIORITY)
    }
}

/// A single project as stored in the data location, e.g. `NGIS/2023/NGI0002313.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDataRecord {
    pub ngi_node: String,
    pub year: String,
    pub file_name: String,
    pub relative_path: String,
    pub relative_dirpath: String,
    pub project_id: String,
    pub report_iuid: Option<String>,
    pub orderer: Option<String>,
    pub data: Option<Value>,
}

impl ProjectDataRecord {
    pub fn new(relative_path: &str, data: Option<Value>) -> Result<Self> {
        let path = Path::new(relative_path);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let node_year = path.parent().unwrap_or_else(|| Path::new(""));
        let year = node_year
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ngi_node = node_year
            .parent()
            .map(|node| node.to_string_lossy().into_owned())
            .unwrap_or_default();
        let project_id = Self::portal_id_from_path(relative_path);

        let orderer = match &data {
            Some(value) => match value.get("orderer") {
                Some(Value::String(orderer)) => Some(orderer.clone()),
                Some(Value::Null) => None,
                Some(other) => Some(other.to_string()),
                None => {
                    return Err(DailyReadError::ValidationError {
                        message: format!(
                            "Orderer missing for project_id: {}, NGI node: {}",
                            project_id, ngi_node
                        ),
                    })
                }
            },
            None => None,
        };

        Ok(Self {
            ngi_node,
            year,
            file_name,
            relative_path: relative_path.to_string(),
            relative_dirpath: node_year.to_string_lossy().into_owned(),
            project_id,
            report_iuid: None,
            orderer,
            data,
        })
    }

    /// Reads the record's data from disk when the file is still there.
    pub fn load(data_location: &Path, relative_path: &str) -> Result<Self> {
        let full_path = data_location.join(relative_path);
        if !full_path.is_file() {
            return Self::new(relative_path, None);
        }

        let content = std::fs::read_to_string(&full_path)?;
        let data: Value = serde_json::from_str(&content)?;
        Self::new(relative_path, Some(data))
    }

    /// File name without its extension.
    pub fn portal_id_from_path(path: &str) -> String {
        Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Most advanced known status among `project_dates`.
    pub fn status(&self, priority: &StatusPriority) -> Option<String> {
        self.status_timeline()
            .into_iter()
            .flat_map(|(_, statuses)| statuses)
            .filter_map(|status| priority.priority_of(&status).map(|rank| (rank, status)))
            .max_by_key(|(rank, _)| *rank)
            .map(|(_, status)| status)
    }

    pub fn status_timeline(&self) -> Vec<(String, Vec<String>)> {
        let Some(dates) = self
            .data
            .as_ref()
            .and_then(|data| data.get("project_dates"))
            .and_then(Value::as_object)
        else {
            return Vec::new();
        };

        let timeline: BTreeMap<String, Vec<String>> = dates
            .iter()
            .map(|(date, statuses)| {
                let statuses = match statuses {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Value::String(single) => vec![single.clone()],
                    _ => Vec::new(),
                };
                (date.clone(), statuses)
            })
            .collect();

        timeline.into_iter().collect()
    }
}

/// One row of the StatusDB `dailyread_dates` view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Value,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewResponse {
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReport {
    pub iuid: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub identifier: String,
    pub status: String,
    #[serde(default)]
    pub iuid: Option<String>,
    #[serde(default)]
    pub reports: Vec<OrderReport>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Order {
    pub fn is_closed(&self) -> bool {
        self.status.eq_ignore_ascii_case("closed")
    }

    pub fn progress_reports(&self) -> Vec<&OrderReport> {
        self.reports
            .iter()
            .filter(|report| report.name == PROJECT_PROGRESS_REPORT)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPage {
    #[serde(default)]
    pub items: Vec<Order>,
}

/// Projects of one orderer, grouped by current status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrdererReports {
    pub projects: BTreeMap<String, Vec<ProjectDataRecord>>,
    pub delete_report_for: BTreeMap<String, Vec<ProjectDataRecord>>,
}

pub type ModifiedOrders = BTreeMap<String, OrdererReports>;
