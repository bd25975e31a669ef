use crate::config::DailyReadConfig;
use crate::core::data_master::ProjectDataMaster;
use crate::domain::model::{
    ModifiedOrders, Order, OrdersPage, ProjectDataRecord, StatusPriority, PROJECT_PROGRESS_REPORT,
};
use crate::utils::error::{DailyReadError, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-OrderPortal-API-key";
const REPORT_FILENAME: &str = "project_progress.html";
const REPORT_STATUSES: [&str; 2] = ["published", "review"];

/// Client for the order portal, bound to the project data of the current run.
pub struct OrderPortal<'a> {
    base_url: String,
    api_key: String,
    client: Client,
    projects_data: &'a ProjectDataMaster,
    pub all_orders: Vec<Order>,
}

impl<'a> OrderPortal<'a> {
    pub fn new(config: &DailyReadConfig, projects_data: &'a ProjectDataMaster) -> Result<Self> {
        let base_url = config
            .order_portal_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| DailyReadError::config("environment variable ORDER_PORTAL_URL not set"))?
            .trim_end_matches('/')
            .to_string();
        let api_key = config
            .order_portal_api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                DailyReadError::config("Environment variable ORDER_PORTAL_API_KEY not set")
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            projects_data,
            all_orders: Vec::new(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Response> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!("GET {} {:?}", url, params);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }

    /// Replaces `all_orders` with the orders matching the given filters.
    pub async fn get_orders(
        &mut self,
        orderer: Option<&str>,
        node: Option<&str>,
        status: Option<&str>,
    ) -> Result<()> {
        let mut params = Vec::new();
        if let Some(orderer) = orderer {
            params.push(("orderer", orderer));
        }
        if let Some(node) = node {
            params.push(("node", node));
        }
        if let Some(status) = status {
            params.push(("status", status));
        }

        let page: OrdersPage = self.get("api/v1/orders", &params).await?.json().await?;
        tracing::debug!("Order portal returned {} orders", page.items.len());
        self.all_orders = page.items;
        Ok(())
    }

    /// Groups the modified projects found among `all_orders` by orderer and status.
    pub fn process_orders(&self, priority: &StatusPriority) -> Result<ModifiedOrders> {
        // 包含這次沒抓到、但上次執行留下未回報的專案
        let modified: BTreeMap<String, ProjectDataRecord> = self
            .projects_data
            .get_modified_or_new_projects()?
            .into_iter()
            .map(|record| (record.project_id.clone(), record))
            .collect();

        let mut modified_orders = ModifiedOrders::new();
        for order in &self.all_orders {
            let Some(record) = modified.get(&order.identifier) else {
                continue;
            };

            let reports = order.progress_reports();
            if reports.len() > 1 {
                return Err(DailyReadError::processing(format!(
                    "Multiple reports for {} found in the Order Portal for order {}",
                    PROJECT_PROGRESS_REPORT, order.identifier
                )));
            }

            let mut record = record.clone();
            record.report_iuid = reports.first().map(|report| report.iuid.clone());

            let Some(status) = record.status(priority) else {
                tracing::warn!("No known status for {}, skipping", record.project_id);
                continue;
            };
            let Some(orderer) = record.orderer.clone() else {
                continue;
            };

            let entry = modified_orders.entry(orderer).or_default();
            let bucket = if order.is_closed() {
                &mut entry.delete_report_for
            } else {
                &mut entry.projects
            };
            bucket.entry(status).or_default().push(record);
        }

        Ok(modified_orders)
    }

    /// Creates or replaces the Project Progress report of `project`; false unless the portal answers 200.
    pub async fn upload_report_to_order_portal(
        &self,
        report: &str,
        project: &ProjectDataRecord,
        status: &str,
    ) -> Result<bool> {
        if !REPORT_STATUSES.contains(&status) {
            return Err(DailyReadError::ValidationError {
                message: format!(
                    "Report status {} is not one of {}",
                    status,
                    REPORT_STATUSES.join(", ")
                ),
            });
        }

        let (url, payload, operation) = match &project.report_iuid {
            Some(iuid) => (
                format!("{}/api/v1/report/{}", self.base_url, iuid),
                json!({
                    "name": PROJECT_PROGRESS_REPORT,
                    "filename": REPORT_FILENAME,
                    "status": status,
                    "file": report,
                }),
                "updated",
            ),
            None => (
                format!("{}/api/v1/report", self.base_url),
                json!({
                    "order": project.project_id,
                    "name": PROJECT_PROGRESS_REPORT,
                    "filename": REPORT_FILENAME,
                    "status": status,
                    "file": report,
                }),
                "uploaded",
            ),
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if response.status() == StatusCode::OK {
            tracing::info!("Report {} for {}", operation, project.project_id);
            Ok(true)
        } else {
            tracing::error!(
                "Report not {} for {}, reason: {}",
                operation,
                project.project_id,
                response.status()
            );
            Ok(false)
        }
    }

    /// Removes the Project Progress report of a closed order.
    pub async fn delete_report_from_order_portal(&self, project: &ProjectDataRecord) -> Result<bool> {
        let Some(iuid) = &project.report_iuid else {
            tracing::error!("No report to delete for {}", project.project_id);
            return Ok(false);
        };

        let response = self
            .client
            .delete(format!("{}/api/v1/report/{}", self.base_url, iuid))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::OK {
            tracing::info!("Report deleted for {}", project.project_id);
            Ok(true)
        } else {
            tracing::error!(
                "Report not deleted for {}, reason: {}",
                project.project_id,
                response.status()
            );
            Ok(false)
        }
    }
}
