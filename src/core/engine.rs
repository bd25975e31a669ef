use crate::config::DailyReadConfig;
use crate::core::data_master::ProjectDataMaster;
use crate::core::order_portal::OrderPortal;
use crate::core::report::DailyReport;
use crate::domain::model::{ProjectDataRecord, StatusPriority};
use crate::domain::ports::Storage;
use crate::utils::error::{DailyReadError, Result};
use chrono::Local;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub upload: bool,
    pub report_status: String,
    pub project_id: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            upload: false,
            report_status: "published".to_string(),
            project_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub modified: usize,
    pub uploaded: usize,
    pub deleted: usize,
    pub written: usize,
    pub failed: usize,
    pub commit: Option<String>,
}

pub struct DailyReadEngine<S: Storage> {
    config: DailyReadConfig,
    master: ProjectDataMaster,
    storage: Option<S>,
    report: DailyReport,
    priority: StatusPriority,
}

impl<S: Storage> DailyReadEngine<S> {
    pub fn new(config: DailyReadConfig, master: ProjectDataMaster, storage: Option<S>) -> Result<Self> {
        Ok(Self {
            config,
            master,
            storage,
            report: DailyReport::new()?,
            priority: StatusPriority::default(),
        })
    }

    /// Projects that changed since the last commit, without fetching anything.
    pub fn pending_projects(&self) -> Result<Vec<ProjectDataRecord>> {
        self.master.get_modified_or_new_projects()
    }

    pub async fn generate(&mut self, options: &GenerateOptions) -> Result<RunSummary> {
        if !options.upload && self.storage.is_none() {
            return Err(DailyReadError::MissingConfigError {
                field: "REPORT_OUTPUT_LOCATION".to_string(),
            });
        }

        // Extract
        tracing::info!("Fetching data from {}", self.master.source_names().join(", "));
        self.master.get_data(options.project_id.as_deref()).await?;
        self.master.save_data()?;

        let mut summary = RunSummary {
            fetched: self.master.data.len(),
            ..Default::default()
        };

        let modified = self.master.get_modified_or_new_projects()?;
        summary.modified = modified.len();
        if modified.is_empty() {
            tracing::info!("No modified or new projects, nothing to report");
            return Ok(summary);
        }
        tracing::info!("{} modified or new projects", modified.len());

        // Report
        let staged = if options.upload {
            self.upload_reports(&modified, &options.report_status, &mut summary)
                .await?
        } else {
            self.write_reports(&modified, &mut summary).await?;
            0
        };

        // Commit
        if staged > 0 {
            let message = format!("Successfully ran DailyRead, reported {} project(s)", staged);
            summary.commit = Some(self.master.commit_staged_data(&message)?);
        }

        tracing::info!(
            "Run finished: {} uploaded, {} deleted, {} written, {} failed",
            summary.uploaded,
            summary.deleted,
            summary.written,
            summary.failed
        );
        Ok(summary)
    }

    /// Uploads or deletes reports per orderer; returns the number of staged projects.
    /// A failing orderer or project is logged and counted, and the run carries on.
    async fn upload_reports(
        &self,
        modified: &[ProjectDataRecord],
        report_status: &str,
        summary: &mut RunSummary,
    ) -> Result<usize> {
        let mut portal = OrderPortal::new(&self.config, &self.master)?;
        let mut handled = BTreeSet::new();
        let mut staged = 0;

        for orderer in self.master.find_unique_orderers()? {
            let modified_orders = match portal.get_orders(Some(orderer.as_str()), None, None).await {
                Ok(()) => portal.process_orders(&self.priority),
                Err(e) => Err(e),
            };
            let modified_orders = match modified_orders {
                Ok(modified_orders) => modified_orders,
                Err(e) => {
                    tracing::error!("Failed to process orders for {}: {}", orderer, e);
                    summary.failed += modified
                        .iter()
                        .filter(|record| record.orderer.as_deref() == Some(orderer.as_str()))
                        .filter(|record| !handled.contains(&record.project_id))
                        .count();
                    continue;
                }
            };

            for reports in modified_orders.values() {
                for record in reports.projects.values().flatten() {
                    if !handled.insert(record.project_id.clone()) {
                        continue;
                    }

                    let html = match self.report.render(record, &self.priority, Local::now()) {
                        Ok(html) => html,
                        Err(e) => {
                            tracing::error!("Failed to render report for {}: {}", record.project_id, e);
                            summary.failed += 1;
                            continue;
                        }
                    };

                    match portal
                        .upload_report_to_order_portal(&html, record, report_status)
                        .await
                    {
                        Ok(true) if self.stage(record) => {
                            summary.uploaded += 1;
                            staged += 1;
                        }
                        Ok(_) => summary.failed += 1,
                        Err(e) => {
                            tracing::error!("Failed to upload report for {}: {}", record.project_id, e);
                            summary.failed += 1;
                        }
                    }
                }

                for record in reports.delete_report_for.values().flatten() {
                    if !handled.insert(record.project_id.clone()) {
                        continue;
                    }

                    if record.report_iuid.is_none() {
                        tracing::info!("{} is closed and has no report to remove", record.project_id);
                        if self.stage(record) {
                            staged += 1;
                        } else {
                            summary.failed += 1;
                        }
                        continue;
                    }

                    match portal.delete_report_from_order_portal(record).await {
                        Ok(true) if self.stage(record) => {
                            summary.deleted += 1;
                            staged += 1;
                        }
                        Ok(_) => summary.failed += 1,
                        Err(e) => {
                            tracing::error!("Failed to delete report for {}: {}", record.project_id, e);
                            summary.failed += 1;
                        }
                    }
                }
            }
        }

        Ok(staged)
    }

    fn stage(&self, record: &ProjectDataRecord) -> bool {
        match self.master.stage_data_for_project(record) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to stage data for {}: {}", record.project_id, e);
                false
            }
        }
    }

    /// Renders reports to disk; the data stays unstaged so the projects are reported again later.
    async fn write_reports(&self, modified: &[ProjectDataRecord], summary: &mut RunSummary) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        for record in modified {
            if record.status(&self.priority).is_none() {
                tracing::warn!("No known status for {}, skipping", record.project_id);
                continue;
            }

            let html = self.report.render(record, &self.priority, Local::now())?;
            let path = storage
                .write_file(&DailyReport::report_file_name(record), html.as_bytes())
                .await?;
            tracing::info!("Report for {} written to {}", record.project_id, path);
            summary.written += 1;
        }

        Ok(())
    }
}
