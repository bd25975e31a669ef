use crate::domain::model::{ProjectDataRecord, StatusPriority};
use crate::utils::error::{DailyReadError, Result};
use chrono::{DateTime, Local};
use minijinja::{context, Environment};
use serde::Serialize;

const TEMPLATE_NAME: &str = "daily_report.html";
const TEMPLATE: &str = include_str!("../../templates/daily_report.html");

#[derive(Debug, Serialize)]
struct TimelineStep {
    date: String,
    statuses: Vec<String>,
}

/// Renders the Project Progress page of a single project.
pub struct DailyReport {
    env: Environment<'static>,
}

impl DailyReport {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render(
        &self,
        project: &ProjectDataRecord,
        priority: &StatusPriority,
        generated_at: DateTime<Local>,
    ) -> Result<String> {
        let status = project.status(priority).ok_or_else(|| DailyReadError::ValidationError {
            message: format!("No known status for {}", project.project_id),
        })?;

        let timeline: Vec<TimelineStep> = project
            .status_timeline()
            .into_iter()
            .map(|(date, statuses)| TimelineStep { date, statuses })
            .collect();

        let template = self.env.get_template(TEMPLATE_NAME)?;
        let html = template.render(context! {
            project => project,
            status => status,
            timeline => timeline,
            generated_at => generated_at.format("%Y-%m-%d %H:%M").to_string(),
        })?;
        Ok(html)
    }

    pub fn report_file_name(project: &ProjectDataRecord) -> String {
        format!("{}_progress_report.html", project.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_contains_status_and_timeline() {
        let record = ProjectDataRecord::new(
            "NGIS/2023/NGI123456.json",
            Some(json!({
                "orderer": "dummy@dummy.se",
                "project_dates": {
                    "2023-06-15": ["Samples Received"],
                    "2023-06-28": ["Library QC finished"]
                }
            })),
        )
        .unwrap();

        let html = DailyReport::new()
            .unwrap()
            .render(&record, &StatusPriority::default(), Local::now())
            .unwrap();

        assert!(html.contains("Project Progress for NGI123456"));
        assert!(html.contains("Library QC finished"));
        assert!(html.contains("2023-06-15"));
        assert_eq!(
            DailyReport::report_file_name(&record),
            "NGI123456_progress_report.html"
        );
    }

    #[test]
    fn test_render_escapes_html() {
        let record = ProjectDataRecord::new(
            "NGIS/2023/NGI9.json",
            Some(json!({
                "orderer": "<script>x</script>",
                "project_dates": {"2023-01-01": ["Samples Received"]}
            })),
        )
        .unwrap();

        let html = DailyReport::new()
            .unwrap()
            .render(&record, &StatusPriority::default(), Local::now())
            .unwrap();
        assert!(!html.contains("<script>x</script>"));
    }

    #[test]
    fn test_render_without_status_fails() {
        let record =
            ProjectDataRecord::new("NGIS/2023/NGI9.json", Some(json!({"orderer": "a@b.se"}))).unwrap();
        assert!(DailyReport::new()
            .unwrap()
            .render(&record, &StatusPriority::default(), Local::now())
            .is_err());
    }
}
