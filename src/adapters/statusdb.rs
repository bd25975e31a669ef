use crate::config::DailyReadConfig;
use crate::domain::model::{ViewResponse, ViewRow};
use crate::utils::error::{DailyReadError, Result};
use crate::utils::validation::validate_required_field;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const PROJECTS_DB: &str = "projects";
const DAILY_READ_VIEW: &str = "_design/project/_view/dailyread_dates";

/// Authenticated connection to the NGI Stockholm StatusDB (CouchDB).
pub struct StatusDbSession {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for StatusDbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusDbSession")
            .field("url", &self.display_url())
            .finish()
    }
}

impl StatusDbSession {
    /// Connects and checks the server answers before any view is queried.
    pub async fn connect(config: &DailyReadConfig) -> Result<Self> {
        let base_url = config.statusdb_service_url()?;
        let username =
            validate_required_field("STHLM_STATUSDB_USERNAME", &config.statusdb_username)?.clone();
        let password =
            validate_required_field("STHLM_STATUSDB_PASSWORD", &config.statusdb_password)?.clone();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        let session = Self {
            client,
            base_url,
            username,
            password,
        };

        if let Err(e) = session.server_information().await {
            let url = session.display_url();
            return Err(DailyReadError::ConnectionError {
                message: format!("Couchdb connection failed for url {} with error {}", url, e),
                url,
            });
        }

        tracing::debug!("Connected to StatusDB at {}", session.display_url());
        Ok(session)
    }

    /// Service URL with the password masked, safe for logs and errors.
    pub fn display_url(&self) -> String {
        match self.base_url.split_once("://") {
            Some((scheme, rest)) => format!("{}://{}:*********@{}", scheme, self.username, rest),
            None => format!("https://{}:*********@{}", self.username, self.base_url),
        }
    }

    async fn server_information(&self) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Rows of the `dailyread_dates` view for projects still open or closed on or after `close_date`.
    pub async fn rows(&self, close_date: &str) -> Result<Vec<ViewRow>> {
        let url = format!("{}/{}/{}", self.base_url, PROJECTS_DB, DAILY_READ_VIEW);
        tracing::debug!("Querying StatusDB view {} with close date {}", url, close_date);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({
                "descending": true,
                "end_key": [close_date, "ZZZZ"],
            }))
            .send()
            .await?
            .error_for_status()?;

        let view: ViewResponse = response.json().await?;
        tracing::debug!("StatusDB returned {} rows", view.rows.len());
        Ok(view.rows)
    }
}
