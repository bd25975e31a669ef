#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{DailyReadError, Result};
use crate::utils::validation::{
    validate_absolute_path, validate_non_empty_string, validate_positive_number,
    validate_required_field, validate_url, Validate,
};
use chrono::{Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CLOSED_WINDOW_MONTHS: u32 = 6;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyReadConfig {
    pub fetch_from_ngis: bool,
    pub fetch_from_snpseq: bool,
    pub fetch_from_ugc: bool,
    pub data_location: String,
    pub report_output_location: Option<String>,
    pub statusdb_url: Option<String>,
    pub statusdb_username: Option<String>,
    #[serde(skip_serializing)]
    pub statusdb_password: Option<String>,
    pub order_portal_url: Option<String>,
    #[serde(skip_serializing)]
    pub order_portal_api_key: Option<String>,
    pub closed_window_months: u32,
    pub request_timeout_seconds: u64,
}

impl Default for DailyReadConfig {
    fn default() -> Self {
        Self {
            fetch_from_ngis: true,
            fetch_from_snpseq: false,
            fetch_from_ugc: false,
            data_location: String::new(),
            report_output_location: None,
            statusdb_url: None,
            statusdb_username: None,
            statusdb_password: None,
            order_portal_url: None,
            order_portal_api_key: None,
            closed_window_months: DEFAULT_CLOSED_WINDOW_MONTHS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl DailyReadConfig {
    /// 從環境變數載入配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let closed_window_months = match var("DAILY_READ_CLOSED_WINDOW_MONTHS") {
            Some(raw) => raw.trim().parse().map_err(|_| DailyReadError::InvalidConfigValueError {
                field: "DAILY_READ_CLOSED_WINDOW_MONTHS".to_string(),
                value: raw.clone(),
                reason: "Expected a whole number of months".to_string(),
            })?,
            None => defaults.closed_window_months,
        };

        Ok(Self {
            fetch_from_ngis: var("FETCH_FROM_NGIS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.fetch_from_ngis),
            fetch_from_snpseq: var("FETCH_FROM_SNPSEQ")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.fetch_from_snpseq),
            fetch_from_ugc: var("FETCH_FROM_UGC")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.fetch_from_ugc),
            data_location: var("DATA_LOCATION").unwrap_or_default(),
            report_output_location: var("REPORT_OUTPUT_LOCATION"),
            statusdb_url: var("STHLM_STATUSDB_URL"),
            statusdb_username: var("STHLM_STATUSDB_USERNAME"),
            statusdb_password: var("STHLM_STATUSDB_PASSWORD"),
            order_portal_url: var("ORDER_PORTAL_URL"),
            order_portal_api_key: var("ORDER_PORTAL_API_KEY"),
            closed_window_months,
            request_timeout_seconds: defaults.request_timeout_seconds,
        })
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DailyReadError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| DailyReadError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${ORDER_PORTAL_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| DailyReadError::config(format!("Invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn data_location(&self) -> PathBuf {
        PathBuf::from(&self.data_location)
    }

    /// StatusDB URLs are often given without a scheme; https is assumed then.
    pub fn statusdb_service_url(&self) -> Result<String> {
        let url = validate_required_field("STHLM_STATUSDB_URL", &self.statusdb_url)?;
        let url = url.trim().trim_end_matches('/');
        if url.contains("://") {
            Ok(url.to_string())
        } else {
            Ok(format!("https://{}", url))
        }
    }

    /// Projects closed before this date are no longer fetched.
    pub fn close_date(&self, today: NaiveDate) -> String {
        today
            .checked_sub_months(Months::new(self.closed_window_months))
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string()
    }
}

impl Validate for DailyReadConfig {
    fn validate(&self) -> Result<()> {
        validate_absolute_path("DATA_LOCATION", &self.data_location)?;

        if let Some(location) = &self.report_output_location {
            validate_absolute_path("REPORT_OUTPUT_LOCATION", location)?;
        }

        if self.fetch_from_ngis {
            validate_url("STHLM_STATUSDB_URL", &self.statusdb_service_url()?)?;
            let username = validate_required_field("STHLM_STATUSDB_USERNAME", &self.statusdb_username)?;
            validate_non_empty_string("STHLM_STATUSDB_USERNAME", username)?;
            validate_required_field("STHLM_STATUSDB_PASSWORD", &self.statusdb_password)?;
        }

        if let Some(url) = &self.order_portal_url {
            validate_url("ORDER_PORTAL_URL", url)?;
        }

        validate_positive_number("DAILY_READ_CLOSED_WINDOW_MONTHS", self.closed_window_months, 1)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_reads_flags_and_credentials() {
        let config = DailyReadConfig::from_lookup(lookup_from(&[
            ("FETCH_FROM_NGIS", "True"),
            ("FETCH_FROM_UGC", "0"),
            ("DATA_LOCATION", "/srv/daily_read/data"),
            ("STHLM_STATUSDB_URL", "statusdb.example.org:5984"),
            ("STHLM_STATUSDB_USERNAME", "reader"),
            ("STHLM_STATUSDB_PASSWORD", "secret"),
            ("ORDER_PORTAL_URL", ""),
        ]))
        .unwrap();

        assert!(config.fetch_from_ngis);
        assert!(!config.fetch_from_ugc);
        assert!(config.order_portal_url.is_none());
        assert_eq!(
            config.statusdb_service_url().unwrap(),
            "https://statusdb.example.org:5984"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_statusdb_credentials_fail_validation() {
        let config = DailyReadConfig::from_lookup(lookup_from(&[
            ("DATA_LOCATION", "/srv/daily_read/data"),
            ("STHLM_STATUSDB_URL", "http://localhost:5984"),
        ]))
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(DailyReadError::MissingConfigError { field }) if field == "STHLM_STATUSDB_USERNAME"
        ));
    }

    #[test]
    fn test_relative_data_location_is_rejected() {
        let config = DailyReadConfig {
            fetch_from_ngis: false,
            data_location: "data".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_close_date_goes_back_window_months() {
        let config = DailyReadConfig::default();
        let today = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        assert_eq!(config.close_date(today), "2024-02-29");
    }

    #[test]
    fn test_from_toml_str_with_defaults() {
        let config = DailyReadConfig::from_toml_str(
            r#"
fetch_from_ngis = false
fetch_from_snpseq = true
data_location = "/srv/daily_read/data"
order_portal_url = "https://portal.example.org"
"#,
        )
        .unwrap();

        assert!(config.fetch_from_snpseq);
        assert_eq!(config.closed_window_months, DEFAULT_CLOSED_WINDOW_MONTHS);
        assert_eq!(config.request_timeout_seconds, DEFAULT_REQUEST_TIMEOUT_SECONDS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str_substitutes_env_vars() {
        std::env::set_var("DAILY_READ_TEST_PORTAL_KEY", "secret-key");
        std::env::remove_var("DAILY_READ_TEST_UNSET_URL");

        let config = DailyReadConfig::from_toml_str(
            r#"
fetch_from_ngis = false
data_location = "/srv/daily_read/data"
order_portal_api_key = "${DAILY_READ_TEST_PORTAL_KEY}"
order_portal_url = "${DAILY_READ_TEST_UNSET_URL}"
"#,
        )
        .unwrap();

        assert_eq!(config.order_portal_api_key.as_deref(), Some("secret-key"));
        assert_eq!(
            config.order_portal_url.as_deref(),
            Some("${DAILY_READ_TEST_UNSET_URL}")
        );
    }

    #[test]
    fn test_invalid_window_is_reported() {
        let result = DailyReadConfig::from_lookup(lookup_from(&[(
            "DAILY_READ_CLOSED_WINDOW_MONTHS",
            "six",
        )]));
        assert!(matches!(
            result,
            Err(DailyReadError::InvalidConfigValueError { .. })
        ));
    }
}
