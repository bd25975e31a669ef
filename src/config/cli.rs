use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "daily_read")]
#[command(about = "Keeps Project Progress reports in the order portal in sync with NGI project data")]
pub struct Cli {
    /// Path to a TOML configuration file; environment variables are used otherwise
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch project data, then render and report every modified project
    Generate {
        /// Upload reports to the order portal instead of writing them to disk
        #[arg(long)]
        upload: bool,

        /// Status the uploaded report gets in the order portal
        #[arg(long, value_enum, default_value_t = ReportStatus::Published)]
        report_status: ReportStatus,

        /// Only fetch this project (portal id)
        #[arg(long)]
        project: Option<String>,
    },
    /// List projects that are modified or new since the last commit
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportStatus {
    Published,
    Review,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Published => "published",
            ReportStatus::Review => "review",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_with_upload() {
        let cli = Cli::parse_from(["daily_read", "generate", "--upload", "--report-status", "review", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Generate {
                upload,
                report_status,
                project,
            } => {
                assert!(upload);
                assert_eq!(report_status, ReportStatus::Review);
                assert!(project.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::parse_from(["daily_read", "--config", "/etc/daily_read.toml", "status"]);
        assert_eq!(cli.config.as_deref(), Some("/etc/daily_read.toml"));
        assert!(matches!(cli.command, Command::Status));
    }
}
