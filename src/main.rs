use clap::Parser;
use daily_read::config::cli::{Cli, Command};
use daily_read::utils::error::{DailyReadError, ErrorSeverity};
use daily_read::utils::{git_info, logger, validation::Validate};
use daily_read::{DailyReadConfig, DailyReadEngine, GenerateOptions, LocalStorage, ProjectDataMaster};
use tracing::Instrument;

fn exit_code(e: &DailyReadError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(e: &DailyReadError) {
    tracing::error!(
        "❌ DailyRead failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

fn load_config(cli: &Cli) -> daily_read::Result<DailyReadConfig> {
    let config = match &cli.config {
        Some(path) => DailyReadConfig::from_file(path)?,
        None => DailyReadConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli, config: DailyReadConfig) -> daily_read::Result<()> {
    match cli.command {
        Command::Status => {
            // 只看資料庫狀態，不連線 StatusDB
            let master = ProjectDataMaster::with_sources(&config, Vec::new())?;
            let projects = master.get_modified_or_new_projects()?;
            if projects.is_empty() {
                println!("No modified or new projects");
            }
            for project in &projects {
                println!(
                    "{}\t{}\t{}",
                    project.relative_path,
                    project.project_id,
                    project.orderer.as_deref().unwrap_or("-")
                );
            }
            for orderer in master.find_unique_orderers()? {
                tracing::info!("Orderer with pending reports: {}", orderer);
            }
        }
        Command::Generate {
            upload,
            report_status,
            project,
        } => {
            let master = ProjectDataMaster::from_config(&config).await?;
            let storage = config.report_output_location.clone().map(LocalStorage::new);
            let mut engine = DailyReadEngine::new(config, master, storage)?;

            let options = GenerateOptions {
                upload,
                report_status: report_status.as_str().to_string(),
                project_id: project,
            };
            let summary = engine.generate(&options).await?;

            println!("✅ DailyRead finished");
            println!(
                "📁 {} fetched, {} modified, {} uploaded, {} deleted, {} written, {} failed",
                summary.fetched,
                summary.modified,
                summary.uploaded,
                summary.deleted,
                summary.written,
                summary.failed
            );
            if let Some(commit) = summary.commit {
                println!("📝 Data committed as {}", commit);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    let collector = logger::init_cli_logger(cli.verbose, cli.json_logs);
    let commits = git_info::git_commits();
    let span = tracing::info_span!("daily_read", commit = %commits.git_commit);

    tracing::info!(parent: &span, "Starting daily_read");

    // 驗證配置
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config).instrument(span.clone()).await {
        report_failure(&e);
        std::process::exit(exit_code(&e));
    }

    // 執行中記錄過的錯誤也要讓排程失敗
    if let Err(e) = logger::error_reporting(&collector) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
