use crate::utils::error::{DailyReadError, Result};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const ERROR_REPORT_HEADER: &str = "Errors logged in DailyRead during execution\n";

/// Keeps the message of every ERROR event seen by the subscriber, so a run
/// that logged errors without aborting can still fail at the end.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    messages: Arc<Mutex<Vec<String>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for ErrorCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if let (Some(message), Ok(mut messages)) = (visitor.message, self.messages.lock()) {
            messages.push(message);
        }
    }
}

pub fn init_cli_logger(verbose: bool, json: bool) -> ErrorCollector {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("daily_read=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("daily_read=info"))
    };

    let collector = ErrorCollector::new();

    let compact_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
    });
    // cron 排程下輸出 JSON 方便集中收集
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .json()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(compact_layer)
        .with(json_layer)
        .with(collector.clone())
        .init();

    collector
}

/// Fails when any ERROR event was collected during the run.
pub fn error_reporting(collector: &ErrorCollector) -> Result<()> {
    let messages = collector.messages();
    if messages.is_empty() {
        return Ok(());
    }

    Err(DailyReadError::ErrorsLogged(format!(
        "{}{}",
        ERROR_REPORT_HEADER,
        messages.join("\n")
    )))
}
