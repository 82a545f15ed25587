//! Tracing integration for the CLI.
//!
//! Every event is rendered as `[YYYY-MM-DD HH:MM:SS] message` and written
//! both to the console and to an append-only log file.

use std::fmt::Write as FmtWrite;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Console stream for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Stdout,
    /// Keeps stdout clean for machine-readable output.
    Stderr,
}

/// A tracing layer that writes timestamped lines to the console and a file.
pub struct DualLogLayer {
    console: Console,
    file: Mutex<File>,
}

impl DualLogLayer {
    /// Open (or create) `path` for appending.
    pub fn open(path: &Path, console: Console) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            console,
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, line: &str) {
        match self.console {
            Console::Stdout => {
                let _ = writeln!(io::stdout().lock(), "{}", line);
            }
            Console::Stderr => {
                let _ = writeln!(io::stderr().lock(), "{}", line);
            }
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

impl<S> Layer<S> for DualLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::new();
        event.record(&mut visitor);
        let at = chrono::Local::now().naive_local();
        self.write_line(&format_line(at, &visitor.message));
    }
}

/// Render one log line.
pub fn format_line(at: chrono::NaiveDateTime, message: &str) -> String {
    format!("[{}] {}", at.format("%Y-%m-%d %H:%M:%S"), message)
}

/// Parse a `--verbosity` value; unknown values fall back to info.
pub fn parse_level(verbosity: &str) -> Level {
    match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbosity`.
pub fn init(verbosity: &str, log_file: &Path, console: Console) -> io::Result<()> {
    let level = LevelFilter::from_level(parse_level(verbosity));
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let layer = DualLogLayer::open(log_file, console)?;
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))
}

/// Visitor for extracting the message from a tracing event.
struct MessageVisitor {
    message: String,
}

impl MessageVisitor {
    fn new() -> Self {
        Self {
            message: String::new(),
        }
    }

    fn push_field(&mut self, name: &str, value: &dyn std::fmt::Display) {
        if !self.message.is_empty() {
            self.message.push(' ');
        }
        let _ = write!(self.message, "{}={}", name, value);
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), &format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), &value);
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push_field(field.name(), &value);
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push_field(field.name(), &value);
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push_field(field.name(), &value);
    }
}
