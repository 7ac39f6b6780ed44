use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

const BANNER_WIDTH: usize = 69;

/// Structured log events for an action and its correction loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    ActionStarted {
        action: String,
        model: String,
        source_lines: usize,
    },
    CorrectionStarted {
        max_attempts: u32,
    },
    GenerationStarted {
        attempt: u32,
        prompt_preview: String,
    },
    GenerationCompleted {
        attempt: u32,
        is_error: bool,
        duration_secs: f64,
        chars: usize,
    },
    ValidationPassed {
        attempt: u32,
    },
    ValidationFailed {
        attempt: u32,
        message: String,
        line: Option<usize>,
    },
    CorrectionAccepted {
        attempt: u32,
    },
    AttemptsExhausted {
        attempts: u32,
    },
    ActionCompleted {
        action: String,
        status: String,
        duration_secs: f64,
    },
}

impl LogEvent {
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Renders [`LogEvent`]s to stderr and, optionally, to a JSON-lines file
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let _ = writeln!(file, "{}", event.with_timestamp());
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::ActionStarted {
                action,
                model,
                source_lines,
            } => {
                let rule = "─".repeat(BANNER_WIDTH);
                let _ = writeln!(stderr);
                let _ = writeln!(stderr, "{}", format!("╭{}╮", rule).bright_blue());
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "devoptima".bold().bright_white(),
                    Self::truncate_with_padding(action, 50, BANNER_WIDTH - 11).bright_cyan()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Model:".dimmed(),
                    Self::truncate_with_padding(model, 55, BANNER_WIDTH - 8).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Input:".dimmed(),
                    Self::truncate_with_padding(
                        &format!("{} lines", source_lines),
                        55,
                        BANNER_WIDTH - 8
                    )
                    .dimmed()
                );
                let _ = writeln!(stderr, "{}", format!("╰{}╯", rule).bright_blue());
                let _ = writeln!(stderr);
            }
            LogEvent::CorrectionStarted { max_attempts } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} (up to {} attempts)",
                    "▶".bright_magenta(),
                    "SELF-CORRECTION".bright_magenta().bold(),
                    max_attempts
                );
            }
            LogEvent::GenerationStarted { attempt, .. } => {
                let label = format!("─ Attempt {} ", attempt);
                let padding = "─".repeat(BANNER_WIDTH.saturating_sub(label.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    label.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "GENERATE".bright_cyan().bold()
                );
            }
            LogEvent::GenerationCompleted {
                is_error,
                duration_secs,
                chars,
                ..
            } => {
                if *is_error {
                    let _ = writeln!(
                        stderr,
                        "    {} Service error ({:.1}s)",
                        "✗".bright_red(),
                        duration_secs
                    );
                } else {
                    let _ = writeln!(
                        stderr,
                        "    {} {} chars ({:.1}s)",
                        "✓".bright_green(),
                        chars,
                        duration_secs
                    );
                }
            }
            LogEvent::ValidationPassed { .. } => {
                let _ = writeln!(
                    stderr,
                    "    {}",
                    "✓ Validation passed".bright_green()
                );
            }
            LogEvent::ValidationFailed { message, line, .. } => {
                let location = line.map(|l| format!(" (line {})", l)).unwrap_or_default();
                let _ = writeln!(
                    stderr,
                    "    {}",
                    format!("→ Validation failed{}: {}", location, message).bright_yellow()
                );
            }
            LogEvent::CorrectionAccepted { attempt } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("└{}┘", "─".repeat(BANNER_WIDTH)).bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{} Accepted on attempt {}",
                    "✓".bright_green(),
                    attempt
                );
            }
            LogEvent::AttemptsExhausted { attempts } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Correction budget exhausted ({} attempts)",
                    "⚠".bright_yellow(),
                    attempts
                );
            }
            LogEvent::ActionCompleted { .. } => {
                // Final report is printed by the binary
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::ActionStarted { action, model, .. } => {
                format!("[{}] action:start {} model={}", timestamp, action, model)
            }
            LogEvent::CorrectionStarted { max_attempts } => {
                format!("[{}] correction:start max={}", timestamp, max_attempts)
            }
            LogEvent::GenerationStarted { attempt, .. } => {
                format!("[{}] generate:start:{}", timestamp, attempt)
            }
            LogEvent::GenerationCompleted {
                attempt,
                is_error,
                duration_secs,
                ..
            } => format!(
                "[{}] generate:done:{} error={} {:.1}s",
                timestamp, attempt, is_error, duration_secs
            ),
            LogEvent::ValidationPassed { attempt } => {
                format!("[{}] validate:ok:{}", timestamp, attempt)
            }
            LogEvent::ValidationFailed {
                attempt, message, ..
            } => format!("[{}] validate:fail:{} {}", timestamp, attempt, message),
            LogEvent::CorrectionAccepted { attempt } => {
                format!("[{}] correction:accepted:{}", timestamp, attempt)
            }
            LogEvent::AttemptsExhausted { attempts } => {
                format!("[{}] correction:exhausted:{}", timestamp, attempts)
            }
            LogEvent::ActionCompleted {
                action,
                status,
                duration_secs,
            } => format!(
                "[{}] action:done {} {} {:.1}s",
                timestamp, action, status, duration_secs
            ),
        };
        let _ = writeln!(std::io::stderr(), "{}", msg);
    }

    /// Truncate a string and pad to exact width, closing with a border
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let truncated = if s.chars().count() > max_len {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1);
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}
