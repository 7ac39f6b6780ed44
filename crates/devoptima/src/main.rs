mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use devoptima_agent::{CompletionClient, Generator};
use devoptima_core::{Action, ActionContext, ActionReport, ActionStatus, Workbench};
use devoptima_logging::{init_tracing, LogFormat, Logger};
use devoptima_protocol::TreeNode;
use devoptima_validator::PythonValidator;

use config::{ProjectConfig, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "devoptima",
    about = "Refactor, optimize, debug and analyze Python code with a self-correcting model loop",
    version,
    author
)]
struct Cli {
    /// What to do with the code
    #[arg(value_enum)]
    action: ActionChoice,

    /// Python source file to read
    #[arg(short, long, conflicts_with = "code")]
    file: Option<PathBuf>,

    /// Python source passed inline
    #[arg(short, long)]
    code: Option<String>,

    /// Target language for `transpile`
    #[arg(long, default_value = "Rust")]
    target_language: String,

    /// Error log for `debug` (path to a file or the text itself)
    #[arg(long)]
    error_log: Option<String>,

    /// Improvement to apply with `batch-fix` (repeatable)
    #[arg(long = "fix")]
    fixes: Vec<String>,

    /// Ask `simulate` for an edge-case input
    #[arg(long)]
    chaos: bool,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Generation calls allowed per correction run
    #[arg(short = 'n', long)]
    max_attempts: Option<u32>,

    /// Working directory used to find devoptima.toml
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Append JSON log events to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output the final report as JSON
    #[arg(long)]
    json_output: bool,

    /// Dry run: show what would happen without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ActionChoice {
    Refactor,
    Optimize,
    Transpile,
    Debug,
    Audit,
    BatchFix,
    Simulate,
    Tree,
    Diagram,
    Sequence,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing("warn", log_format);

    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let user_dir = ProjectConfig::user_dir();
    let project_config =
        ProjectConfig::discover(&working_dir, user_dir.as_deref())?.unwrap_or_default();
    let settings = Settings::resolve(cli.model.as_deref(), cli.max_attempts, &project_config)?;

    let source = read_source(&cli)?;
    let action = build_action(&cli)?;

    if cli.dry_run {
        println!("=== Dry Run ===");
        println!("Action: {}", action);
        println!("Model: {}", settings.model);
        println!("Max attempts: {}", settings.max_attempts);
        println!("Endpoint: {}", settings.client.api_url);
        println!("Source: {} lines", source.lines().count());
        println!(
            "Correction loop: {}",
            if action.uses_correction_loop() { "yes" } else { "no" }
        );
        return Ok(());
    }

    let client = CompletionClient::from_env(settings.client.clone())?;
    if !client.is_configured() {
        bail!(
            "{} not found. Set it in the environment or a .env file.",
            CompletionClient::API_KEY_VAR
        );
    }

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);

    let validator = PythonValidator::new();
    let workbench = Workbench::new(&client, &validator, logger);
    let mut context =
        ActionContext::new(source, settings.model).with_max_attempts(settings.max_attempts);

    let report = workbench.execute(&action, &mut context).await;

    if cli.json_output {
        let json = serde_json::to_string_pretty(&report)?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    std::process::exit(report.exit_code());
}

fn read_source(cli: &Cli) -> Result<String> {
    if let Some(ref code) = cli.code {
        return Ok(code.clone());
    }
    match cli.file {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => bail!("No source provided. Use --file or --code"),
    }
}

fn build_action(cli: &Cli) -> Result<Action> {
    let action = match cli.action {
        ActionChoice::Refactor => Action::Refactor,
        ActionChoice::Optimize => Action::Optimize,
        ActionChoice::Transpile => Action::Transpile {
            target_language: cli.target_language.clone(),
        },
        ActionChoice::Debug => Action::Debug {
            error_log: read_error_log(cli.error_log.as_deref())?,
        },
        ActionChoice::Audit => Action::Audit,
        ActionChoice::BatchFix => {
            if cli.fixes.is_empty() {
                bail!("batch-fix needs at least one --fix");
            }
            Action::BatchFix {
                fixes: cli.fixes.clone(),
            }
        }
        ActionChoice::Simulate => Action::Simulate { chaos: cli.chaos },
        ActionChoice::Tree => Action::Tree,
        ActionChoice::Diagram => Action::Diagram,
        ActionChoice::Sequence => Action::Sequence,
    };
    Ok(action)
}

/// An existing path is read; anything else is taken as the log text
fn read_error_log(arg: Option<&str>) -> Result<String> {
    match arg {
        None => Ok(String::new()),
        Some(value) => {
            let path = PathBuf::from(value);
            if path.is_file() {
                std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))
            } else {
                Ok(value.to_string())
            }
        }
    }
}

fn print_report(report: &ActionReport) {
    eprintln!();
    match report.status {
        ActionStatus::Completed => eprintln!("{}", "=== COMPLETED ===".bright_green()),
        ActionStatus::Exhausted => eprintln!("{}", "=== EXHAUSTED ===".bright_yellow()),
        ActionStatus::GenerationFailed => {
            eprintln!("{}", "=== GENERATION FAILED ===".bright_red())
        }
        ActionStatus::InvalidInput => eprintln!("{}", "=== INVALID INPUT ===".bright_red()),
    }
    eprintln!("Action: {}", report.action);
    eprintln!("Model: {}", report.model);
    eprintln!("Attempts: {}", report.attempts);
    eprintln!("Duration: {:.1}s", report.duration_secs);
    if let Some(ref error) = report.error {
        eprintln!("Error: {}", error);
    }
    if report.status == ActionStatus::Exhausted {
        eprintln!("No valid code within the attempt budget; showing the last candidate.");
    }
    if let Some(complexity) = report.complexity {
        eprintln!(
            "Complexity: {:.2} -> {:.2} ({:+.2})",
            complexity.before,
            complexity.after,
            complexity.change()
        );
    }
    eprintln!();

    if let Some(ref diagram) = report.diagram {
        println!("{}", diagram);
        return;
    }

    let result = &report.result;
    if !result.description.is_empty() {
        eprintln!("{}", "Description".bold());
        eprintln!("{}\n", result.description);
    }
    if !result.warning.is_empty() {
        eprintln!("{} {}\n", "Warning:".bright_yellow(), result.warning);
    }
    if let Some(grade) = result.debt_grade {
        eprintln!("Security score: {}/100", result.security_score);
        eprintln!("Debt grade: {}", grade);
    }
    if !result.analysis.is_empty() {
        eprintln!("{}", "Analysis".bold());
        eprintln!("{}\n", result.analysis);
    }
    if !result.verdict.is_empty() {
        eprintln!("{} {}\n", "Verdict:".bold(), result.verdict);
    }
    if let Some(ref simulation) = result.simulation {
        eprintln!("Scenario: {}", simulation.scenario);
        for step in &simulation.steps {
            eprintln!(
                "  {:>3}. {}  | {} [{}]",
                step.step, step.line, step.action, step.variables
            );
        }
        eprintln!("Outcome: {}", simulation.outcome);
        if !simulation.complexity_note.is_empty() {
            eprintln!("Complexity: {}", simulation.complexity_note);
        }
    }
    if let Some(ref tree) = result.tree_data {
        print_tree(tree, 0);
    }
    if result.has_code() {
        println!("{}", result.code);
    }
}

fn print_tree(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.description.as_deref() {
        Some(description) if !description.is_empty() => {
            println!("{}- {}: {}", indent, node.name, description)
        }
        _ => println!("{}- {}", indent, node.name),
    }
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["devoptima"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_builds_parameterized_actions() {
        let action = build_action(&cli(&[
            "transpile",
            "--code",
            "x = 1",
            "--target-language",
            "Go",
        ]))
        .unwrap();
        assert_eq!(
            action,
            Action::Transpile {
                target_language: "Go".into()
            }
        );

        let action = build_action(&cli(&[
            "batch-fix", "--code", "x = 1", "--fix", "add type hints", "--fix", "add docstrings",
        ]))
        .unwrap();
        assert_eq!(
            action,
            Action::BatchFix {
                fixes: vec!["add type hints".into(), "add docstrings".into()]
            }
        );

        let action = build_action(&cli(&["simulate", "--code", "x = 1", "--chaos"])).unwrap();
        assert_eq!(action, Action::Simulate { chaos: true });
    }

    #[test]
    fn test_batch_fix_requires_a_fix() {
        assert!(build_action(&cli(&["batch-fix", "--code", "x = 1"])).is_err());
    }

    #[test]
    fn test_error_log_from_text_or_file() {
        let action = build_action(&cli(&[
            "debug", "--code", "x = 1", "--error-log", "ZeroDivisionError: division by zero",
        ]))
        .unwrap();
        assert_eq!(
            action,
            Action::Debug {
                error_log: "ZeroDivisionError: division by zero".into()
            }
        );

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("trace.log");
        std::fs::write(&path, "KeyError: 'id'").unwrap();
        assert_eq!(
            read_error_log(path.to_str()).unwrap(),
            "KeyError: 'id'"
        );
        assert_eq!(read_error_log(None).unwrap(), "");
    }

    #[test]
    fn test_source_from_code_or_file() {
        assert_eq!(read_source(&cli(&["audit", "--code", "x = 1"])).unwrap(), "x = 1");

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("app.py");
        std::fs::write(&path, "def f():\n    return 1\n").unwrap();
        let source = read_source(&cli(&["audit", "--file", path.to_str().unwrap()])).unwrap();
        assert!(source.starts_with("def f()"));

        assert!(read_source(&cli(&["audit"])).is_err());
    }

    #[test]
    fn test_file_and_code_conflict() {
        let result = Cli::try_parse_from(["devoptima", "audit", "--file", "a.py", "--code", "x"]);
        assert!(result.is_err());
    }
}
