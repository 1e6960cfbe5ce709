//! RedeSegura CLI - Command-line interface for the PsychAI engine
//!
//! Commands:
//! - assess: Score a single text
//! - run: Score an NDJSON capture stream from stdin (streaming mode)
//! - lexicon: Show the trigger database
//! - config: Print the effective configuration
//! - doctor: Diagnose configuration and persisted state

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use redesegura::lexicon::LexiconCategory;
use redesegura::protection::{
    AssessmentSink, CapturedContent, ProtectionPipeline, ProtectionPlanner, ProtectionSink,
};
use redesegura::storage::{FileStore, KeyValueStore, JOURNAL_KEY, STATS_KEY};
use redesegura::{
    Assessment, EngineConfig, EngineError, PsychEngine, ENGINE_VERSION, PRODUCER_NAME,
};

/// RedeSegura - On-device psychological risk scoring for social media content
#[derive(Parser)]
#[command(name = "redesegura")]
#[command(author = "RedeSegura")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score social media content for psychological risk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single text
    Assess {
        /// Text to score (use - or omit for stdin)
        text: Option<String>,

        /// App the content came from
        #[arg(long, default_value = "unknown")]
        app: String,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the assessment
        #[arg(long)]
        pretty: bool,
    },

    /// Score an NDJSON capture stream from stdin (streaming mode)
    Run {
        /// App used for captures that do not name one
        #[arg(long, default_value = "unknown")]
        app: String,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding persisted stats and journal
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Disable auto-scroll in planned protection actions
        #[arg(long)]
        no_auto_scroll: bool,

        /// Flush output after each record (--flush false to batch)
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        flush: bool,
    },

    /// Show the trigger database
    Lexicon {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// List the phrases of one category
        #[arg(long)]
        category: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the configuration
        #[arg(long)]
        pretty: bool,
    },

    /// Diagnose configuration and persisted state
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// State directory to check
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), RedeSeguraCliError> {
    match cli.command {
        Commands::Assess {
            text,
            app,
            config,
            pretty,
        } => cmd_assess(text, &app, config.as_deref(), pretty),

        Commands::Run {
            app,
            config,
            state_dir,
            no_auto_scroll,
            flush,
        } => cmd_run(
            &app,
            config.as_deref(),
            state_dir.as_deref(),
            !no_auto_scroll,
            flush,
        ),

        Commands::Lexicon {
            config,
            category,
            json,
        } => cmd_lexicon(config.as_deref(), category.as_deref(), json),

        Commands::Config { config, pretty } => cmd_config(config.as_deref(), pretty),

        Commands::Doctor {
            config,
            state_dir,
            json,
        } => cmd_doctor(config.as_deref(), state_dir.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, RedeSeguraCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(EngineConfig::from_json(&json)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_assess(
    text: Option<String>,
    app: &str,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), RedeSeguraCliError> {
    let text = match text {
        Some(text) if text != "-" => text,
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let engine = PsychEngine::with_config(load_config(config)?);
    let assessment = engine.assess(&text, app)?;

    if pretty {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        println!("{}", serde_json::to_string(&assessment)?);
    }
    Ok(())
}

/// NDJSON lines from stdin as captures; stops at the first malformed line
struct StdinCaptures<R> {
    lines: io::Lines<R>,
    default_app: String,
    line_number: usize,
    error: Option<RedeSeguraCliError>,
}

impl<R: BufRead> Iterator for StdinCaptures<R> {
    type Item = CapturedContent;

    fn next(&mut self) -> Option<CapturedContent> {
        if self.error.is_some() {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.error = Some(e.into());
                    return None;
                }
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return match serde_json::from_str::<CapturedContent>(trimmed) {
                Ok(mut content) => {
                    if content.app.is_empty() {
                        content.app = self.default_app.clone();
                    }
                    Some(content)
                }
                Err(e) => {
                    self.error = Some(RedeSeguraCliError::ParseError(format!(
                        "Failed to parse capture on line {}: {}",
                        self.line_number, e
                    )));
                    None
                }
            };
        }
    }
}

/// Writes every assessment as one NDJSON line and forwards it to the protection sink.
/// Planned actions are drained per record since there is no overlay host here.
struct NdjsonSink<W: Write> {
    out: W,
    flush: bool,
    protection: ProtectionSink,
}

impl<W: Write> AssessmentSink for NdjsonSink<W> {
    fn accept(
        &mut self,
        content: &CapturedContent,
        assessment: &Assessment,
    ) -> Result<(), EngineError> {
        let line = serde_json::to_string(assessment)?;
        writeln!(self.out, "{}", line)
            .and_then(|_| if self.flush { self.out.flush() } else { Ok(()) })
            .map_err(|e| EngineError::PersistenceFailure(format!("stdout: {e}")))?;
        self.protection.accept(content, assessment)?;
        for action in self.protection.drain_actions() {
            debug!(
                app = %action.overlay.app_name,
                trigger = %action.overlay.trigger_reason,
                auto_scroll_ms = action.auto_scroll_after_ms,
                "overlay skipped in streaming mode"
            );
        }
        Ok(())
    }
}

fn cmd_run(
    app: &str,
    config: Option<&Path>,
    state_dir: Option<&Path>,
    auto_scroll: bool,
    flush: bool,
) -> Result<(), RedeSeguraCliError> {
    let engine = PsychEngine::with_config(load_config(config)?);
    let store = state_dir.map(FileStore::new);
    let runtime = match &store {
        Some(_) => Some(tokio::runtime::Runtime::new()?),
        None => None,
    };

    // Load persisted state if provided
    if let (Some(store), Some(runtime)) = (&store, &runtime) {
        runtime.block_on(engine.restore(store));
    }

    let stdin = io::stdin();
    let mut source = StdinCaptures {
        lines: stdin.lock().lines(),
        default_app: app.to_string(),
        line_number: 0,
        error: None,
    };
    let mut sink = NdjsonSink {
        out: io::stdout(),
        flush,
        protection: ProtectionSink::new(ProtectionPlanner {
            auto_scroll,
            ..ProtectionPlanner::default()
        }),
    };

    let summary = ProtectionPipeline::new(&engine).run(&mut source, &mut sink);
    sink.out.flush()?;
    info!(
        processed = summary.processed,
        blocked = summary.blocked,
        failed = summary.failed,
        mental_health = sink.protection.stats().mental_health_score,
        "capture stream finished"
    );

    // Persist state even when the stream ended early; failures are not fatal
    if let (Some(store), Some(runtime)) = (&store, &runtime) {
        if !runtime.block_on(engine.synchronize(store)) {
            warn!(
                state_dir = %store.root().display(),
                "engine state not persisted"
            );
        }
    }

    match source.error {
        Some(e) => Err(e),
        None if summary.sink_errors > 0 => {
            Err(RedeSeguraCliError::OutputFailed(summary.sink_errors))
        }
        None => Ok(()),
    }
}

fn cmd_lexicon(
    config: Option<&Path>,
    category: Option<&str>,
    json: bool,
) -> Result<(), RedeSeguraCliError> {
    let engine = PsychEngine::with_config(load_config(config)?);

    if let Some(key) = category {
        let category = LexiconCategory::from_key(key)
            .ok_or_else(|| EngineError::UnknownCategory(key.to_string()))?;
        let config = engine.configuration();
        let phrases = config.lexicon.phrases(category);
        if json {
            println!("{}", serde_json::to_string_pretty(phrases)?);
        } else {
            for phrase in phrases {
                println!("{}", phrase);
            }
        }
        return Ok(());
    }

    let info = engine.database_info();
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("PsychAI Trigger Database v{}", info.version);
        println!("==============================");
        println!("Total triggers: {}", info.total_triggers);
        println!("Categories:     {}", info.categories);
        println!();
        for (name, count) in &info.category_counts {
            println!("  {:<22} {}", name, count);
        }
    }
    Ok(())
}

fn cmd_config(config: Option<&Path>, pretty: bool) -> Result<(), RedeSeguraCliError> {
    let config = load_config(config)?;
    if pretty {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", config.to_json()?);
    }
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    state_dir: Option<&Path>,
    json: bool,
) -> Result<(), RedeSeguraCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("RedeSegura version {}", ENGINE_VERSION),
    });

    // Check configuration file if provided
    match load_config(config) {
        Ok(loaded) => {
            let source = config
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());
            checks.push(DoctorCheck {
                name: "configuration".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Configuration {} valid ({} triggers)",
                    source,
                    loaded.lexicon.total_entries()
                ),
            });
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "configuration".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot load configuration: {}", CliError::from(e).message),
            });
        }
    }

    // Check persisted state if provided
    if let Some(dir) = state_dir {
        if dir.is_dir() {
            let store = FileStore::new(dir);
            let runtime = tokio::runtime::Runtime::new()?;
            for key in [STATS_KEY, JOURNAL_KEY] {
                checks.push(runtime.block_on(check_blob(&store, key)));
            }
        } else {
            checks.push(DoctorCheck {
                name: "state_dir".to_string(),
                status: CheckStatus::Warning,
                message: "State directory does not exist yet".to_string(),
            });
        }
    }

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("RedeSegura Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RedeSeguraCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

async fn check_blob(store: &FileStore, key: &str) -> DoctorCheck {
    let name = key.trim_start_matches("@RedeSegura:").to_string();
    match store.get(key).await {
        Ok(None) => DoctorCheck {
            name,
            status: CheckStatus::Warning,
            message: "Not persisted yet".to_string(),
        },
        Ok(Some(raw)) => match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(_) => DoctorCheck {
                name,
                status: CheckStatus::Ok,
                message: format!("Valid ({} bytes)", raw.len()),
            },
            Err(e) => DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: format!("Invalid JSON: {}", e),
            },
        },
        Err(e) => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

// Error types

#[derive(Debug)]
enum RedeSeguraCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    ParseError(String),
    OutputFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for RedeSeguraCliError {
    fn from(e: io::Error) -> Self {
        RedeSeguraCliError::Io(e)
    }
}

impl From<EngineError> for RedeSeguraCliError {
    fn from(e: EngineError) -> Self {
        RedeSeguraCliError::Engine(e)
    }
}

impl From<serde_json::Error> for RedeSeguraCliError {
    fn from(e: serde_json::Error) -> Self {
        RedeSeguraCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RedeSeguraCliError> for CliError {
    fn from(e: RedeSeguraCliError) -> Self {
        match e {
            RedeSeguraCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RedeSeguraCliError::Engine(EngineError::UnknownCategory(key)) => CliError {
                code: "UNKNOWN_CATEGORY".to_string(),
                message: format!("Unknown lexicon category: {}", key),
                hint: Some("Run 'redesegura lexicon' to list categories".to_string()),
            },
            RedeSeguraCliError::Engine(EngineError::InvalidConfiguration(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Sensitivity levels must be between 0 and 100".to_string()),
            },
            RedeSeguraCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the configuration with 'redesegura doctor'".to_string()),
            },
            RedeSeguraCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RedeSeguraCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be an object with a \"text\" field".to_string()),
            },
            RedeSeguraCliError::OutputFailed(count) => CliError {
                code: "OUTPUT_FAILED".to_string(),
                message: format!("{} assessments could not be written", count),
                hint: None,
            },
            RedeSeguraCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
