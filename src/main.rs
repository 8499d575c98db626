// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use scenewright::app_config::{self, Config, ExtractionProvider};
use scenewright::app_controller::{Controller, ParseOptions};
use scenewright::database::models::{JobRecord, JobStatus};
use scenewright::errors::AppError;
use scenewright::file_utils::FileManager;

/// CLI wrapper for ExtractionProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliExtractionProvider {
    Ollama,
    Anthropic,
}

impl From<CliExtractionProvider> for ExtractionProvider {
    fn from(cli_provider: CliExtractionProvider) -> Self {
        match cli_provider {
            CliExtractionProvider::Ollama => ExtractionProvider::Ollama,
            CliExtractionProvider::Anthropic => ExtractionProvider::Anthropic,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a screenplay into scenes and extract structured scene data
    Parse(ParseArgs),

    /// Print a stored job record as JSON
    Job {
        /// Job id printed by `parse`
        #[arg(value_name = "JOB_ID")]
        id: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for scenewright
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "scenewright.json")]
    config: String,

    /// SQLite database file (overrides the config)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(clap::Args, Debug)]
struct ParseArgs {
    /// UTF-8 screenplay text file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Document id to import under (defaults to a hash of the text)
    #[arg(long)]
    document_id: Option<String>,

    /// Extraction provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliExtractionProvider>,

    /// Model name to use for extraction
    #[arg(short, long)]
    model: Option<String>,

    /// Validate without importing
    #[arg(long)]
    dry_run: bool,

    /// Write the run results JSON to this file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

/// Scenewright - screenplay scene extraction
///
/// Splits a screenplay into scenes at its sluglines, extracts structured
/// scene data with an LLM and imports it into SQLite.
#[derive(Parser, Debug)]
#[command(name = "scenewright")]
#[command(version)]
#[command(about = "Screenplay scene segmentation and structured extraction")]
#[command(long_about = "Scenewright splits a screenplay into scenes and extracts structured scene data using an LLM.

EXAMPLES:
    scenewright parse pilot.txt                       # Extract and import with the default config
    scenewright parse pilot.txt --dry-run -o out/     # Validate only, write results to out/pilot.scenes.json
    scenewright parse -p anthropic pilot.txt          # Use a specific provider
    scenewright job 3f2c...                           # Show a stored job
    scenewright completions bash > scenewright.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in scenewright.json by default. If the file does not
    exist, a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger; the effective level is set later via set_max_level
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Prefix and ANSI colour for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (prefix, colour) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", colour, now, prefix, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let outcome = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "scenewright", &mut std::io::stdout());
            Ok(true)
        }
        Commands::Parse(args) => run_parse(args).await,
        Commands::Job { id, common } => run_job(&id, &common).await,
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the config (writing defaults when missing) and apply shared CLI overrides
fn load_config(common: &CommonArgs) -> Result<Config, AppError> {
    // Apply the CLI log level before anything is logged
    if let Some(ref level) = common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = Path::new(&common.config);
    let mut config = if config_path.exists() {
        Config::from_file(config_path).map_err(|e| AppError::Config(format!("{:#}", e)))?
    } else {
        warn!("Config file not found at '{}', creating default config.", common.config);
        let config = Config::default();
        config
            .save(config_path)
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        config
    };

    if let Some(ref database) = common.database {
        config.database.path = Some(database.clone());
    }

    match common.log_level {
        Some(ref level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

async fn run_parse(args: ParseArgs) -> Result<bool, AppError> {
    let mut config = load_config(&args.common)?;

    if let Some(provider) = args.provider {
        config.extraction.provider = provider.into();
    }
    if let Some(model) = args.model {
        config.extraction.active_provider_config_mut().model = model;
    }

    let controller = Controller::with_config(config).map_err(|e| AppError::Config(format!("{:#}", e)))?;
    let options = ParseOptions {
        document_id: args.document_id,
        dry_run: args.dry_run,
        show_progress: true,
    };

    let job = controller.parse_file(&args.input, &options).await?;
    report_job(&job)?;

    let json = serde_json::to_string_pretty(&job.results)
        .map_err(|e| AppError::Unknown(format!("Failed to serialize run results: {}", e)))?;
    match Controller::output_path(&args.input, args.output.as_deref()) {
        Some(path) => {
            FileManager::write_to_file(&path, &json).map_err(|e| AppError::File(format!("{:#}", e)))?;
            info!("Results written to {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(job.status == JobStatus::Completed)
}

async fn run_job(id: &str, common: &CommonArgs) -> Result<bool, AppError> {
    let controller =
        Controller::with_config(load_config(common)?).map_err(|e| AppError::Config(format!("{:#}", e)))?;
    let job = controller
        .find_job(id)
        .await?
        .ok_or_else(|| AppError::Unknown(format!("No job with id {}", id)))?;

    let json = serde_json::to_string_pretty(&job)
        .map_err(|e| AppError::Unknown(format!("Failed to serialize job: {}", e)))?;
    println!("{}", json);
    Ok(job.status != JobStatus::Failed)
}

fn report_job(job: &JobRecord) -> Result<(), AppError> {
    match job.status {
        JobStatus::Completed => info!("Job {} completed", job.id),
        JobStatus::Failed => error!(
            "Job {} failed: {}",
            job.id,
            job.error.as_deref().unwrap_or("unknown error")
        ),
        ref status => {
            return Err(AppError::Unknown(format!("Job {} was left in state {}", job.id, status)));
        }
    }
    Ok(())
}
