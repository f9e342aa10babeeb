use clap::Parser;
use csvimport::config::{CliArgs, ImportConfig, RunSettings, SettingsInput, DEFAULT_CONFIG_PATH};
use csvimport::core::context::RunContext;
use csvimport::utils::logger;
use csvimport::{GoogleSheetsStore, ImportEngine, ImportError, ImportPipeline};
use std::path::Path;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = CliArgs::parse();

    let guard = match logger::init_cli_logger(args.debug, Some(Path::new(&args.log_file))) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    let code = match run(&args).await {
        Ok(summary) => {
            println!("{}", summary);
            0
        }
        Err(e) => {
            eprintln!("{}", e.user_friendly_message());
            eprintln!("{}", e.recovery_suggestion());
            e.exit_code()
        }
    };

    // process::exit skips destructors; flush the log file first.
    drop(guard);
    std::process::exit(code);
}

async fn run(args: &CliArgs) -> Result<String, ImportError> {
    let input = SettingsInput::from(args);

    let (config_path, explicit) = match &args.config {
        Some(path) => (path.as_str(), true),
        None => (DEFAULT_CONFIG_PATH, false),
    };
    // No remote coordinates are known yet, so there is nothing to mask.
    let settings = ImportConfig::load(config_path, explicit)
        .and_then(|config| {
            RunSettings::resolve(&input, &config, |name| std::env::var(name).ok())
        })
        .inspect_err(|e| RunContext::default().log_failure(e))?;

    let ctx = RunContext::for_settings(&settings);
    tracing::info!(
        "Starting csvimport for input files: {:?}, output: {:?}",
        settings.input_files,
        settings.output
    );
    if args.debug {
        tracing::debug!("CLI args: {}", ctx.redact(&format!("{:?}", args)));
    }
    if settings.dry_run {
        tracing::info!("🔍 DRY RUN MODE - output file and sheet are left untouched");
    }

    let pipeline = ImportPipeline::with_context(settings, GoogleSheetsStore::new(), ctx.clone());
    ImportEngine::new(pipeline)
        .run()
        .await
        .inspect_err(|e| ctx.log_failure(e))
}
