use clap::Parser;
use csvimport::core::ledger::transform_statement;
use csvimport::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csvtransform")]
#[command(about = "Split a bank statement's Amount column into Debit and Credit columns")]
#[command(after_help = "Example: csvtransform -i bank_data.csv -o transformed_data.csv")]
struct Args {
    /// Path to the input CSV file to be transformed
    #[arg(short, long)]
    input: PathBuf,

    /// Path where the transformed CSV file will be saved
    #[arg(short, long)]
    output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    logger::init_tool_logger(args.verbose);

    match transform_statement(&args.input, &args.output) {
        Ok(count) => {
            tracing::info!("Transformed {} rows", count);
            println!(
                "Transformed data has been written to {}",
                args.output.display()
            );
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
