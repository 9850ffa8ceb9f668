//! CLI application for PDF and image text extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, image, info, search};

/// Extract text from PDFs and images, with OCR when the text layer is missing
#[derive(Parser)]
#[command(name = "pdfocr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text of a PDF
    Extract(extract::ExtractArgs),

    /// Extract the text of an image with OCR
    Image(image::ImageArgs),

    /// Show document information
    Info(info::InfoArgs),

    /// Search the text layer of a PDF
    Search(search::SearchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Extract(args) => extract::run(args, cli.config.as_deref()).await,
        Commands::Image(args) => image::run(args, cli.config.as_deref()).await,
        Commands::Info(args) => info::run(args).await,
        Commands::Search(args) => search::run(args).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}
