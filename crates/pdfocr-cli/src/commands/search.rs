//! Search command - find text in the text layer of a PDF.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfocr_core::pdf::info::search;

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Text to look for
    #[arg(required = true)]
    query: String,

    /// Match case exactly
    #[arg(long)]
    case_sensitive: bool,

    /// Print JSON instead of a listing
    #[arg(long)]
    json: bool,
}

pub async fn run(args: SearchArgs) -> anyhow::Result<()> {
    let matches = search(&args.input, &args.query, args.case_sensitive)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("{} No matches for '{}'", style("ℹ").blue(), args.query);
        return Ok(());
    }

    for m in &matches {
        println!(
            "{} {}",
            style(format!("Page {}:", m.page)).cyan(),
            m.context.replace('\n', " ")
        );
    }
    println!();
    println!(
        "{} {} match(es) for '{}'",
        style("✓").green(),
        matches.len(),
        args.query
    );

    Ok(())
}
