//! Info command - document metadata.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pdfocr_core::pdf::info::document_info;

/// Arguments for the info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

pub async fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = document_info(&args.input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", style(args.input.display()).bold());
    println!("  Pages:     {}", info.pages);
    println!("  Size:      {} MB ({} bytes)", info.size_mb, info.size_bytes);
    println!("  Encrypted: {}", if info.encrypted { "yes" } else { "no" });
    println!("  Title:     {}", info.title);
    println!("  Author:    {}", info.author);
    println!("  Subject:   {}", info.subject);
    println!("  Creator:   {}", info.creator);

    let rotated: Vec<String> = info
        .rotations
        .iter()
        .enumerate()
        .filter(|(_, rotation)| **rotation != 0)
        .map(|(page, rotation)| format!("{}: {}°", page + 1, rotation))
        .collect();
    if !rotated.is_empty() {
        println!("  Rotated:   {}", rotated.join(", "));
    }

    Ok(())
}
