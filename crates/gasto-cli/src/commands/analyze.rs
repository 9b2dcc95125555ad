//! Statement analysis command

use std::path::Path;

use anyhow::{bail, Context, Result};

use gasto_core::ai::FallbackOrchestrator;
use gasto_core::analysis::{aggregate, normalize_items};

use super::print_report;

/// Analyze a statement file and print the detected subscriptions
pub async fn cmd_analyze(file: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if text.trim().is_empty() {
        bail!("{} is empty", file.display());
    }

    let orchestrator = FallbackOrchestrator::from_env();
    if orchestrator.providers().is_empty() {
        bail!("No AI providers configured. Set GEMINI_API_KEY, GROQ_API_KEY or OPENROUTER_API_KEY.");
    }

    if !json {
        println!("🔍 Analyzing {}...", file.display());
    }

    let extraction = orchestrator.extract(&text).await?;
    let report = aggregate(normalize_items(&extraction.subs));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("✨ Extracted by {}", extraction.provider);
    println!();
    print_report(&report);
    Ok(())
}
