//! Provider chain inspection command

use anyhow::Result;

use gasto_core::ai::{FallbackOrchestrator, ProviderBackend};

/// List the configured providers in fallback order and probe each one
pub async fn cmd_providers() -> Result<()> {
    let orchestrator = FallbackOrchestrator::from_env();

    if orchestrator.providers().is_empty() {
        println!("⚠️  No AI providers configured.");
        println!();
        println!("Set any of these environment variables:");
        println!("  GEMINI_API_KEY      Google Gemini (primary, two models)");
        println!("  GROQ_API_KEY        Groq (Llama 3.3 70B)");
        println!("  OPENROUTER_API_KEY  OpenRouter (free tier)");
        return Ok(());
    }

    println!("🔍 Provider chain ({} configured):", orchestrator.providers().len());
    println!();

    for (index, provider) in orchestrator.providers().iter().enumerate() {
        print!("  {}. {:22} {:40} ", index + 1, provider.name(), provider.model());
        if provider.health_check().await {
            println!("✅ reachable");
        } else {
            println!("❌ unreachable");
        }
    }

    println!();
    println!("Extraction tries each provider in order and stops at the first success.");
    Ok(())
}
