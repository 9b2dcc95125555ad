//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Statement analysis through the provider chain
//! - `demo` - Built-in sample report
//! - `providers` - Provider chain inspection
//! - `serve` - Web server

pub mod analyze;
pub mod demo;
pub mod providers;
pub mod serve;

// Re-export all command functions for use in main.rs
pub use analyze::*;
pub use demo::*;
pub use providers::*;
pub use serve::*;

use gasto_core::alternatives;
use gasto_core::models::{AnalysisResult, SubscriptionItem};

/// Render a report as a terminal table with totals and cancellation
/// alternatives.
pub fn print_report(report: &AnalysisResult) {
    if report.items.is_empty() {
        println!("   Nenhuma assinatura recorrente encontrada.");
        println!();
        return;
    }

    println!(
        "   📋 {} assinatura(s) detectada(s)",
        report.subscription_count
    );
    println!();
    println!(
        "   {:24} │ {:14} │ {:>10} │ {:>11}",
        "Serviço", "Categoria", "Mensal", "Anual"
    );
    println!("   ─────────────────────────┼────────────────┼────────────┼────────────");
    for item in &report.items {
        println!(
            "   {:24} │ {:14} │ {:>10} │ {:>11}",
            truncate(&item.name, 24),
            item.category.as_str(),
            format!("R$ {:.2}", item.monthly_cost),
            format!("R$ {:.2}", item.annual_cost),
        );
    }
    println!("   ─────────────────────────┼────────────────┼────────────┼────────────");
    println!(
        "   {:24} │ {:14} │ {:>10} │ {:>11}",
        "Total",
        "",
        format!("R$ {:.2}", report.total_monthly),
        format!("R$ {:.2}", report.total_annual),
    );
    println!();
    println!(
        "   💰 Economia potencial: R$ {:.2}/ano",
        report.potential_savings
    );

    print_alternatives(&report.items);
    println!();
}

/// Print up to two suggestions per detected service. Services the catalog
/// does not know still get the generic tips.
fn print_alternatives(items: &[SubscriptionItem]) {
    println!();
    println!("   💡 Alternativas para economizar:");
    for item in items {
        for alt in alternatives::suggest(&item.name).into_iter().take(2) {
            println!(
                "      {} → {} [{}] {}",
                item.name,
                alt.name,
                alt.kind.label(),
                alt.description
            );
        }
    }
}

/// Truncate a string to a maximum number of characters, appending "..." when
/// it was cut. Char-based so accented service names never split mid-codepoint.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
