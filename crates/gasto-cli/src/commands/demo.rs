//! Demo report command

use anyhow::Result;

use gasto_core::demo::demo_report;

use super::print_report;

/// Print the built-in sample report, as a table or as JSON
pub fn cmd_demo(json: bool) -> Result<()> {
    let report = demo_report();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("🎬 Relatório de demonstração");
    println!();
    print_report(&report);
    Ok(())
}
