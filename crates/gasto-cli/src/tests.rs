//! CLI tests

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::{self, truncate};

// ============ Argument parsing ============

#[test]
fn test_cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["gasto"]).is_err());
}

#[test]
fn test_cli_parses_analyze() {
    let cli = Cli::try_parse_from(["gasto", "analyze", "--file", "statement.txt", "--json"])
        .expect("analyze should parse");
    match cli.command {
        Commands::Analyze { file, json } => {
            assert_eq!(file, PathBuf::from("statement.txt"));
            assert!(json);
        }
        _ => panic!("expected analyze command"),
    }
}

#[test]
fn test_cli_serve_defaults() {
    let cli = Cli::try_parse_from(["gasto", "serve"]).expect("serve should parse");
    match cli.command {
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            assert_eq!(port, 3000);
            assert_eq!(host, "127.0.0.1");
            assert!(static_dir.is_none());
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn test_cli_verbose_is_global() {
    let cli = Cli::try_parse_from(["gasto", "demo", "--verbose"]).expect("demo should parse");
    assert!(cli.verbose);
}

// ============ Helpers ============

#[test]
fn test_truncate_short_string_unchanged() {
    assert_eq!(truncate("Netflix", 24), "Netflix");
}

#[test]
fn test_truncate_long_string() {
    let name = "A very long subscription service name";
    let out = truncate(name, 24);
    assert_eq!(out, "A very long subscript...");
    assert_eq!(out.chars().count(), 24);
}

#[test]
fn test_truncate_accented_name() {
    // Cutting must happen on char boundaries, not bytes
    let out = truncate("Associação Brasileira de Assinaturas", 10);
    assert_eq!(out, "Associa...");
    assert_eq!(out.chars().count(), 10);
}

// ============ Commands ============

#[test]
fn test_cmd_demo_table_and_json() {
    assert!(commands::cmd_demo(false).is_ok());
    assert!(commands::cmd_demo(true).is_ok());
}

#[tokio::test]
async fn test_cmd_analyze_missing_file() {
    let result =
        commands::cmd_analyze(std::path::Path::new("/nonexistent/statement.txt"), false).await;
    let message = result.expect_err("missing file should fail").to_string();
    assert!(message.contains("Failed to read"));
}
