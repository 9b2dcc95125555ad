//! Web server command

use std::path::Path;

use anyhow::Result;

use gasto_server::ServerConfig;

/// Start the web server
pub async fn cmd_serve(host: &str, port: u16, static_dir: Option<&Path>) -> Result<()> {
    let config = ServerConfig::from_env();

    println!("🚀 Gasto Recorrente server");
    println!("   Listening:    http://{}:{}", host, port);
    match static_dir {
        Some(dir) => println!("   Static files: {}", dir.display()),
        None => println!("   Static files: disabled (API only)"),
    }
    println!("   Site URL:     {}", config.site_url);
    if config.require_payment_confirmation {
        println!("   🔒 Reports unlock only after a webhook-confirmed payment");
    }
    println!();
    println!("   Press Ctrl+C to stop");
    println!();

    let static_dir = static_dir.map(|p| p.to_str().expect("static dir path must be valid UTF-8"));
    gasto_server::serve_with_config(host, port, static_dir, config).await
}
