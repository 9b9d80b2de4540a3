//! # Caixa Entry Point
//!
//! Reads one JSON command per line on stdin and writes one JSON reply per
//! line on stdout.
//!
//! ```text
//! $ caixa --config ./caixa.toml
//! {"command":"commit_sale","args":{"lines":[{"barcode":"123","quantity":3}],"paymentMethod":"CASH"}}
//! {"ok":true,"data":{"id":"...","totalCents":750,...}}
//! ```
//!
//! ## Startup Sequence
//! 1. Load configuration (defaults → TOML → environment)
//! 2. Initialize tracing (stderr)
//! 3. Connect to database & run migrations
//! 4. Create state objects (DbState, ConfigState)
//! 5. Serve commands until stdin closes

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use caixa_app::commands::{self, CommandRequest, CommandResponse};
use caixa_app::config::AppConfig;
use caixa_app::error::ApiError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Caixa POS");
                println!();
                println!("Usage: caixa [OPTIONS]");
                println!();
                println!("Reads JSON commands from stdin, one per line.");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: $CAIXA_CONFIG or platform dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = AppConfig::load(config_path)?;
    caixa_app::init_tracing(&config.logging.filter);

    info!("Starting Caixa POS");
    let (db, store) = caixa_app::bootstrap(&config).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<CommandRequest>(&line) {
            Ok(request) => commands::dispatch(&db, &store, request).await,
            Err(e) => {
                warn!(error = %e, "Malformed command");
                Err(ApiError::validation(format!("Malformed command: {}", e)))
            }
        };

        let mut reply = serde_json::to_vec(&CommandResponse::from(result))?;
        reply.push(b'\n');
        stdout.write_all(&reply).await?;
        stdout.flush().await?;
    }

    db.inner().close().await;
    info!("Stdin closed, shutting down");
    Ok(())
}
