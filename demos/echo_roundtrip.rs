//! Echo round trip against a public echo server.
//!
//! Demonstrates:
//! - Connecting with callbacks
//! - Sending a message from the connect callback
//! - Closing after the first reply
//!
//! Usage:
//!   cargo run --example echo_roundtrip
//!   cargo run --example echo_roundtrip -- ws://localhost:9001/
//!   cargo run --example echo_roundtrip -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;
use ws_lifecycle_client::{Client, ClientConfig, Handlers, Result};

// ============================================================================
// Constants
// ============================================================================

const HOST: &str = "ws.ifelse.io";
const ENDPOINT: &str = "/";
const PORT: &str = "80";
const MESSAGE: &str = "Hello World";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    url: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url: args.iter().find(|a| !a.starts_with("--")).cloned(),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "ws_lifecycle_client=debug"
    } else {
        "ws_lifecycle_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = match args.url.as_deref() {
        Some(url) => ClientConfig::from_url(url)?,
        None => ClientConfig::builder()
            .host(HOST)
            .endpoint(ENDPOINT)
            .port_str(PORT)
            .build()?,
    };

    println!("[1] Connecting to {}", config.request_uri());

    let client = Client::new(config, &Handle::current());
    let sender = client.downgrade();
    let closer = client.downgrade();
    let (done_tx, done_rx) = oneshot::channel();

    client.connect(
        Handlers::new()
            .on_connect(move |result| match result {
                Ok(()) => {
                    println!("    ✓ Connected");
                    let Some(client) = sender.upgrade() else {
                        return;
                    };
                    client.send(MESSAGE, |result| match result {
                        Ok(()) => println!("[2] Sent: {MESSAGE}"),
                        Err(e) => println!("[2] Send failed: {e}"),
                    });
                }
                Err(e) => println!("    ✗ Connection failed: {e}"),
            })
            .on_message(move |text| {
                println!("[3] Received: {text}");
                if let Some(client) = closer.upgrade() {
                    client.close(|result| match result {
                        Ok(()) => println!("[4] Closing"),
                        Err(e) => println!("[4] Close failed: {e}"),
                    });
                }
            })
            .on_disconnect(move |result| {
                match &result {
                    Ok(()) => println!("    ✓ Disconnected cleanly"),
                    Err(e) => println!("    ✗ Disconnected: {e}"),
                }
                let _ = done_tx.send(());
            }),
    );

    // A failed connect never reports a disconnect.
    let mut states = client.state_receiver();
    tokio::select! {
        _ = done_rx => {}
        _ = states.wait_for(|s| s.is_terminal()) => {
            // Give the disconnect callback a moment if the session just ended.
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    println!("\nFinal state: {}", client.state());
    Ok(())
}
