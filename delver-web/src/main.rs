//! Delver Web Server
//!
//! Streaming deep-research service: answers questions by iterative query
//! generation, parallel search, reflection, and cited synthesis, with live
//! progress over SSE and WebSocket.

use clap::Parser;
use delver_core::{init_logging, DelverConfig};
use delver_web::server::DelverServerBuilder;
use delver_web::WebConfig;

/// Delver web server - streaming deep-research service
#[derive(Parser)]
#[command(name = "delver-web")]
#[command(about = "A web interface for the Delver research engine")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Run without credentials using deterministic canned output
    #[arg(long)]
    demo: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables before reading configuration
    dotenvy::dotenv().ok();

    let mut delver = DelverConfig::from_env();
    if args.demo {
        delver.demo_mode = true;
    }
    delver.logging.level = args.log_level.clone();

    if let Err(e) = init_logging(&delver.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let mut config = WebConfig::from_env();
    config.host = args.host;
    config.port = args.port;
    config.dev_mode = args.dev;

    println!("Starting Delver web server");
    println!("Server: http://{}:{}", config.host, config.port);
    println!("Demo mode: {}", delver.demo_mode);

    if let Err(e) = delver.validate() {
        println!("Warning: {}", e);
        println!("The server will start, but research requests will fail until this is fixed.");
    }

    let server = match DelverServerBuilder::new()
        .host(config.host.clone())
        .port(config.port)
        .dev_mode(config.dev_mode)
        .delver_config(delver)
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        eprintln!("Server failed: {}", e);
        std::process::exit(1);
    }
}
