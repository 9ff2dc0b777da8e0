//! tagwire Echo Server
//!
//! Serves the demo protocol over TCP, one thread per connection.

use std::net::TcpListener;
use std::thread;

use clap::Parser;
use tagwire::config::DEFAULT_COMPRESSION_LEVEL;
use tagwire::demo;
use tagwire::transform::TransformPipeline;
use tagwire::transport::TcpConnection;
use tracing_subscriber::{fmt, EnvFilter};

/// tagwire demo peer
#[derive(Parser, Debug)]
#[command(name = "tagwire-echo")]
#[command(about = "Demo peer for the tagwire protocol client")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Compress frames (clients must match)
    #[arg(short, long)]
    compress: bool,

    /// Zstd compression level
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
    level: i32,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tagwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("tagwire echo server v{}", tagwire::VERSION);
    tracing::info!("Listen address: {}", args.listen);
    tracing::info!("Compression: {}", if args.compress { "zstd" } else { "off" });

    let listener = match TcpListener::bind(&args.listen) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Accept failed: {}", e);
                continue;
            }
        };

        let compression = args.compress.then_some(args.level);
        thread::spawn(move || {
            let connection = match TcpConnection::new(stream) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Failed to set up connection: {}", e);
                    return;
                }
            };
            let peer = connection.peer_addr().to_string();
            tracing::debug!("Connection established from {}", peer);

            let pipeline = TransformPipeline::new(compression, false);
            match demo::serve(connection, &pipeline) {
                Ok(()) => tracing::debug!("Client {} disconnected", peer),
                Err(e) => tracing::warn!("Connection {} ended with error: {}", peer, e),
            }
        });
    }
}
