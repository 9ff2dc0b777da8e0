//! tagwire CLI Client
//!
//! Command-line interface for talking to a demo peer.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tagwire::demo::{DemoCommand, DemoResponse};
use tagwire::transport::TcpConnection;
use tagwire::{ClientConfig, ClientEvent, HandlerSet, Payload, ProtocolClient};
use tracing_subscriber::{fmt, EnvFilter};

/// tagwire CLI
#[derive(Parser, Debug)]
#[command(name = "tagwire-cli")]
#[command(about = "CLI for the tagwire demo protocol")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    server: String,

    /// Compress frames (server must match)
    #[arg(short, long)]
    compress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Echo a message
    Echo {
        /// Text to echo
        text: String,
    },

    /// Join words on the server
    Join {
        /// Words to join
        words: Vec<String>,
    },

    /// Subscribe and print the pushed notice
    Subscribe,

    /// Ask the server to report an error
    Fail,

    /// Send a command the server has nothing mapped to
    Legacy,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> tagwire::Result<()> {
    let connection = TcpConnection::connect(&args.server)?;
    let config = ClientConfig::builder().compression(args.compress).build();

    let handlers = HandlerSet::<DemoResponse>::new().on("Notice", |_tag, payload| {
        println!("notice: {}", String::from_utf8_lossy(payload.remaining()));
    });

    let client: ProtocolClient<DemoCommand, DemoResponse> =
        ProtocolClient::start(connection, handlers, config)?;
    let events = client.subscribe();

    let text = |tag: DemoResponse, payload: &mut tagwire::PayloadReader| {
        format!("{:?} {}", tag, String::from_utf8_lossy(payload.remaining()))
    };

    match args.command {
        Commands::Ping => println!("{}", client.send(DemoCommand::Ping, (), text)?),
        Commands::Echo { text: message } => {
            println!("{}", client.send(DemoCommand::Echo, message.into_bytes(), text)?)
        }
        Commands::Join { words } => {
            println!("{}", client.send(DemoCommand::Join, Payload::strings(&words)?, text)?)
        }
        Commands::Subscribe => println!("{}", client.send(DemoCommand::Subscribe, (), text)?),
        Commands::Fail => match client.send(DemoCommand::Fail, (), text) {
            Ok(reply) => println!("{}", reply),
            Err(e) => println!("request failed: {}", e),
        },
        Commands::Legacy => client.send_oneway(DemoCommand::Legacy, ())?,
    }

    // Print notifications that arrive shortly after the reply
    while let Ok(event) = events.recv_timeout(Duration::from_millis(200)) {
        match event {
            ClientEvent::NotMapped { command } => println!("not mapped: {:?}", command),
            ClientEvent::Unknown { .. } => println!("server did not recognise the command"),
            ClientEvent::ServerError { message, .. } => println!("server error: {}", message),
            ClientEvent::ConnectionLost { error } => println!("connection lost: {}", error),
            ClientEvent::Closed => break,
        }
    }

    client.close()
}
