//! respkv CLI Client
//!
//! Command-line interface for interacting with respkv.

use clap::{Parser, Subcommand};
use respkv::protocol::Frame;
use respkv::Client;

/// respkv CLI
#[derive(Parser, Debug)]
#[command(name = "respkv-cli")]
#[command(about = "CLI for the respkv key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Echo a message back
    Echo {
        /// The message to echo
        message: String,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Send an arbitrary command
    Raw {
        /// Command name followed by its arguments
        #[arg(required = true)]
        args: Vec<String>,
    },
}

impl Commands {
    fn into_parts(self) -> Vec<String> {
        match self {
            Commands::Ping => vec!["PING".to_string()],
            Commands::Echo { message } => vec!["ECHO".to_string(), message],
            Commands::Get { key } => vec!["GET".to_string(), key],
            Commands::Set { key, value } => vec!["SET".to_string(), key, value],
            Commands::Raw { args } => args,
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Could not connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    match client.command(&args.command.into_parts()[..]) {
        Ok(reply) => {
            let is_error = matches!(reply, Frame::Error(_));
            print!("{}", render(&reply, 0));
            if is_error {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Format a reply the way redis-cli does
fn render(frame: &Frame, indent: usize) -> String {
    match frame {
        Frame::Simple(text) => format!("{}\n", text),
        Frame::Error(message) => format!("(error) {}\n", message),
        Frame::Integer(n) => format!("(integer) {}\n", n),
        Frame::Bulk(data) => format!("{:?}\n", String::from_utf8_lossy(data)),
        Frame::Null => "(nil)\n".to_string(),
        Frame::Array(items) if items.is_empty() => "(empty array)\n".to_string(),
        Frame::Array(items) => {
            let width = items.len().to_string().len();
            let mut out = String::new();
            for (i, item) in items.iter().enumerate() {
                let prefix = format!("{:>width$}) ", i + 1, width = width);
                if i > 0 {
                    out.push_str(&" ".repeat(indent));
                }
                out.push_str(&prefix);
                out.push_str(&render(item, indent + prefix.len()));
            }
            out
        }
    }
}
