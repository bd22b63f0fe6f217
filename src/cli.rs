use clap::{Parser, Subcommand};

/// Tokengate — JWT authentication gate with transparent refresh rotation
#[derive(Parser)]
#[command(name = "tokengate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gate server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Token utilities for operators
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Mint a signed token (smoke tests, local development)
    Mint {
        /// Token category: access or refresh
        #[arg(long, default_value = "access")]
        category: String,
        #[arg(long)]
        subject: String,
        /// Role name: admin, editor or viewer
        #[arg(long, default_value = "viewer")]
        role: String,
        /// Lifetime in milliseconds
        #[arg(long, default_value = "600000")]
        ttl_ms: i64,
    },
    /// Decode a token and print its claims
    Inspect { token: String },
}
