pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "data-catalog-api")]
#[command(about = "Public records data catalog API server and admin tools")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format instead of text")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to CATALOG_API_PORT or PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Inspect and export column permissions")]
    Permissions {
        #[command(subcommand)]
        cmd: commands::permissions::PermissionsCommands,
    },

    #[command(about = "Mint a bearer token for local development")]
    Token {
        #[arg(long, help = "User id to embed in the token")]
        user_id: i64,
        #[arg(long, help = "User email to embed as the subject")]
        email: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Permissions { cmd } => commands::permissions::handle(cmd, output_format).await,
        Commands::Token { user_id, email } => commands::token::handle(user_id, email, output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["data-catalog-api", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));

        let cli = Cli::try_parse_from([
            "data-catalog-api",
            "--json",
            "permissions",
            "columns",
            "--relation",
            "agencies",
            "--role",
            "admin",
            "--access",
            "write",
        ])
        .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));

        assert!(Cli::try_parse_from(["data-catalog-api", "token", "--email", "a@b.c"]).is_err());
    }
}
