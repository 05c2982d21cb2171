pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "penpals")]
#[command(about = "North Pole Pen Pals - letters between kids and elves")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Check a running server via GET /api/health")]
    Health {
        #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,

        #[arg(long, help = "Print the raw JSON response")]
        json: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Health { url, json } => commands::health::handle(&url, json).await,
    }
}
