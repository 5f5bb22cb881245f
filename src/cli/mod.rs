pub mod seed;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "central-server")]
#[command(about = "Central server for school financial reporting")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides CENTRAL_API_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Insert the default roles and a first Superintendent account")]
    Seed {
        #[arg(long, default_value = "admin", help = "Username of the first Superintendent")]
        username: String,
        #[arg(long, env = "CENTRAL_SEED_PASSWORD", help = "Password of the first Superintendent")]
        password: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve::handle(port).await,
        Commands::Seed { username, password } => seed::handle(username, password).await,
    }
}
