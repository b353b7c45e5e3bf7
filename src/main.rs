use std::path::PathBuf;

use clap::Parser;
use log::{info, LevelFilter};

use seabattle::client::{run_client, ClientConfig, SessionEnd};
use seabattle::config::{DEFAULT_BIND, LEADERBOARD_FILE, MAX_CLIENTS, MAX_SESSIONS};
use seabattle::init_logging;
use seabattle::server::{Server, ServerConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Host games for up to `--max-clients` players.
    Server {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
        #[arg(long, default_value_t = MAX_CLIENTS)]
        max_clients: usize,
        #[arg(long, default_value_t = MAX_SESSIONS)]
        max_sessions: usize,
        #[arg(long, default_value = LEADERBOARD_FILE)]
        leaderboard: PathBuf,
        #[arg(long, help = "Fix RNG seed for reproducible automatic placement (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Connect to a server and play.
    Client {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[arg(long)]
        nick: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server {
            bind,
            max_clients,
            max_sessions,
            leaderboard,
            seed,
        } => {
            init_logging(LevelFilter::Info);
            let config = ServerConfig {
                bind,
                max_clients,
                max_sessions,
                leaderboard_path: leaderboard,
                seed,
                ..ServerConfig::default()
            };
            let server = Server::bind(&config).await?;
            server
                .run(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
            info!("server stopped");
        }
        Commands::Client { connect, nick } => {
            init_logging(LevelFilter::Warn);
            let end = run_client(ClientConfig {
                server: connect,
                nickname: nick,
            })
            .await?;
            match end {
                SessionEnd::Disconnected => println!("Disconnected from server."),
                SessionEnd::ServerShutdown => println!("Server closed."),
                _ => println!("Thanks for playing!"),
            }
        }
    }
    Ok(())
}
