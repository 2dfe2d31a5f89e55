use clap::{Args, Parser, Subcommand};
use quizduel_cli::application::log_summary;
use quizduel_cli::infrastructure::{demo_quiz, load_quiz};
use quizduel_cli::{run_demo, run_interactive, CliError, DemoOptions, LogConfig, Result};
use quizduel_p2p::{
    GameLoop, IceServer, MatchboxConnectionBuilder, PeerId, SyncConfig, TransportRegistry,
};
use std::path::PathBuf;
use tracing::info;

const DEFAULT_SERVER: &str = "wss://match.quizduel.dev";

#[derive(Parser)]
#[command(name = "quizduel")]
#[command(version, about = "Quizduel - two-player quiz battles over WebRTC")]
struct Cli {
    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TurnArgs {
    /// TURN server URL (optional, format: turn:host:port)
    #[arg(long)]
    turn_server: Option<String>,

    /// TURN username (required if turn-server is set)
    #[arg(long)]
    turn_username: Option<String>,

    /// TURN credential (required if turn-server is set)
    #[arg(long)]
    turn_credential: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a match and wait for an opponent
    Host {
        /// Matchbox signalling server URL
        #[arg(short = 's', long, default_value = DEFAULT_SERVER)]
        server: String,

        /// Quiz document (JSON) to play
        #[arg(short = 'q', long)]
        quiz: PathBuf,

        #[command(flatten)]
        turn: TurnArgs,
    },

    /// Join a match by the host's peer id
    Join {
        /// Matchbox signalling server URL
        #[arg(short = 's', long, default_value = DEFAULT_SERVER)]
        server: String,

        /// Peer id printed by the host
        #[arg(short = 'p', long)]
        peer_id: String,

        #[command(flatten)]
        turn: TurnArgs,
    },

    /// Play a scripted match between two in-process peers
    Demo {
        /// Quiz document (JSON); a built-in quiz is used if omitted
        #[arg(short = 'q', long)]
        quiz: Option<PathBuf>,

        /// Questions in the built-in quiz
        #[arg(short = 'n', long, default_value_t = 3)]
        questions: usize,

        /// Simulate loss by dropping every n-th frame
        #[arg(long)]
        drop_every: Option<usize>,

        /// Use sub-second timers
        #[arg(long)]
        fast: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::default().with_level(cli.log_level);
    if cli.json_logs {
        log_config = log_config.with_json();
    }
    log_config.init().map_err(CliError::Logging)?;

    match cli.command {
        Commands::Host { server, quiz, turn } => {
            let quiz = load_quiz(&quiz)?;
            let config = build_config(&server, turn)?;
            host(config, quiz).await?;
        }
        Commands::Join {
            server,
            peer_id,
            turn,
        } => {
            let config = build_config(&server, turn)?;
            join(config, PeerId::from(peer_id.as_str())).await?;
        }
        Commands::Demo {
            quiz,
            questions,
            drop_every,
            fast,
        } => {
            let quiz = match quiz {
                Some(path) => load_quiz(&path)?,
                None => demo_quiz(questions),
            };
            let mut options = if fast {
                DemoOptions::fast()
            } else {
                DemoOptions::default()
            };
            if let Some(n) = drop_every {
                options = options.with_drop_every(n);
            }
            demo(quiz, options).await?;
        }
    }

    Ok(())
}

fn build_config(server: &str, turn: TurnArgs) -> Result<SyncConfig> {
    let mut ice_servers = IceServer::default_stun_servers();

    if let Some(turn_url) = turn.turn_server {
        match (turn.turn_username, turn.turn_credential) {
            (Some(username), Some(credential)) => {
                info!("Using TURN server: {}", turn_url);
                ice_servers.insert(0, IceServer::turn(turn_url, username, credential));
            }
            _ => {
                return Err(CliError::InvalidConfig(
                    "TURN server requires both username and credential".to_string(),
                ));
            }
        }
    }

    Ok(SyncConfig::new(server).with_ice_servers(ice_servers))
}

async fn host(config: SyncConfig, quiz: quizduel_core::Quiz) -> Result<()> {
    info!(
        "Connecting to signalling server: {}",
        config.signalling_server
    );
    let connection = MatchboxConnectionBuilder::from_config(&config)
        .build_host()
        .await?;

    let server = config.signalling_server.clone();
    let mut game = GameLoop::new(connection, config);
    let peer_id = game.become_host()?;

    info!("");
    info!("Share this command with your opponent:");
    info!("  quizduel join --server {} --peer-id {}", server, peer_id);
    info!("");
    info!("Waiting for an opponent... (Ctrl+C to exit)");

    run_interactive(game, Some(quiz)).await?;
    Ok(())
}

async fn join(config: SyncConfig, target: PeerId) -> Result<()> {
    info!("Joining {} via {}", target, config.signalling_server);
    let connection = MatchboxConnectionBuilder::from_config(&config)
        .build_guest(&target)
        .await?;

    let mut game = GameLoop::new(connection, config);
    game.connect_to_peer(&target)?;

    info!("Waiting for the host to start... type an answer and press Enter");
    run_interactive(game, None).await?;
    Ok(())
}

async fn demo(quiz: quizduel_core::Quiz, options: DemoOptions) -> Result<()> {
    let mut registry = TransportRegistry::new();
    registry.init()?;

    let started = std::time::Instant::now();
    let result = run_demo(&registry, quiz, options).await;
    registry.teardown();
    let report = result?;

    info!("");
    info!(
        "Demo finished in {:.1}s: {} frames dropped, {} deliveries failed, {} stale messages ignored",
        started.elapsed().as_secs_f64(),
        report.dropped_frames,
        report.delivery_failures,
        report.stale_discarded
    );
    if report.host_scores != report.guest_scores {
        tracing::warn!(
            "Peers disagree: host {:?} vs guest {:?}",
            report.host_scores,
            report.guest_scores
        );
    }
    log_summary(&report.summary);
    Ok(())
}
