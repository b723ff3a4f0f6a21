mod broadcaster;
mod http;
mod listener;
mod seed;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chain_core::{Block, Blockchain, Wallet};
use clap::Parser;
use tracing::{info, warn};

use broadcaster::InProcessBroadcaster;
use state::AppState;

/// A forgechain node: mines blocks, serves the HTTP facade, and optionally
/// bootstraps from or polls a root peer.
///
/// Mirrors the environment-variable-driven behavior of the node this is
/// ported from (`PEER`, `SEED_DATA`, `POLL_ROOT`, `POLL_INTERVAL`,
/// `ROOT_HOST`) as CLI flags instead, since the workspace already carries
/// `clap` for its command-line surface.
#[derive(Parser)]
#[command(name = "forgechain-node")]
struct Cli {
    /// Run as a peer: pick a random high port and do a one-shot sync
    /// against the root node's chain before serving.
    #[arg(long)]
    peer: bool,

    /// Populate the chain and pool with demo data at startup, useful for
    /// exercising the HTTP facade manually.
    #[arg(long)]
    seed_data: bool,

    /// Periodically poll the root node's chain and offer it to
    /// `replace_chain`.
    #[arg(long)]
    poll_root: bool,

    /// Seconds between polls when `--poll-root` is set.
    #[arg(long, default_value_t = 15)]
    poll_interval: u64,

    /// Hostname of the root node, used by `--peer` and `--poll-root`.
    #[arg(long, default_value = "localhost")]
    root_host: String,

    /// Port the root node's HTTP facade listens on.
    #[arg(long, default_value_t = 5050)]
    root_port: u16,

    /// Port this node's own HTTP facade listens on. Ignored (a random high
    /// port is chosen instead) when `--peer` is set, matching the
    /// original's behavior.
    #[arg(long, default_value_t = 5050)]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let wallet = Wallet::new();
    info!(address = %wallet.address, "node wallet ready");

    let broadcaster = Arc::new(InProcessBroadcaster::new());
    let state = AppState::new(wallet, broadcaster);

    listener::spawn(state.clone(), Some((cli.root_host.clone(), cli.root_port)));

    let port = if cli.peer {
        let port = rand::random::<u16>() % (6000 - 5051) + 5051;
        sync_once(&state, &cli.root_host, cli.root_port).await;
        port
    } else {
        cli.port
    };

    if cli.seed_data {
        seed::populate(&state).await;
    }

    if cli.poll_root {
        spawn_poll_task(state.clone(), cli.root_host.clone(), cli.root_port, cli.poll_interval);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting http facade");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind http listener");
    axum::serve(listener, http::router(state))
        .await
        .expect("http server failed");
}

/// One-shot startup sync: fetch the root's chain and offer it to
/// `replace_chain`. Failure is logged, not fatal — the node still starts
/// serving with just its own genesis chain.
async fn sync_once(state: &AppState, root_host: &str, root_port: u16) {
    match fetch_chain(root_host, root_port).await {
        Ok(incoming) => {
            let mut blockchain = state.blockchain.lock().await;
            match blockchain.replace_chain(incoming) {
                Ok(()) => info!("synchronized local chain from root"),
                Err(e) => warn!(error = %e, "failed to synchronize local chain from root"),
            }
        }
        Err(e) => warn!(error = %e, "failed to fetch root chain"),
    }
}

fn spawn_poll_task(state: AppState, root_host: String, root_port: u16, poll_interval: u64) {
    tokio::spawn(async move {
        info!(host = %root_host, port = root_port, interval_s = poll_interval, "starting poll task");
        let mut interval = tokio::time::interval(Duration::from_secs(poll_interval));
        loop {
            interval.tick().await;
            match fetch_chain(&root_host, root_port).await {
                Ok(incoming) => {
                    let mut blockchain = state.blockchain.lock().await;
                    match blockchain.replace_chain(incoming) {
                        Ok(()) => info!(host = %root_host, "polled and replaced chain"),
                        Err(e) => warn!(error = %e, "polled chain was not accepted"),
                    }
                }
                Err(e) => warn!(error = %e, "error polling root blockchain"),
            }
        }
    });
}

pub(crate) async fn fetch_chain(root_host: &str, root_port: u16) -> Result<Vec<Block>, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let url = format!("http://{root_host}:{root_port}/blockchain");
    client.get(url).send().await?.json::<Vec<Block>>().await
}
