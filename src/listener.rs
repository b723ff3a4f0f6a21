use chain_core::{Block, Transaction};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::broadcaster::{Broadcaster, Channel};
use crate::state::AppState;

/// Spawns the two broadcast-listener tasks: one applying incoming blocks,
/// one applying incoming pending transactions. Both treat the message as a
/// hypothesis to validate, never as trusted input — a peer can send
/// garbage or a block built on a fork, and the worst that should happen is
/// the message is logged and dropped.
pub fn spawn(state: AppState, root_host: Option<(String, u16)>) {
    spawn_block_listener(state.clone(), root_host);
    spawn_transaction_listener(state);
}

/// Applies an incoming block as `potential_chain = chain + [block]` fed to
/// `replace_chain`, per spec.md §5's "Ordering guarantees": the bus is
/// unordered, so a block that extends something other than our current tip
/// is an expected occurrence, not an error. When the hypothesis doesn't
/// validate — most likely because intermediate blocks never arrived — fall
/// back to a full resync from the seed peer, if one is configured.
fn spawn_block_listener(state: AppState, root_host: Option<(String, u16)>) {
    let mut rx = state.broadcaster.subscribe(Channel::Block);
    tokio::spawn(async move {
        loop {
            let payload = match rx.recv().await {
                Ok(payload) => payload,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "block listener lagged; some broadcasts were dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let block: Block = match serde_json::from_slice(&payload) {
                Ok(block) => block,
                Err(e) => {
                    warn!(error = %e, "received malformed block broadcast");
                    continue;
                }
            };

            let mut blockchain = state.blockchain.lock().await;
            let mut potential_chain = blockchain.chain().to_vec();
            potential_chain.push(block);

            match blockchain.replace_chain(potential_chain) {
                Ok(()) => {
                    info!("extended local chain from broadcast block");
                    let chain_snapshot = blockchain.chain().to_vec();
                    drop(blockchain);
                    state
                        .pool
                        .lock()
                        .await
                        .clear_blockchain_transactions(&chain_snapshot);
                }
                Err(e) => {
                    warn!(error = %e, "broadcast block did not extend local chain; resyncing");
                    drop(blockchain);
                    if let Some((host, port)) = &root_host {
                        resync_from(&state, host, *port).await;
                    }
                }
            }
        }
    });
}

/// Accepts a broadcast transaction into the local pool once it passes the
/// same validity check the miner would eventually re-check anyway. An
/// invalid transaction is logged and dropped, never propagated further.
fn spawn_transaction_listener(state: AppState) {
    let mut rx = state.broadcaster.subscribe(Channel::Transaction);
    tokio::spawn(async move {
        loop {
            let payload = match rx.recv().await {
                Ok(payload) => payload,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "transaction listener lagged; some broadcasts were dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let transaction: Transaction = match serde_json::from_slice(&payload) {
                Ok(transaction) => transaction,
                Err(e) => {
                    warn!(error = %e, "received malformed transaction broadcast");
                    continue;
                }
            };

            if let Err(e) = chain_core::is_valid_transaction(&transaction) {
                warn!(error = %e, "rejected invalid broadcast transaction");
                continue;
            }

            state.pool.lock().await.set_transaction(transaction);
        }
    });
}

/// Full-chain resync against a known peer, used when a broadcast block's
/// hypothesis chain fails validation (typically because intermediate
/// blocks never arrived over the unordered bus).
async fn resync_from(state: &AppState, root_host: &str, root_port: u16) {
    match crate::fetch_chain(root_host, root_port).await {
        Ok(incoming) => {
            let mut blockchain = state.blockchain.lock().await;
            match blockchain.replace_chain(incoming) {
                Ok(()) => info!("resynchronized local chain from root after broadcast mismatch"),
                Err(e) => warn!(error = %e, "resync chain was not accepted"),
            }
        }
        Err(e) => warn!(error = %e, "failed to fetch root chain during resync"),
    }
}
