use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chain_core::{ChainError, Transaction};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::broadcaster::Channel;
use crate::state::AppState;

/// Mirrors the original Flask app's `CORS(app, resources={r'/*': {
/// 'origins': 'http://localhost:3000' }})` — restricted to the dev
/// frontend's origin, not wide open, even though CORS itself is an
/// out-of-scope collaborator per spec.md §1.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/blockchain", get(get_blockchain))
        .route("/blockchain/range", get(get_blockchain_range))
        .route("/blockchain/length", get(get_blockchain_length))
        .route("/blockchain/mine", get(mine_block))
        .route("/wallet/transact", post(wallet_transact))
        .route("/wallet/info", get(wallet_info))
        .route("/known-addresses", get(known_addresses))
        .route("/transactions", get(get_transactions))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    "http://localhost:3000"
                        .parse::<axum::http::HeaderValue>()
                        .expect("static origin is a valid header value"),
                )
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

/// Maps core errors to HTTP status: caller-fault variants are 4xx,
/// everything else (a tamper/consensus failure a well-behaved client
/// shouldn't be able to trigger) is 5xx.
struct ApiError(ChainError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChainError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
            ChainError::ChainNotLonger => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(value: ChainError) -> Self {
        Self(value)
    }
}

async fn get_blockchain(State(state): State<AppState>) -> Json<Vec<chain_core::Block>> {
    let blockchain = state.blockchain.lock().await;
    Json(blockchain.chain().to_vec())
}

#[derive(Deserialize)]
struct RangeParams {
    start: usize,
    end: usize,
}

/// Reverses the full chain before slicing `[start:end)` — not a
/// slice-then-reverse, since those two are not equivalent once `end`
/// exceeds the chain length.
async fn get_blockchain_range(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Json<Vec<chain_core::Block>> {
    let blockchain = state.blockchain.lock().await;
    let reversed: Vec<_> = blockchain
        .chain()
        .iter()
        .rev()
        .skip(params.start)
        .take(params.end.saturating_sub(params.start))
        .cloned()
        .collect();
    Json(reversed)
}

async fn get_blockchain_length(State(state): State<AppState>) -> Json<usize> {
    let blockchain = state.blockchain.lock().await;
    Json(blockchain.chain().len())
}

/// Drains the pool, appends a reward transaction, mines, broadcasts the
/// new block, and clears the just-mined transactions from the pool.
///
/// Mining is CPU-bound: the chain tip is read and cloned under lock, the
/// lock released, the search runs on a blocking thread, then the lock is
/// re-acquired to append. If the tip advanced in the meantime (another
/// miner won the race), the locally-mined block is dropped rather than
/// appended on top of a stale parent.
async fn mine_block(
    State(state): State<AppState>,
) -> Result<Json<chain_core::Block>, ApiError> {
    let pending = state.pool.lock().await.transaction_data();

    let last_block = state.blockchain.lock().await.tip().clone();
    let miner = chain_core::Miner::new(state.wallet.clone());
    let result = tokio::task::spawn_blocking(move || miner.mine(&last_block, pending))
        .await
        .expect("mining task panicked");

    let mut blockchain = state.blockchain.lock().await;
    if blockchain.tip().hash != result.block.last_hash {
        tracing::warn!("tip advanced during mining; dropping locally-mined block");
        return Err(ApiError(ChainError::ChainNotLonger));
    }
    // The tip check above just confirmed `result.block` mines atop the
    // current tip, so this only re-derives that same fact; append without
    // re-running proof-of-work over the nonce/timestamp/hash already found
    // unlocked above.
    blockchain
        .append_mined_block(result.block.clone())
        .expect("a block just mined atop the checked tip must satisfy is_valid");
    let mined = blockchain.tip().clone();
    let chain_snapshot = blockchain.chain().to_vec();
    drop(blockchain);

    state
        .pool
        .lock()
        .await
        .clear_blockchain_transactions(&chain_snapshot);

    let payload = serde_json::to_vec(&mined).unwrap_or_default();
    state.broadcaster.publish(Channel::Block, payload);

    Ok(Json(mined))
}

#[derive(Deserialize)]
struct TransactRequest {
    recipient: String,
    amount: u64,
}

async fn wallet_transact(
    State(state): State<AppState>,
    Json(request): Json<TransactRequest>,
) -> Result<Json<Transaction>, ApiError> {
    let mut pool = state.pool.lock().await;

    let existing = pool.existing_transaction(&state.wallet.address).cloned();
    let transaction = match existing {
        Some(mut tx) => {
            tx.update(&state.wallet, &request.recipient, request.amount)?;
            tx
        }
        None => Transaction::new(&state.wallet, &request.recipient, request.amount)?,
    };

    pool.set_transaction(transaction.clone());
    drop(pool);

    let payload = serde_json::to_vec(&transaction).unwrap_or_default();
    state.broadcaster.publish(Channel::Transaction, payload);

    Ok(Json(transaction))
}

#[derive(Serialize)]
struct WalletInfo {
    address: String,
    balance: u64,
}

async fn wallet_info(State(state): State<AppState>) -> Json<WalletInfo> {
    let blockchain = state.blockchain.lock().await;
    let balance = chain_core::Wallet::calculate_balance(&blockchain, &state.wallet.address);
    Json(WalletInfo {
        address: state.wallet.address.clone(),
        balance,
    })
}

async fn known_addresses(State(state): State<AppState>) -> Json<Vec<String>> {
    let blockchain = state.blockchain.lock().await;
    let addresses: HashSet<String> = blockchain
        .chain()
        .iter()
        .flat_map(|block| block.data.iter())
        .flat_map(|tx| tx.output.keys().cloned())
        .collect();
    Json(addresses.into_iter().collect())
}

async fn get_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    let pool = state.pool.lock().await;
    Json(pool.transaction_data())
}
