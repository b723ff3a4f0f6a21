use std::sync::Arc;

use chain_core::{Blockchain, TransactionPool, Wallet};
use tokio::sync::Mutex;

use crate::broadcaster::Broadcaster;

/// Shared, lock-guarded collaborators handed to every HTTP handler and
/// background task. One mutex per collaborator, not one big lock, so a
/// mining round holding the `Blockchain` lock doesn't also block pool
/// reads.
#[derive(Clone)]
pub struct AppState {
    pub blockchain: Arc<Mutex<Blockchain>>,
    pub pool: Arc<Mutex<TransactionPool>>,
    pub wallet: Arc<Wallet>,
    pub broadcaster: Arc<dyn Broadcaster>,
}

impl AppState {
    #[must_use]
    pub fn new(wallet: Wallet, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            blockchain: Arc::new(Mutex::new(Blockchain::new())),
            pool: Arc::new(Mutex::new(TransactionPool::new())),
            wallet: Arc::new(wallet),
            broadcaster,
        }
    }
}
