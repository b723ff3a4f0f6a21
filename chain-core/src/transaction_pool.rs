use std::collections::{BTreeMap, HashMap};

use crate::block::Block;
use crate::transaction::Transaction;

/// The mempool of not-yet-mined transactions.
///
/// `transactions` is a `BTreeMap` (not a `HashMap`) purely for
/// deterministic iteration order when snapshotting via
/// [`Self::transaction_data`]; it is not consensus-critical the way
/// `Transaction::output` being sorted is.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: BTreeMap<String, Transaction>,
    by_sender: HashMap<String, String>,
}

impl TransactionPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a transaction by id. Overwrite is intentional:
    /// an updated transaction keeps its id and supersedes the prior
    /// version in the pool.
    pub fn set_transaction(&mut self, transaction: Transaction) {
        if let Some(sender) = transaction.sender_address() {
            self.by_sender
                .insert(sender.to_string(), transaction.id.clone());
        }
        self.transactions.insert(transaction.id.clone(), transaction);
    }

    /// Returns any pending transaction already authored by `address`, so
    /// callers can `update` it in place instead of creating a second one.
    #[must_use]
    pub fn existing_transaction(&self, address: &str) -> Option<&Transaction> {
        self.by_sender
            .get(address)
            .and_then(|id| self.transactions.get(id))
    }

    /// A snapshot of pending transactions, for serializing to callers.
    #[must_use]
    pub fn transaction_data(&self) -> Vec<Transaction> {
        self.transactions.values().cloned().collect()
    }

    /// Drops every pooled transaction whose id now appears in `chain` —
    /// it has been mined and no longer belongs in the mempool.
    pub fn clear_blockchain_transactions(&mut self, chain: &[Block]) {
        let mined_ids: std::collections::HashSet<&str> = chain
            .iter()
            .flat_map(|block| block.data.iter())
            .map(|tx| tx.id.as_str())
            .collect();

        self.transactions.retain(|id, _| !mined_ids.contains(id.as_str()));
        self.by_sender
            .retain(|_, id| self.transactions.contains_key(id));
    }
}
