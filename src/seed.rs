use rand::Rng;

use crate::state::AppState;

/// Populates the chain with 10 two-transaction demo blocks and the pool
/// with 3 pending transactions, each between a pair of freshly-generated
/// throwaway wallets.
///
/// Demo transactions are funded from fresh wallets' `STARTING_BALANCE`,
/// not the node's own wallet — none of the seed blocks have been mined by
/// the node's wallet yet, so it has nothing to spend.
pub async fn populate(state: &AppState) {
    let mut blockchain = state.blockchain.lock().await;
    for _ in 0..10 {
        let sender_a = chain_core::Wallet::new();
        let recipient_a = chain_core::Wallet::new().address;
        let sender_b = chain_core::Wallet::new();
        let recipient_b = chain_core::Wallet::new().address;

        let tx_a = chain_core::Transaction::new(&sender_a, &recipient_a, random_amount())
            .expect("fresh wallet always has enough balance for a seed transfer");
        let tx_b = chain_core::Transaction::new(&sender_b, &recipient_b, random_amount())
            .expect("fresh wallet always has enough balance for a seed transfer");

        blockchain.add_block(vec![tx_a, tx_b]);
    }
    drop(blockchain);

    let mut pool = state.pool.lock().await;
    for _ in 0..3 {
        let sender = chain_core::Wallet::new();
        let recipient = chain_core::Wallet::new().address;
        let tx = chain_core::Transaction::new(&sender, &recipient, random_amount())
            .expect("fresh wallet always has enough balance for a seed transfer");
        pool.set_transaction(tx);
    }

    tracing::info!("seeded 10 demo blocks and 3 pending pool transactions");
}

fn random_amount() -> u64 {
    rand::thread_rng().gen_range(2..=50)
}
