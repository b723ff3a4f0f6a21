//! Cross-module scenarios spanning `Block` + `Blockchain` + `Wallet` +
//! `TransactionPool` together, placed at the crate boundary rather than in
//! any one module's `#[cfg(test)]` block.

use chain_core::{reward_transaction, Blockchain, Transaction, TransactionPool, Wallet};

#[test]
fn genesis_identity_matches_the_fixed_constant() {
    let blockchain = Blockchain::new();
    assert_eq!(blockchain.chain().len(), 1);
    assert_eq!(blockchain.chain()[0].hash, "genesis_hash");
}

#[test]
fn mining_two_blocks_keeps_the_chain_linked_and_valid() {
    let mut blockchain = Blockchain::new();
    let miner = Wallet::new();

    blockchain.add_block(vec![reward_transaction(&miner)]);
    blockchain.add_block(vec![reward_transaction(&miner)]);

    assert_eq!(blockchain.chain().len(), 3);
    assert_eq!(blockchain.chain()[2].last_hash, blockchain.chain()[1].hash);
    assert!(Blockchain::is_valid_chain(blockchain.chain()).is_ok());
}

#[test]
fn tampering_with_a_blocks_data_is_caught_as_hash_tamper() {
    let mut blockchain = Blockchain::new();
    let miner = Wallet::new();
    blockchain.add_block(vec![reward_transaction(&miner)]);

    let mut tampered = blockchain.chain().to_vec();
    tampered[1].data = vec![reward_transaction(&Wallet::new())];

    assert_eq!(
        Blockchain::is_valid_chain(&tampered),
        Err(chain_core::ChainError::HashTamper)
    );
}

/// Scenario 7 from the spec: node A has a shorter chain, node B has a
/// longer valid one; A adopts B's chain wholesale, and the reverse
/// direction is a no-op.
#[test]
fn longer_valid_chain_replaces_the_shorter_one_but_not_vice_versa() {
    let mut node_a = Blockchain::new();
    let miner = Wallet::new();
    node_a.add_block(vec![reward_transaction(&miner)]);
    node_a.add_block(vec![reward_transaction(&miner)]);
    assert_eq!(node_a.chain().len(), 3);

    let mut node_b = node_a.clone();
    node_b.add_block(vec![reward_transaction(&miner)]);
    assert_eq!(node_b.chain().len(), 4);

    node_a.replace_chain(node_b.chain().to_vec()).unwrap();
    assert_eq!(node_a.chain(), node_b.chain());

    let shorter = Blockchain::new();
    assert!(node_b
        .replace_chain(shorter.chain().to_vec())
        .is_err());
    assert_eq!(node_b.chain().len(), 4);
}

/// A transaction that rides along in a mined block disappears from the
/// pool once the miner's chain snapshot is handed to
/// `clear_blockchain_transactions` — exercising the pool/chain seam the
/// HTTP mining handler relies on.
#[test]
fn mining_a_pending_transaction_clears_it_from_the_pool() {
    let mut blockchain = Blockchain::new();
    let mut pool = TransactionPool::new();
    let sender = Wallet::new();
    let miner = Wallet::new();

    let tx = Transaction::new(&sender, "recipient", 100).unwrap();
    pool.set_transaction(tx.clone());

    blockchain.add_block(vec![tx, reward_transaction(&miner)]);
    pool.clear_blockchain_transactions(blockchain.chain());

    assert!(pool.transaction_data().is_empty());
}

/// A balance computation across several hops: sender spends to r1, later
/// receives funds from a third party, then spends again — the reset-on-
/// send rule must still land on the right number.
#[test]
fn calculate_balance_tracks_multiple_blocks_of_activity() {
    let mut blockchain = Blockchain::new();
    let alice = Wallet::new();
    let bob = Wallet::new();
    let miner = Wallet::new();

    let tx1 = Transaction::new(&alice, &bob.address, 200).unwrap();
    blockchain.add_block(vec![tx1, reward_transaction(&miner)]);

    let tx2 = Transaction::new(&bob, &alice.address, 50).unwrap();
    blockchain.add_block(vec![tx2, reward_transaction(&miner)]);

    // alice: 1000 - 200 (sent) = 800, then +50 received = 850
    assert_eq!(Wallet::calculate_balance(&blockchain, &alice.address), 850);
    // bob: +200 received, then reset to 0 on send, then +950 change = 950
    assert_eq!(Wallet::calculate_balance(&blockchain, &bob.address), 950);
}
