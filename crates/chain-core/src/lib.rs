use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod constants;

pub use constants::{DEFAULT_DIFFICULTY, GENESIS_TIMESTAMP, MINING_REWARD};

pub type Hash = [u8; constants::HASH_SIZE];

/// A transfer intent. `sender == None` marks a system-minted (coinbase)
/// transaction, e.g. a mining reward. No validation is performed anywhere:
/// overspending, self-transfers and empty addresses are all accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Option<String>,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: Some(sender.into()),
            recipient: recipient.into(),
            amount,
        }
    }

    /// A system-minted transaction with no sender.
    pub fn coinbase(recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: None,
            recipient: recipient.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub previous_hash: Hash,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub hash: Hash,
}

impl Block {
    /// Builds a block with `nonce = 0` and a provisional hash. With a
    /// non-zero difficulty the block still has to be mined before it can
    /// be appended.
    pub fn new(timestamp: u64, transactions: Vec<Transaction>, previous_hash: Hash) -> Self {
        let mut block = Self {
            previous_hash,
            timestamp,
            transactions,
            nonce: 0,
            hash: [0u8; 32],
        };
        block.hash = block.compute_hash();
        block
    }

    /// The exact byte sequence fed to SHA-256: previous hash, timestamp,
    /// the JSON encoding of the transaction list (order-preserving), nonce.
    /// The same encoding is used on the mining and the verify path.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let txs = serde_json::to_vec(&self.transactions).expect("transaction encoding");
        let mut bytes = Vec::with_capacity(32 + 8 + txs.len() + 8);
        bytes.extend_from_slice(&self.previous_hash);
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&txs);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Re-derives the digest from the current field values. Pure; does not
    /// touch the cached `hash`.
    pub fn compute_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.hash_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }

    /// Increments the nonce and recomputes the hash until it starts with
    /// `difficulty` leading zero hex characters. Unbounded and CPU-bound;
    /// runs to completion on the calling thread.
    pub fn mine(&mut self, difficulty: u32) {
        while !pow::meets_difficulty(&self.hash, difficulty) {
            self.nonce += 1;
            self.hash = self.compute_hash();
        }
        tracing::info!(
            "block mined with nonce {} and hash {}",
            self.nonce,
            hex::encode(self.hash)
        );
    }
}

pub mod pow {
    use super::Hash;

    /// Number of leading `'0'` characters in the hex encoding of `hash`.
    pub fn leading_zero_chars(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if b >> 4 == 0 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
        leading_zero_chars(hash) >= difficulty
    }
}

pub mod chain {
    use super::*;

    /// An append-only sequence of hash-linked blocks plus the pool of
    /// transactions waiting to be mined. Single-writer by contract: callers
    /// that share an instance across threads must serialize mutations
    /// themselves (the node does this with a dedicated writer task).
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Blockchain {
        pub blocks: Vec<Block>,
        pub difficulty: u32,
        pub pending_transactions: Vec<Transaction>,
        pub mining_reward: u64,
    }

    impl Blockchain {
        pub fn new() -> Self {
            Self::with_difficulty(DEFAULT_DIFFICULTY)
        }

        pub fn with_difficulty(difficulty: u32) -> Self {
            Self {
                blocks: vec![genesis_block()],
                difficulty,
                pending_transactions: Vec::new(),
                mining_reward: MINING_REWARD,
            }
        }

        /// The current tip. Infallible: the genesis block is always present.
        pub fn latest_block(&self) -> &Block {
            self.blocks.last().expect("chain never empty")
        }

        /// Queues a transaction for the next mined block. Accepted as-is,
        /// without balance or address checks.
        pub fn add_transaction(&mut self, tx: Transaction) {
            self.pending_transactions.push(tx);
        }

        /// Drains the pending pool, appends the mining reward for
        /// `reward_address` to the batch, and mines the batch onto the tip.
        /// Blocks the calling thread for the whole proof-of-work search.
        /// Returns a copy of the appended block.
        pub fn mine_pending_transactions(&mut self, reward_address: &str) -> Block {
            let mut txs = std::mem::take(&mut self.pending_transactions);
            txs.push(Transaction::coinbase(reward_address, self.mining_reward));

            let mut block = Block::new(now_ts(), txs, self.latest_block().hash);
            block.mine(self.difficulty);

            self.blocks.push(block);
            self.latest_block().clone()
        }

        /// Folds over every transaction in every finalized block. The
        /// pending pool is never counted. Balances may go negative; the
        /// fold runs in i128 and saturates at the i64 bounds, since any
        /// u64 amount is accepted as input.
        pub fn balance_of(&self, address: &str) -> i64 {
            let mut balance = 0i128;
            for block in &self.blocks {
                for tx in &block.transactions {
                    if tx.sender.as_deref() == Some(address) {
                        balance -= i128::from(tx.amount);
                    }
                    if tx.recipient == address {
                        balance += i128::from(tx.amount);
                    }
                }
            }
            balance.clamp(i64::MIN as i128, i64::MAX as i128) as i64
        }

        /// Walks the chain from index 1 and checks that every block's cached
        /// hash still matches its recomputed digest and that it links to its
        /// predecessor's stored hash. The genesis block is trusted by
        /// construction and is not re-derived.
        pub fn is_valid(&self) -> bool {
            for pair in self.blocks.windows(2) {
                let (previous, current) = (&pair[0], &pair[1]);
                if current.hash != current.compute_hash() {
                    return false;
                }
                if current.previous_hash != previous.hash {
                    return false;
                }
            }
            true
        }
    }

    impl Default for Blockchain {
        fn default() -> Self {
            Self::new()
        }
    }

    /// The fixed first block: zeroed previous-hash sentinel, constant
    /// timestamp, no transactions. Identical across all chain instances.
    pub fn genesis_block() -> Block {
        Block::new(GENESIS_TIMESTAMP, Vec::new(), [0u8; 32])
    }
}

fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}
