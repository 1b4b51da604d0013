pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// 2017-01-01T00:00:00Z, the fixed genesis timestamp.
pub const GENESIS_TIMESTAMP: u64 = 1_483_228_800;
/// Required leading zero hex characters in a block hash.
pub const DEFAULT_DIFFICULTY: u32 = 2;
/// Coins minted for the miner of each block.
pub const MINING_REWARD: u64 = 100;
