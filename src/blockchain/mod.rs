pub mod block;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::Blockchain;

/// Proof stored in the genesis block.
pub const GENESIS_PROOF: u64 = 1;

/// Sentinel `previous_hash` of the genesis block (not a real digest).
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Fixed Proof-of-Work target: the hex digest must start with this.
pub const DIFFICULTY_PREFIX: &str = "0000";
