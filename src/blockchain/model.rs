use log::debug;
use std::sync::atomic::AtomicBool;

use super::pow::{is_valid_proof, proof_of_work, proof_of_work_cancellable};
use super::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::error::ChainError;

/// In-memory, append-only chain with Proof-of-Work.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Blockchain {
    /// Initialize a new blockchain holding only the genesis block.
    pub fn new() -> Self {
        let mut bc = Self { chain: Vec::new() };
        bc.create_block(GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string());
        bc
    }

    /// Append a block with the next index. Inputs are not checked; callers
    /// normally pass the output of [`proof_of_work`] and [`Blockchain::hash`].
    pub fn create_block(&mut self, proof: u64, previous_hash: String) -> &Block {
        let index = self.chain.len() as u64 + 1;
        self.chain.push(Block::new(index, proof, previous_hash));
        &self.chain[self.chain.len() - 1]
    }

    /// Return the last block in the chain.
    pub fn get_previous_block(&self) -> Result<&Block, ChainError> {
        self.chain.last().ok_or(ChainError::EmptyChain)
    }

    pub fn proof_of_work(&self, previous_proof: u64) -> u64 {
        proof_of_work(previous_proof)
    }

    pub fn hash(&self, block: &Block) -> String {
        block.hash()
    }

    /// Mine and append a block on top of the current tip.
    pub fn mine_block(&mut self) -> Result<&Block, ChainError> {
        self.mine_with(|previous_proof| Some(proof_of_work(previous_proof)))
    }

    /// Like [`Blockchain::mine_block`], but abandons the search with
    /// [`ChainError::MiningCancelled`] once `cancel` is raised. The chain is
    /// left untouched in that case.
    pub fn mine_block_cancellable(&mut self, cancel: &AtomicBool) -> Result<&Block, ChainError> {
        self.mine_with(|previous_proof| proof_of_work_cancellable(previous_proof, cancel))
    }

    fn mine_with<F>(&mut self, search: F) -> Result<&Block, ChainError>
    where
        F: FnOnce(u64) -> Option<u64>,
    {
        let previous_block = self.get_previous_block()?;
        let proof = search(previous_block.proof).ok_or(ChainError::MiningCancelled)?;
        let previous_hash = self.hash(previous_block);
        Ok(self.create_block(proof, previous_hash))
    }

    /// Validate this engine's own chain.
    pub fn is_valid(&self) -> bool {
        is_chain_valid(&self.chain)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a chain: every block must sit at its own 1-based position,
/// link to the hash of its predecessor, and carry a proof satisfying the
/// difficulty predicate against the predecessor's proof. A single-block
/// chain is valid.
pub fn is_chain_valid(chain: &[Block]) -> bool {
    for (i, pair) in chain.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);

        if current.index != i as u64 + 2 {
            debug!("chain invalid at position {}: index {}", i + 1, current.index);
            return false;
        }

        // Check linkage
        if current.previous_hash != previous.hash() {
            debug!("chain invalid at position {}: previous_hash mismatch", i + 1);
            return false;
        }

        // Check PoW
        if !is_valid_proof(previous.proof, current.proof) {
            debug!("chain invalid at position {}: proof fails difficulty", i + 1);
            return false;
        }
    }

    true
}
