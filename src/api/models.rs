use crate::blockchain::{Block, Blockchain};
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared application state: the single chain engine for this process.
/// The mutex serializes mining so index and linkage stay consistent.
pub struct AppState {
    pub blockchain: Mutex<Blockchain>,
    /// Raised once at shutdown; in-flight proof searches give up.
    pub shutdown: AtomicBool,
}

impl AppState {
    pub fn begin_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            blockchain: Mutex::new(Blockchain::new()),
            shutdown: AtomicBool::new(false),
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct MineResponse {
    pub message: &'static str,
    pub index: u64,
    pub timestamp: String,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub message: &'static str,
    pub valid: bool,
}
