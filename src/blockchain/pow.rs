use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};

use super::DIFFICULTY_PREFIX;

/// Base-10 text of `new_proof² - previous_proof²`, with a leading `-` when
/// negative. Computed in 128-bit so every pair of `u64` proofs is exact.
fn square_difference_text(new_proof: u64, previous_proof: u64) -> String {
    let a = u128::from(new_proof) * u128::from(new_proof);
    let b = u128::from(previous_proof) * u128::from(previous_proof);
    if a >= b {
        (a - b).to_string()
    } else {
        format!("-{}", b - a)
    }
}

/// Lowercase hex SHA-256 of the square-difference text for a proof pair.
pub fn proof_hash(previous_proof: u64, new_proof: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(square_difference_text(new_proof, previous_proof).as_bytes());
    hex::encode(hasher.finalize())
}

/// Difficulty predicate: does `new_proof` satisfy the target after `previous_proof`?
pub fn is_valid_proof(previous_proof: u64, new_proof: u64) -> bool {
    proof_hash(previous_proof, new_proof).starts_with(DIFFICULTY_PREFIX)
}

/// Positive candidates in increasing order, starting at 1.
#[cfg(not(feature = "rayon"))]
fn candidates() -> impl Iterator<Item = u64> {
    1u64..
}

fn cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

#[cfg(not(feature = "rayon"))]
fn search(previous_proof: u64, cancel: Option<&AtomicBool>) -> Option<u64> {
    for p in candidates() {
        if cancelled(cancel) {
            return None;
        }
        if is_valid_proof(previous_proof, p) {
            return Some(p);
        }
    }
    None
}

/// Candidates scanned per parallel window.
#[cfg(feature = "rayon")]
const PARALLEL_WINDOW: u64 = 1 << 14;

/// Scans ascending windows in parallel; `find_first` keeps the lowest hit
/// within a window, so the result equals the sequential scan. The cancel
/// flag is checked between windows.
#[cfg(feature = "rayon")]
fn search(previous_proof: u64, cancel: Option<&AtomicBool>) -> Option<u64> {
    use rayon::prelude::*;

    let mut start = 1u64;
    while start < u64::MAX {
        if cancelled(cancel) {
            return None;
        }
        let end = start.saturating_add(PARALLEL_WINDOW);
        if let Some(p) = (start..end)
            .into_par_iter()
            .find_first(|&p| is_valid_proof(previous_proof, p))
        {
            return Some(p);
        }
        start = end;
    }
    None
}

/// Find the smallest positive proof satisfying the difficulty predicate
/// after `previous_proof`.
///
/// Unbounded: there is no iteration cap and no timeout.
pub fn proof_of_work(previous_proof: u64) -> u64 {
    search(previous_proof, None).expect("proof search space exhausted")
}

/// Like [`proof_of_work`], but gives up with `None` once `cancel` is set.
/// A returned proof is always the smallest satisfying one.
pub fn proof_of_work_cancellable(previous_proof: u64, cancel: &AtomicBool) -> Option<u64> {
    search(previous_proof, Some(cancel))
}
