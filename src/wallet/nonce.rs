//! Sender Nonce Allocation
//!
//! The chain accepts exactly one transaction per (sender, nonce). The
//! transfer pipeline takes whatever nonce the caller supplies, so callers
//! running concurrent flows for one sender allocate through a shared
//! [`NonceAllocator`] to avoid handing the same nonce to two flows.

use crate::error::{StxError, StxResult};
use crate::types::Network;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

// =============================================================================
// Types
// =============================================================================

/// Nonce state for one sender on one network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NonceState {
    /// Next nonce the chain expects (from the account endpoint)
    pub chain_nonce: u64,
    /// Handed to a flow, not yet broadcast
    pub reserved: BTreeSet<u64>,
    /// Broadcast, waiting for inclusion
    pub pending: BTreeSet<u64>,
}

/// Outcome of an allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceResult {
    pub address: String,
    pub network: Network,
    pub nonce: u64,
    pub source: NonceSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceSource {
    /// Equal to the chain's expected nonce
    Network,
    /// Skipped past locally reserved or pending nonces
    Local,
}

/// Range of nonces nobody has claimed below a pending one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceGap {
    pub start: u64,
    pub end: u64,
    pub count: u64,
}

type SenderKey = (Network, String);

// =============================================================================
// Allocator
// =============================================================================

/// Per-sender nonce bookkeeping shared by concurrent transfer flows
#[derive(Debug, Default)]
pub struct NonceAllocator {
    senders: Mutex<HashMap<SenderKey, NonceState>>,
}

impl NonceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SenderKey, NonceState>> {
        // Bookkeeping stays consistent even if a holder panicked
        self.senders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve the next free nonce for `address`.
    ///
    /// `chain_nonce` is the account nonce last reported by the node. The
    /// lookup and reservation happen under one lock, so two callers never
    /// receive the same value. Fails once every nonce up to `u64::MAX` is
    /// claimed.
    pub fn allocate(
        &self,
        address: &str,
        network: Network,
        chain_nonce: u64,
    ) -> StxResult<NonceResult> {
        let mut senders = self.lock();
        let state = senders
            .entry((network, address.to_string()))
            .or_default();

        if chain_nonce > state.chain_nonce {
            state.chain_nonce = chain_nonce;
        }
        let floor = state.chain_nonce;
        state.pending.retain(|&n| n >= floor);
        state.reserved.retain(|&n| n >= floor);

        let mut next = state.chain_nonce;
        while state.pending.contains(&next) || state.reserved.contains(&next) {
            next = next.checked_add(1).ok_or_else(exhausted)?;
        }
        state.reserved.insert(next);

        let source = if next == state.chain_nonce {
            NonceSource::Network
        } else {
            NonceSource::Local
        };

        tracing::debug!(
            address = %crate::utils::logging::redact_address(address),
            %network,
            nonce = next,
            ?source,
            "nonce allocated"
        );

        Ok(NonceResult {
            address: address.to_string(),
            network,
            nonce: next,
            source,
        })
    }

    /// Move a reserved nonce to pending once its transaction was broadcast
    pub fn mark_broadcast(&self, address: &str, network: Network, nonce: u64) {
        let mut senders = self.lock();
        let state = senders
            .entry((network, address.to_string()))
            .or_default();
        state.reserved.remove(&nonce);
        state.pending.insert(nonce);
    }

    /// Record that the transaction using `nonce` was included
    pub fn confirm(&self, address: &str, network: Network, nonce: u64) -> StxResult<()> {
        let following = nonce.checked_add(1).ok_or_else(exhausted)?;
        let mut senders = self.lock();
        let state = senders
            .entry((network, address.to_string()))
            .or_default();
        state.reserved.remove(&nonce);
        state.pending.remove(&nonce);
        if nonce >= state.chain_nonce {
            state.chain_nonce = following;
        }
        Ok(())
    }

    /// Give back a nonce whose flow was abandoned or rejected by the chain
    pub fn release(&self, address: &str, network: Network, nonce: u64) {
        let mut senders = self.lock();
        if let Some(state) = senders.get_mut(&(network, address.to_string())) {
            state.reserved.remove(&nonce);
            state.pending.remove(&nonce);
        }
    }

    /// Unclaimed nonces below the highest pending one
    pub fn detect_gaps(&self, address: &str, network: Network) -> Vec<NonceGap> {
        let senders = self.lock();
        let state = match senders.get(&(network, address.to_string())) {
            Some(s) => s,
            None => return Vec::new(),
        };

        let highest = match state.pending.iter().next_back() {
            Some(&h) => h,
            None => return Vec::new(),
        };

        let mut gaps = Vec::new();
        let mut start: Option<u64> = None;
        for n in state.chain_nonce..highest {
            let claimed = state.pending.contains(&n) || state.reserved.contains(&n);
            match (claimed, start) {
                (false, None) => start = Some(n),
                (true, Some(s)) => {
                    gaps.push(NonceGap {
                        start: s,
                        end: n - 1,
                        count: n - s,
                    });
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            gaps.push(NonceGap {
                start: s,
                end: highest - 1,
                count: highest - s,
            });
        }
        gaps
    }

    pub fn state(&self, address: &str, network: Network) -> Option<NonceState> {
        self.lock().get(&(network, address.to_string())).cloned()
    }
}

fn exhausted() -> StxError {
    StxError::invalid_intent("nonce", "Nonce space exhausted for this sender")
}
