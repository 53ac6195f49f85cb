// src/circuit/mod.rs
use std::collections::HashSet;

use rand::Rng;
use thiserror::Error;

use crate::directory::DirectoryEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("need {requested} distinct relays but the directory holds {available}")]
    InsufficientNodes { available: usize, requested: usize },
    #[error("circuit has no hops")]
    EmptyCircuit,
}

/// Ordered path for one message. `hops[0]` is the entry relay, the last hop is the exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    pub hops: Vec<DirectoryEntry>,
}

impl Circuit {
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn entry(&self) -> Option<&DirectoryEntry> {
        self.hops.first()
    }

    pub fn exit(&self) -> Option<&DirectoryEntry> {
        self.hops.last()
    }
}

/// Draws `count` relays without replacement from an owned directory snapshot.
///
/// Entries repeating an earlier `node_id` are dropped before drawing. Selection
/// is uniform per draw and not meant to be a cryptographic shuffle.
pub fn select_circuit(
    directory: Vec<DirectoryEntry>,
    count: usize,
) -> Result<Circuit, CircuitError> {
    if count == 0 {
        return Err(CircuitError::EmptyCircuit);
    }

    let mut seen = HashSet::new();
    let mut candidates: Vec<DirectoryEntry> = directory
        .into_iter()
        .filter(|entry| seen.insert(entry.node_id))
        .collect();

    if candidates.len() < count {
        return Err(CircuitError::InsufficientNodes {
            available: candidates.len(),
            requested: count,
        });
    }

    let mut rng = rand::thread_rng();
    let mut hops = Vec::with_capacity(count);
    for hop_num in 0..count {
        let idx = rng.gen_range(0..candidates.len());
        let relay = candidates.swap_remove(idx);
        log::debug!("Selected node {} for hop {}", relay.node_id, hop_num);
        hops.push(relay);
    }

    Ok(Circuit { hops })
}
