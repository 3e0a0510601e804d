//! Deterministic per-trial random streams.
//!
//! A master seed is expanded into one sub-seed per `(stream, trial)` pair with
//! BLAKE3. Derivation depends only on those inputs, never on the order in
//! which trials run, so a parallel run draws exactly the same noise as a
//! sequential one.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream label used for magnitude perturbation draws.
pub const PERTURB_STREAM: &str = "perturb";

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for one trial of one named stream.
    pub fn sub_seed(&self, stream: &str, trial: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&trial.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, stream: &str, trial: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, trial))
    }
}
