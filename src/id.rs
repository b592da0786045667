//! Local id generation.
//!
//! One capability, `generate_id(prefix)`. The entropy source is picked once:
//! uuid v4 randomness normally, or a seeded splitmix64 sequence when
//! `SOULCORE_ID_SEED` is set (reproducible ids for fixtures and tests).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use uuid::Uuid;

pub const ID_SEED_ENV: &str = "SOULCORE_ID_SEED";

/// Suffix length of `prefix-xxxxx` ids.
pub const SUFFIX_LEN: usize = 5;
/// 36^12 still fits in the 64 bits drawn per id.
const MAX_SUFFIX_LEN: usize = 12;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug)]
enum IdSource {
    Random,
    Seeded(AtomicU64),
}

#[derive(Debug)]
pub struct IdGenerator {
    source: IdSource,
}

impl IdGenerator {
    pub fn random() -> Self {
        Self { source: IdSource::Random }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { source: IdSource::Seeded(AtomicU64::new(seed)) }
    }

    /// Seeded when `SOULCORE_ID_SEED` parses as a u64, random otherwise.
    pub fn from_env() -> Self {
        match std::env::var(ID_SEED_ENV).ok().and_then(|s| s.trim().parse().ok()) {
            Some(seed) => {
                tracing::debug!(seed, "using seeded id generator");
                Self::seeded(seed)
            }
            None => Self::random(),
        }
    }

    /// Process-wide generator, chosen on first use.
    pub fn global() -> &'static IdGenerator {
        static GLOBAL: OnceLock<IdGenerator> = OnceLock::new();
        GLOBAL.get_or_init(IdGenerator::from_env)
    }

    /// `prefix-xxxxx` with a base-36 suffix.
    pub fn generate_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.suffix(SUFFIX_LEN))
    }

    /// Bare base-36 suffix of `len` characters, at most 12.
    pub fn suffix(&self, len: usize) -> String {
        let mut n = self.next_u64();
        let len = len.min(MAX_SUFFIX_LEN);
        let mut out = String::with_capacity(len);
        for _ in 0..len {
            out.push(BASE36[(n % 36) as usize] as char);
            n /= 36;
        }
        out
    }

    fn next_u64(&self) -> u64 {
        match &self.source {
            IdSource::Random => Uuid::new_v4().as_u128() as u64,
            IdSource::Seeded(state) => {
                let s = state
                    .fetch_add(0x9E37_79B9_7F4A_7C15, Ordering::Relaxed)
                    .wrapping_add(0x9E37_79B9_7F4A_7C15);
                splitmix64(s)
            }
        }
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Shorthand for `IdGenerator::global().generate_id(prefix)`.
pub fn generate_id(prefix: &str) -> String {
    IdGenerator::global().generate_id(prefix)
}
