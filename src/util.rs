use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn parse_seed(seed: &str) -> Result<u64> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(&hex.replace('_', ""), 16)
            .with_context(|| format!("invalid hex seed: {s}"))
    } else {
        s.replace('_', "")
            .parse::<u64>()
            .with_context(|| format!("invalid decimal seed: {s}"))
    }
}

pub fn seed_to_hex(seed: u64) -> String {
    format!("0x{seed:016x}")
}

/// Next link in the seed chain used for generations and seed sweeps.
pub fn next_seed(seed: u64) -> u64 {
    seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)
}

/// `count` seeds starting at `start`, each derived from the previous one.
pub fn seed_chain(start: u64, count: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(count);
    let mut cur = start;
    for _ in 0..count {
        out.push(cur);
        cur = next_seed(cur);
    }
    out
}

/// Seed for one population member, independent of evaluation order.
pub fn derive_member_seed(generation_seed: u64, member: usize) -> u64 {
    // splitmix64 finalizer over the pair.
    let mut z = generation_seed ^ (member as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating directory {}", parent.display()))?;
        }
    }
    let encoded = serde_json::to_vec_pretty(value)?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}
