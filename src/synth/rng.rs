//! Seedable random sources for texture generation.
//!
//! Every texture draws from its own PCG32 stream. Stream seeds are derived
//! from a base seed with BLAKE3 so a texture's samples do not depend on the
//! order in which textures are generated.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Creates a PCG32 generator from a 64-bit seed.
pub fn create_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Derives the seed for a named texture from the base seed.
///
/// Hashes the base seed (little-endian) followed by the UTF-8 key and keeps
/// the first 8 bytes of the digest.
pub fn derive_texture_seed(base_seed: u64, key: &str) -> u64 {
    let mut input = Vec::with_capacity(8 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());

    let hash = blake3::hash(&input);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Draws a uniform sample in [-1, 1).
#[inline]
pub fn white_sample<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>() * 2.0 - 1.0
}

/// Picks a fresh base seed from OS entropy.
pub fn entropy_seed() -> u64 {
    rand::thread_rng().gen()
}
