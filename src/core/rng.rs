//! RNG module - session-owned deterministic randomness
//!
//! A simple 64-bit LCG. Every consumer of randomness in the engine (initial
//! board, re-rolls, refill colors, multiplier chance, bomb placement) draws
//! from the one generator owned by its session, so a seed plus an action
//! sequence replays to an identical event transcript. The live state is
//! exported into saved games.

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses Knuth's MMIX constants
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64
    pub fn next_u64(&mut self) -> u64 {
        // LCG formula: state = a * state + c (mod 2^64)
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u64) -> u64 {
        self.next_u64() % max
    }

    /// Generate a uniform f64 in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Draw a regular tile color from the active palette
    pub fn next_color(&mut self, palette_size: u8) -> i8 {
        self.next_range(palette_size as u64) as i8
    }

    /// Get the current RNG state (exported into saved games)
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}
