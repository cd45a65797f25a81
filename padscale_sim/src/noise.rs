//! Deterministic noise sources for simulated surfaces.

/// Tiny xorshift32 PRNG; deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() as f32) / (u32::MAX as f32 + 1.0)
    }
}

/// Standard normal samples via the Box-Muller transform.
#[derive(Debug, Clone)]
pub struct Gauss32 {
    rng: XorShift32,
    spare: Option<f32>,
}

impl Gauss32 {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: XorShift32::new(seed),
            spare: None,
        }
    }

    pub fn next_std(&mut self) -> f32 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        // Avoid log(0)
        let u1 = self.rng.next_f32().clamp(f32::EPSILON, 1.0 - f32::EPSILON);
        let u2 = self.rng.next_f32();
        let r = (-2.0 * u1.ln()).sqrt();
        let th = 2.0 * core::f32::consts::PI * u2;
        self.spare = Some(r * th.sin());
        r * th.cos()
    }
}
