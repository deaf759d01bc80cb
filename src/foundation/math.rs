use crate::foundation::core::Frame;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Stable content digest over frame pixels and durations.
pub fn frames_digest(frames: &[Frame]) -> u64 {
    let mut h = Fnv1a64::new_default();
    h.write_u64(frames.len() as u64);
    for f in frames {
        h.write_u32(f.duration_ms);
        h.write_bytes(&f.to_rgb_bytes());
    }
    h.finish()
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        // SplitMix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub(crate) fn next_u8(&mut self) -> u8 {
        (self.next_u64() >> 56) as u8
    }
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255).min(255) as u8
}

/// Linear blend `a -> b` by `t/255`.
pub(crate) fn lerp_u8(a: u8, b: u8, t: u8) -> u8 {
    let a16 = u16::from(a);
    let b16 = u16::from(b);
    let t16 = u16::from(t);
    mul_div255_u8(a16, 255 - t16).saturating_add(mul_div255_u8(b16, t16))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
