/// Random number generator (xorshift32)
#[inline]
pub fn xorshift32(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

/// Uniform float in [0, 1) from the top 24 bits
#[inline]
pub fn next_unit_f32(state: &mut u32) -> f32 {
    (xorshift32(state) >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Derive an independent non-zero stream seed (one per volume)
#[inline]
pub fn derive_seed(base: u32, stream: u32) -> u32 {
    // splitmix-style scramble so neighbouring streams don't correlate
    let mut z = base ^ stream.wrapping_mul(0x9E37_79B9);
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^= z >> 16;
    if z == 0 { 0x6D2B_79F5 } else { z }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_floats_stay_in_range() {
        let mut s = 12345;
        for _ in 0..10_000 {
            let v = next_unit_f32(&mut s);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn derived_seeds_are_non_zero_and_distinct() {
        let a = derive_seed(0, 0);
        let b = derive_seed(0, 1);
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }
}
