use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// All sim-visible fractional quantities (point balances, experience,
/// thresholds, positions, rates) use this type so that state hashes
/// reproduce bit-for-bit across platforms. Floats exist only at the edges:
/// data files, the profile store contract, and display formatting.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only at the edges, never in the sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and persistence.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked multiplication for Fixed64 that returns None on overflow.
#[inline]
pub fn checked_mul_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_mul(b)
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Fixed-point square root, used for movement axis normalization.
/// Returns None for negative inputs. Result is the floor of the exact root
/// at Q32.32 precision, so it is deterministic on every platform.
pub fn sqrt_64(v: Fixed64) -> Option<Fixed64> {
    if v < Fixed64::ZERO {
        return None;
    }
    // bits = v * 2^32. Shifting 32 further gives v * 2^64, whose integer
    // square root is sqrt(v) * 2^32 -- the Q32.32 bits of the result.
    let scaled = (v.to_bits() as u128) << 32;
    Some(Fixed64::from_bits(isqrt_u128(scaled) as i64))
}

/// Integer square root by Newton iteration. The initial estimate is a power
/// of two at least as large as the root, so the sequence decreases
/// monotonically until it stabilizes at the floor.
fn isqrt_u128(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let bit_len = 128 - n.leading_zeros();
    let mut x = 1u128 << bit_len.div_ceil(2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}
