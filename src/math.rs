//! Math function wrappers for std/no_std compatibility
//!
//! Uses standard library math when available, falls back to libm for no_std.

#[cfg(feature = "std")]
#[inline]
pub fn ln(x: f64) -> f64 {
    x.ln()
}

#[cfg(not(feature = "std"))]
#[inline]
pub fn ln(x: f64) -> f64 {
    libm::log(x)
}

#[cfg(feature = "std")]
#[inline]
pub fn exp(x: f64) -> f64 {
    x.exp()
}

#[cfg(not(feature = "std"))]
#[inline]
pub fn exp(x: f64) -> f64 {
    libm::exp(x)
}

#[cfg(feature = "std")]
#[inline]
pub fn ceil(x: f64) -> f64 {
    x.ceil()
}

#[cfg(not(feature = "std"))]
#[inline]
pub fn ceil(x: f64) -> f64 {
    libm::ceil(x)
}

#[cfg(feature = "std")]
#[inline]
pub fn powi(x: f64, n: i32) -> f64 {
    x.powi(n)
}

#[cfg(not(feature = "std"))]
#[inline]
pub fn powi(x: f64, n: i32) -> f64 {
    libm::pow(x, n as f64)
}

/// Optimal bit count for `n` items at false-positive rate `p`:
/// `ceil(-n * ln(p) / ln(2)^2)`
pub fn optimal_bit_count(n: usize, p: f64) -> f64 {
    let ln2_squared = core::f64::consts::LN_2 * core::f64::consts::LN_2;
    ceil(-(n as f64) * ln(p) / ln2_squared)
}

/// Optimal probe count for `m` bits holding `n` items: `ceil((m / n) * ln(2))`
pub fn optimal_hash_count(m: f64, n: usize) -> f64 {
    ceil((m / n as f64) * core::f64::consts::LN_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sizing() {
        let m = optimal_bit_count(2, 0.01);
        assert_eq!(m, 20.0);
        assert_eq!(optimal_hash_count(m, 2), 7.0);

        let m = optimal_bit_count(10, 0.01);
        assert_eq!(m, 96.0);
        assert_eq!(optimal_hash_count(m, 10), 7.0);
    }

    #[test]
    fn test_bits_grow_with_lower_rate() {
        assert!(optimal_bit_count(1000, 0.001) > optimal_bit_count(1000, 0.01));
    }
}
