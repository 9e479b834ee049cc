//! Exact row arithmetic on `u128`
//!
//! Row identities go up to 2^122, and the scroll mapping multiplies them by a
//! pixel coordinate. The product can exceed 128 bits, so the multiply and the
//! divide are fused in a way that never forms it.

/// Row identity. Wide enough for the 2^122 synthetic UUID space.
pub type RowId = u128;

/// Narrow a row value to a machine integer, clamping instead of wrapping
pub fn saturating_u64(value: RowId) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// `(a * b / c, a * b % c)` computed without overflow.
///
/// Requires `a <= c` and `c > 0`; the quotient is then at most `b`.
pub fn mul_div_rem(a: u64, b: RowId, c: u64) -> (RowId, u64) {
    debug_assert!(c > 0, "divisor must be positive");
    debug_assert!(a <= c, "numerator factor must not exceed divisor");
    let (a, c) = (a as u128, c as u128);

    // b = q*c + r  =>  a*b = a*q*c + a*r, and a*r < c^2 <= 2^128
    let q = b / c;
    let r = b % c;
    let ar = a * r;
    (a * q + ar / c, (ar % c) as u64)
}

/// Format a row count with thousands separators (`1,234,567`)
pub fn group_digits(value: RowId) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
