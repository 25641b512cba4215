/// Deterministic, non-cryptographic hash of `s` used as a template cache key.
///
/// Folds UTF-16 code units with `h = h * 31 + c` in 32-bit signed arithmetic and renders the
/// result in decimal, so the empty string hashes to `"0"`.
pub fn hash(s: &str) -> String {
    let h = s
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(i32::from(c)));
    h.to_string()
}
