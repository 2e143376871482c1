//! Content fingerprints for virtual document versioning.
//!
//! A virtual document's version must change whenever its extracted text
//! changes, even if the host version token stays the same. FNV-1a is cheap and
//! stable across runs, which is all a fingerprint needs.

/// Compute the FNV-1a 64-bit hash of text content.
///
/// Not collision resistant against adversarial input; used only for change
/// detection.
///
/// # Example
///
/// ```
/// use mosaic_ls::text::fnv1a_hash;
///
/// assert_eq!(fnv1a_hash("<script>"), fnv1a_hash("<script>"));
/// assert_ne!(fnv1a_hash("<script>"), fnv1a_hash("<style>"));
/// ```
#[inline]
pub fn fnv1a_hash(text: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    text.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Render a fingerprint as the fixed-width hex string embedded in version tokens.
pub fn fingerprint(text: &str) -> String {
    format!("{:016x}", fnv1a_hash(text))
}
