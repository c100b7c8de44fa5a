//! Stable aggregate digests.
//!
//! Renderers derive class, table and type names from aggregates and need
//! names that stay identical across runs and across unrelated schema edits.
//! We digest the aggregate's root path with FNV-1a 64-bit:
//!
//! - input: path segments joined with `/`
//! - output: `"agg<16 lowercase hex digits>"`
//!
//! This is not a security primitive, only an identity tool.

/// Prefix used in aggregate unique names.
pub const AGGREGATE_NAME_PREFIX: &str = "agg";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

fn add(hash: &mut u64, bytes: &[u8]) {
    for b in bytes {
        *hash ^= (*b) as u64;
        *hash = hash.wrapping_mul(FNV_PRIME);
    }
}

/// FNV-1a 64-bit over arbitrary bytes.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    add(&mut hash, bytes);
    hash
}

/// Unique name for an aggregate addressed by `segments` (root first).
///
/// Segments are separated by `/` in the digest input, so `["ab", "c"]` and
/// `["a", "bc"]` produce different names.
pub fn aggregate_unique_name<S: AsRef<str>>(segments: &[S]) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            add(&mut hash, b"/");
        }
        add(&mut hash, segment.as_ref().as_bytes());
    }
    format!("{AGGREGATE_NAME_PREFIX}{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_name_has_expected_prefix_and_width() {
        let n = aggregate_unique_name(&["Order", "Lines"]);
        assert!(n.starts_with(AGGREGATE_NAME_PREFIX));
        assert_eq!(n.len(), AGGREGATE_NAME_PREFIX.len() + 16);
    }

    #[test]
    fn unique_name_respects_segment_boundaries() {
        assert_ne!(
            aggregate_unique_name(&["ab", "c"]),
            aggregate_unique_name(&["a", "bc"])
        );
    }

    #[test]
    fn unique_name_matches_digest_of_joined_path() {
        let expected = format!("{AGGREGATE_NAME_PREFIX}{:016x}", fnv1a64(b"Order/Lines"));
        assert_eq!(aggregate_unique_name(&["Order", "Lines"]), expected);
    }
}
