//! Deterministic canonicalization of query parameters.
//!
//! Issuer and verifier must produce byte-identical canonical forms for the
//! same logical parameter set, otherwise signature verification fails. The
//! canonical form is: drop the signature parameter, sort the remaining
//! `(key, value)` pairs as tuples, percent-encode both sides, join with `&`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// The reserved query key carrying the signature. Always excluded from the
/// canonical form so the digest never covers itself.
pub const SIG_KEY: &str = "sig";

/// Encode set for canonical keys and values: everything except the
/// unreserved characters (ALPHA / DIGIT / `-` / `_` / `.` / `~`) is escaped.
pub(crate) const CANONICAL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Produces the canonical byte-string form of a query parameter set.
///
/// Pairs whose key is [`SIG_KEY`] are dropped. The rest are sorted
/// lexicographically by `(key, value)` tuple (duplicate keys are retained,
/// ties broken by value), then percent-encoded and joined as `key=value`
/// pairs with `&`. The result is identical for any permutation of the same
/// input multiset.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::canonical_query;
///
/// let pairs = [
///     ("ts".to_string(), "1700000000".to_string()),
///     ("nonce".to_string(), "n0nceXYZ".to_string()),
///     ("sig".to_string(), "deadbeef".to_string()),
/// ];
/// assert_eq!(canonical_query(&pairs), "nonce=n0nceXYZ&ts=1700000000");
/// ```
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    let mut entries: Vec<(&str, &str)> = pairs
        .iter()
        .filter(|(k, _)| k != SIG_KEY)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    entries.sort();

    let mut out = String::new();
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.extend(utf8_percent_encode(key, CANONICAL_ENCODE_SET));
        out.push('=');
        out.extend(utf8_percent_encode(value, CANONICAL_ENCODE_SET));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sorted_by_key() {
        let input = pairs(&[("ts", "1700000000"), ("src", "mail"), ("nonce", "abc")]);
        assert_eq!(
            canonical_query(&input),
            "nonce=abc&src=mail&ts=1700000000"
        );
    }

    #[test]
    fn test_permutation_invariance() {
        let a = pairs(&[("ts", "1"), ("nonce", "n"), ("src", "s")]);
        let b = pairs(&[("src", "s"), ("ts", "1"), ("nonce", "n")]);
        let c = pairs(&[("nonce", "n"), ("src", "s"), ("ts", "1")]);

        let expected = canonical_query(&a);
        assert_eq!(canonical_query(&b), expected);
        assert_eq!(canonical_query(&c), expected);
    }

    #[test]
    fn test_sig_always_excluded() {
        let with_sig = pairs(&[("ts", "1"), ("sig", "deadbeef"), ("nonce", "n")]);
        let without = pairs(&[("ts", "1"), ("nonce", "n")]);
        assert_eq!(canonical_query(&with_sig), canonical_query(&without));
    }

    #[test]
    fn test_duplicate_keys_retained_sorted_by_value() {
        let input = pairs(&[("k", "zz"), ("k", "aa"), ("a", "1")]);
        assert_eq!(canonical_query(&input), "a=1&k=aa&k=zz");
    }

    #[test]
    fn test_percent_encoding() {
        let input = pairs(&[("src", "a b&c=d")]);
        assert_eq!(canonical_query(&input), "src=a%20b%26c%3Dd");
    }

    #[test]
    fn test_unreserved_characters_untouched() {
        let input = pairs(&[("k", "Az09-_.~")]);
        assert_eq!(canonical_query(&input), "k=Az09-_.~");
    }

    #[test]
    fn test_utf8_encoded_bytewise() {
        let input = pairs(&[("src", "日本")]);
        assert_eq!(canonical_query(&input), "src=%E6%97%A5%E6%9C%AC");
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(canonical_query(&[]), "");
        let only_sig = pairs(&[("sig", "deadbeef")]);
        assert_eq!(canonical_query(&only_sig), "");
    }
}
