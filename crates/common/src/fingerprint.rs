use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Stable fingerprint of a label set: SHA-256 over the length-prefixed
/// `(key, value)` pairs sorted by key, truncated to 16 hex chars.
///
/// The same label set always hashes to the same string regardless of
/// insertion order, process restarts, or host architecture. Buffer keys and
/// snapshot files depend on this staying put.
pub fn label_set_fingerprint(labels: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = labels.iter().collect();
    pairs.sort_by_key(|(k, _)| k.as_str());

    let mut hasher = Sha256::new();
    for (k, v) in pairs {
        hash_str(&mut hasher, k);
        hash_str(&mut hasher, v);
    }

    use std::fmt::Write;
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for byte in &digest[..8] {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u32).to_le_bytes());
    hasher.update(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn deterministic() {
        let a = label_set_fingerprint(&labels(&[("service", "api"), ("severity", "crit")]));
        let b = label_set_fingerprint(&labels(&[("service", "api"), ("severity", "crit")]));
        assert_eq!(a, b);
    }

    #[test]
    fn permutation_invariant() {
        let a = label_set_fingerprint(&labels(&[("host", "a"), ("region", "eu")]));
        let b = label_set_fingerprint(&labels(&[("region", "eu"), ("host", "a")]));
        assert_eq!(a, b);
    }

    #[test]
    fn different_labels_different_fingerprint() {
        let a = label_set_fingerprint(&labels(&[("service", "api")]));
        let b = label_set_fingerprint(&labels(&[("service", "web")]));
        assert_ne!(a, b);
    }

    #[test]
    fn key_value_boundary_is_unambiguous() {
        let a = label_set_fingerprint(&labels(&[("ab", "c")]));
        let b = label_set_fingerprint(&labels(&[("a", "bc")]));
        assert_ne!(a, b);
    }

    #[test]
    fn string_is_hex() {
        let s = label_set_fingerprint(&labels(&[("service", "api")]));
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_label_set_has_fingerprint() {
        let s = label_set_fingerprint(&HashMap::new());
        assert_eq!(s.len(), 16);
    }
}
