//! Deterministic renaming for store-wide-unique values.
//!
//! Applies to the uniqueness constraints not already covered by UUID
//! identity: group labels and computer names. A colliding value gets a
//! numeric suffix; the candidate bound is a correctness ceiling against
//! pathological inputs, not a tunable.

use crate::error::{ImportError, ImportResult};
use provgraph_store::StoreError;
use std::collections::HashSet;
use tracing::debug;

/// Candidates tried per value: the original plus `_1` through `_99`.
pub const MAX_UNIQUENESS_CANDIDATES: u32 = 100;

/// Resolves `original` to a value unique in both the store and the
/// current import batch, claiming the result.
///
/// `taken_in_store` probes the store (within the import transaction, so
/// it sees rows flushed earlier in the same import). `claims` tracks
/// values already assigned in this batch, including suffixed ones, so
/// two colliding archive records never receive the same resolution.
pub fn resolve_unique<F>(
    original: &str,
    claims: &mut HashSet<String>,
    mut taken_in_store: F,
) -> ImportResult<String>
where
    F: FnMut(&str) -> Result<bool, StoreError>,
{
    let mut candidate = original.to_string();
    let mut counter = 0u32;
    loop {
        if !claims.contains(&candidate) && !taken_in_store(&candidate)? {
            if counter > 0 {
                debug!("renamed '{original}' to '{candidate}' to keep it unique");
            }
            claims.insert(candidate.clone());
            return Ok(candidate);
        }
        counter += 1;
        if counter == MAX_UNIQUENESS_CANDIDATES {
            return Err(ImportError::UniquenessExhausted {
                value: original.to_string(),
                attempts: MAX_UNIQUENESS_CANDIDATES,
            });
        }
        candidate = format!("{original}_{counter}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untaken_value_is_kept() {
        let mut claims = HashSet::new();
        let got = resolve_unique("alpha", &mut claims, |_| Ok(false)).unwrap();
        assert_eq!(got, "alpha");
        assert!(claims.contains("alpha"));
    }

    #[test]
    fn store_collision_appends_counter() {
        let mut claims = HashSet::new();
        let got = resolve_unique("alpha", &mut claims, |v| Ok(v == "alpha")).unwrap();
        assert_eq!(got, "alpha_1");
    }

    #[test]
    fn batch_claims_also_collide() {
        let mut claims = HashSet::new();
        resolve_unique("alpha", &mut claims, |_| Ok(false)).unwrap();
        let second = resolve_unique("alpha", &mut claims, |_| Ok(false)).unwrap();
        assert_eq!(second, "alpha_1");
        let third = resolve_unique("alpha", &mut claims, |_| Ok(false)).unwrap();
        assert_eq!(third, "alpha_2");
    }

    #[test]
    fn exhaustion_after_one_hundred_candidates() {
        let mut claims = HashSet::new();
        let err = resolve_unique("alpha", &mut claims, |_| Ok(true)).unwrap_err();
        match err {
            ImportError::UniquenessExhausted { value, attempts } => {
                assert_eq!(value, "alpha");
                assert_eq!(attempts, 100);
            }
            other => panic!("expected UniquenessExhausted, got {other:?}"),
        }
    }

    #[test]
    fn ninety_nine_collisions_still_succeed() {
        // Taken: the original and _1 .. _98; _99 is the last candidate.
        let mut claims = HashSet::new();
        let got = resolve_unique("batch", &mut claims, |v| {
            Ok(v == "batch"
                || v.strip_prefix("batch_")
                    .and_then(|n| n.parse::<u32>().ok())
                    .is_some_and(|n| n <= 98))
        })
        .unwrap();
        assert_eq!(got, "batch_99");
    }
}
