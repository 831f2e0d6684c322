//! Weighted discrete sampling shared by pack draws and fruit spawns.
//!
//! Candidates are scanned in the exact order the caller supplies them;
//! callers that list identical payloads twice rely on that order, so the
//! scan is never sorted or deduplicated here.
use rand::Rng;

/// Pick one payload from an ordered `(weight, payload)` slice.
///
/// The roll is `uniform[0, total)`; the scan subtracts each weight until
/// the roll lands inside a candidate's span (`roll <= weight`). Entries
/// with non-positive weight are skipped and can never be selected. When
/// every weight is zero the caller-supplied `fallback` is returned; the
/// degenerate table is a documented policy, not an error.
pub fn sample_weighted<'a, T, R: Rng>(
    candidates: &'a [(f64, T)],
    fallback: &'a T,
    rng: &mut R,
) -> &'a T {
    let total: f64 = candidates
        .iter()
        .map(|(weight, _)| weight.max(0.0))
        .sum();
    if total <= 0.0 {
        return fallback;
    }

    let mut remaining = rng.r#gen::<f64>() * total;
    let mut last_positive: Option<&T> = None;
    for (weight, payload) in candidates {
        if *weight <= 0.0 {
            continue;
        }
        if remaining <= *weight {
            return payload;
        }
        remaining -= *weight;
        last_positive = Some(payload);
    }

    // Floating-point fallthrough; the last positive-weight candidate
    // absorbs the residue.
    last_positive.unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashMap;

    #[test]
    fn equal_weights_are_sampled_fairly() {
        let candidates = [(1.0, 'a'), (1.0, 'b'), (1.0, 'c'), (1.0, 'd')];
        let fallback = 'x';
        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);

        let draws = 100_000usize;
        let mut counts: HashMap<char, usize> = HashMap::new();
        for _ in 0..draws {
            let picked = sample_weighted(&candidates, &fallback, &mut rng);
            *counts.entry(*picked).or_default() += 1;
        }

        assert_eq!(counts.get(&'x'), None, "fallback must stay unreachable");
        for payload in ['a', 'b', 'c', 'd'] {
            let share = counts[&payload] as f64 / draws as f64;
            assert!(
                (share - 0.25).abs() < 0.02,
                "payload {payload} drew share {share}"
            );
        }
    }

    #[test]
    fn all_zero_weights_return_fallback() {
        let candidates = [(0.0, 1u32), (0.0, 2u32), (0.0, 3u32)];
        let fallback = 9u32;
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        for _ in 0..64 {
            assert_eq!(*sample_weighted(&candidates, &fallback, &mut rng), 9);
        }
    }

    #[test]
    fn zero_weight_entries_are_never_selected() {
        let candidates = [(0.0, 'z'), (5.0, 'a'), (0.0, 'z'), (5.0, 'b')];
        let fallback = 'f';
        let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
        for _ in 0..10_000 {
            let picked = *sample_weighted(&candidates, &fallback, &mut rng);
            assert!(picked == 'a' || picked == 'b');
        }
    }

    #[test]
    fn empty_candidate_list_returns_fallback() {
        let candidates: [(f64, u8); 0] = [];
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        assert_eq!(*sample_weighted(&candidates, &5u8, &mut rng), 5);
    }

    #[test]
    fn dominant_weight_is_preferred() {
        let candidates = [(1.0, 0u8), (999.0, 1u8)];
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        let mut hits = 0usize;
        for _ in 0..1_000 {
            if *sample_weighted(&candidates, &0u8, &mut rng) == 1 {
                hits += 1;
            }
        }
        assert!(hits > 950, "heavy candidate only drawn {hits} times");
    }
}
