use std::collections::BTreeMap;

use passk_core::{Candidate, PasskError, Result};

/// Whitespace-insensitive vote key: trailing whitespace stripped per line,
/// blank lines dropped. Absorbs incidental formatting differences between
/// functionally identical completions.
fn vote_key(body: &str) -> String {
    body.trim()
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Select one winner from a pool of candidates for the same task.
///
/// Compiled candidates are preferred when any exist; otherwise the full pool
/// stays in play so a non-compiling task still returns a best-effort answer.
/// Majority vote runs over vote keys, equal-sized groups resolve to the
/// lexicographically smallest key, and within the winning group the shortest
/// body wins (ties keep original pool order).
pub fn reduce(candidates: &[Candidate]) -> Result<Candidate> {
    if candidates.is_empty() {
        return Err(PasskError::EmptyPool);
    }

    let compiled: Vec<&Candidate> = candidates.iter().filter(|c| c.compiled).collect();
    let pool: Vec<&Candidate> = if compiled.is_empty() {
        candidates.iter().collect()
    } else {
        compiled
    };

    let mut buckets: BTreeMap<String, Vec<&Candidate>> = BTreeMap::new();
    for candidate in pool {
        buckets
            .entry(vote_key(candidate.body.as_str()))
            .or_default()
            .push(candidate);
    }

    let (_, winning_group) = buckets
        .iter()
        .max_by(|(key_a, group_a), (key_b, group_b)| {
            group_a
                .len()
                .cmp(&group_b.len())
                .then_with(|| key_b.cmp(key_a))
        })
        .ok_or(PasskError::EmptyPool)?;

    winning_group
        .iter()
        .min_by_key(|c| c.body.as_str().len())
        .map(|c| (**c).clone())
        .ok_or(PasskError::EmptyPool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use passk_core::NormalizedBody;

    fn candidate(body: &str, compiled: bool) -> Candidate {
        Candidate::new(NormalizedBody::new(body.to_string()), body.to_string(), compiled)
    }

    #[test]
    fn empty_pool_is_an_error() {
        assert!(matches!(reduce(&[]), Err(PasskError::EmptyPool)));
    }

    #[test]
    fn compiled_candidates_exclude_the_rest() {
        let pool = [
            candidate("return 1", true),
            candidate("return 1 ", true),
            candidate("return 2", false),
        ];
        let winner = reduce(&pool).unwrap();
        assert!(winner.compiled);
        assert_eq!(winner.body.as_str(), "return 1");
    }

    #[test]
    fn majority_vote_over_normalized_text() {
        let pool = [
            candidate("return a + b", true),
            candidate("return a + b  ", true),
            candidate("return a - b", true),
        ];
        let winner = reduce(&pool).unwrap();
        assert_eq!(winner.body.as_str(), "return a + b");
    }

    #[test]
    fn whitespace_variants_vote_together_and_shortest_wins() {
        let pool = [
            candidate("return x\n\nreturn y", true),
            candidate("return x\nreturn y", true),
        ];
        let winner = reduce(&pool).unwrap();
        assert_eq!(winner.body.as_str(), "return x\nreturn y");
    }

    #[test]
    fn all_failing_pool_still_produces_a_winner() {
        let pool = [
            candidate("retur 1", false),
            candidate("retur 1", false),
            candidate("retur 2", false),
        ];
        let winner = reduce(&pool).unwrap();
        assert!(!winner.compiled);
        assert_eq!(winner.body.as_str(), "retur 1");
    }

    #[test]
    fn size_ties_break_to_lexicographically_smallest_key() {
        let pool = [candidate("return b", true), candidate("return a", true)];
        let winner = reduce(&pool).unwrap();
        assert_eq!(winner.body.as_str(), "return a");
    }

    #[test]
    fn shortest_body_wins_within_the_group() {
        let pool = [
            candidate("return 9  ", true),
            candidate("return 9", true),
            candidate("return 9\t", true),
        ];
        let winner = reduce(&pool).unwrap();
        assert_eq!(winner.body.as_str(), "return 9");
    }
}
