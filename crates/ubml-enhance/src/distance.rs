//! Closest-match suggestions

/// Largest edit distance still treated as a typo of `token`
///
/// 40% of the token length, never below one edit.
pub fn max_distance(token: &str) -> usize {
    (token.chars().count() * 2 / 5).max(1)
}

/// Candidate with the smallest edit distance to `token`
///
/// Comparison ignores case. Ties go to the earliest candidate. Returns `None`
/// when there are no candidates or the best one is still too far away.
pub fn closest_match<I, S>(token: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let needle = token.to_lowercase();
    let limit = max_distance(token);

    candidates
        .into_iter()
        .map(|c| {
            let distance = strsim::levenshtein(&needle, &c.as_ref().to_lowercase());
            (distance, c.as_ref().to_string())
        })
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= limit)
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [&str; 3] = ["action", "milestone", "decision"];

    #[test]
    fn obvious_typo_matches() {
        assert_eq!(closest_match("acton", KINDS), Some("action".to_string()));
        assert_eq!(closest_match("Milestone", KINDS), Some("milestone".to_string()));
    }

    #[test]
    fn unrelated_word_does_not_match() {
        assert_eq!(closest_match("xyz", KINDS), None);
        assert_eq!(closest_match("banana", KINDS), None);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(closest_match("acton", Vec::<String>::new()), None);
        assert_eq!(closest_match("", KINDS), None);
    }

    #[test]
    fn ties_prefer_first_candidate() {
        assert_eq!(closest_match("cat", ["bat", "hat"]), Some("bat".to_string()));
    }

    #[test]
    fn threshold_scales_with_length() {
        assert_eq!(max_distance("ab"), 1);
        assert_eq!(max_distance("acton"), 2);
        assert_eq!(max_distance("responsibility"), 5);
        assert_eq!(closest_match("nam", ["name", "steps"]), Some("name".to_string()));
        assert_eq!(
            closest_match("responsibel", ["responsible"]),
            Some("responsible".to_string())
        );
        assert_eq!(closest_match("owner", ["description"]), None);
    }
}
