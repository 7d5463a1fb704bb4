//! Best-match suggestion for unknown flags/commands.
//!
//! Iterative levenshtein distance, then "pick the closest candidate,
//! ignore it if nothing is close enough." Operates over a plain list of
//! candidate names since the registry (not a combinator tree) is the
//! source of truth here.

/// Iterative levenshtein distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let mut result = 0;
    let mut cache = a.chars().enumerate().map(|i| i.0 + 1).collect::<Vec<_>>();
    let mut distance_a;
    let mut distance_b;

    for (index_b, code_b) in b.chars().enumerate() {
        result = index_b;
        distance_a = index_b;

        for (index_a, code_a) in a.chars().enumerate() {
            distance_b = if code_a == code_b {
                distance_a
            } else {
                distance_a + 1
            };

            distance_a = cache[index_a];

            result = if distance_a > result {
                if distance_b > result {
                    result + 1
                } else {
                    distance_b
                }
            } else if distance_b > distance_a {
                distance_a + 1
            } else {
                distance_b
            };

            cache[index_a] = result;
        }
    }

    if a.is_empty() {
        b.chars().count()
    } else if b.is_empty() {
        a.chars().count()
    } else {
        result
    }
}

/// Return the closest candidate to `needle`, provided it's within a third of
/// the needle's own length (so `"--verbos"` suggests `"--verbose"` but
/// `"--x"` doesn't suggest an unrelated twelve-character flag).
pub fn best_match<'a>(needle: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let max_distance = (needle.chars().count() / 3).max(1);
    candidates
        .into_iter()
        .map(|c| (levenshtein(needle, c), c))
        .filter(|(d, _)| *d <= max_distance)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_has_zero_distance() {
        assert_eq!(levenshtein("verbose", "verbose"), 0);
    }

    #[test]
    fn suggests_closest_candidate() {
        let candidates = ["verbose", "version", "value"];
        assert_eq!(best_match("verbos", candidates), Some("verbose"));
    }

    #[test]
    fn refuses_to_suggest_when_nothing_is_close() {
        let candidates = ["quiet", "output"];
        assert_eq!(best_match("z", candidates), None);
    }

    #[test]
    fn empty_needle_or_candidate() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }
}
