//! Fuzzy string matching: Levenshtein distance and kebab-case checks.

/// Closest candidate by case-insensitive edit distance, or `None` when even
/// the closest one differs in more than half of its characters.
pub(crate) fn fuzzy_match<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input = input.to_lowercase();
    let (best, dist) = candidates
        .iter()
        .map(|&c| (c, levenshtein(&input, &c.to_lowercase())))
        .min_by_key(|&(_, dist)| dist)?;
    (dist <= input.len().max(best.len()) / 2).then_some(best)
}

/// Levenshtein edit distance between two strings.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}
