//! Levenshtein edit distance over Unicode scalar values

/// Classic edit distance with unit-cost insert, delete and substitute
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rows over the shorter string
    let (long, short) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let substitution = previous[j] + usize::from(lc != sc);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

/// Normalized inverse edit distance in `[0, 1]`
///
/// Both empty gives 1.0, exactly one empty gives 0.0.
#[must_use]
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    match (len_a, len_b) {
        (0, 0) => return 1.0,
        (0, _) | (_, 0) => return 0.0,
        _ => {}
    }

    let distance = levenshtein(a, b) as f64;
    let longest = len_a.max(len_b) as f64;
    (1.0 - distance / longest).clamp(0.0, 1.0)
}
