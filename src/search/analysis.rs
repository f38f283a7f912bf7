//! Term analysis and pattern matching for the in-memory index.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static TOKEN_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("token split regex"));

/// Split text into lowercased alphanumeric terms, the way a standard text
/// analyzer does.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_SPLIT
        .split(text)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Compile a wildcard pattern (`*` any run, `?` one character) into an
/// anchored regex.
pub fn wildcard_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    translate(pattern, '*', '?', case_insensitive)
}

/// Compile a SQL `LIKE` pattern (`%` any run, `_` one character) into an
/// anchored, case-sensitive regex.
pub fn like_regex(pattern: &str) -> Result<Regex, regex::Error> {
    translate(pattern, '%', '_', false)
}

fn translate(
    pattern: &str,
    any_run: char,
    any_one: char,
    case_insensitive: bool,
) -> Result<Regex, regex::Error> {
    let mut regex_pattern = String::with_capacity(pattern.len() + 8);
    regex_pattern.push('^');

    let mut literal = [0u8; 4];
    for ch in pattern.chars() {
        if ch == any_run {
            regex_pattern.push_str(".*");
        } else if ch == any_one {
            regex_pattern.push('.');
        } else {
            regex_pattern.push_str(&regex::escape(ch.encode_utf8(&mut literal)));
        }
    }

    regex_pattern.push('$');

    RegexBuilder::new(&regex_pattern)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
}

/// Edit distance counting insertions, deletions, substitutions and adjacent
/// transpositions (optimal string alignment).
pub fn edit_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut matrix: Vec<Vec<usize>> = vec![vec![0; b.len() + 1]; a.len() + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            let mut best = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(matrix[i - 2][j - 2] + 1);
            }
            matrix[i][j] = best;
        }
    }

    matrix[a.len()][b.len()]
}
