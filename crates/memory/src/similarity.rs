//! Lexical similarity between item texts.
//!
//! [`ratio`] is the Ratcliff/Obershelp measure `2·M / T`, where `M` is the
//! number of characters in recursively found longest common substrings and
//! `T` the combined length. It is a lexical approximation only; two texts
//! with the same meaning but different wording score low.

/// Similarity of two strings in `[0.0, 1.0]`. Two empty strings score 1.0.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Similarity of the first `prefix` characters of each string.
pub fn leading_ratio(a: &str, b: &str, prefix: usize) -> f64 {
    let a: String = a.chars().take(prefix).collect();
    let b: String = b.chars().take(prefix).collect();
    ratio(&a, &b)
}

/// Lowercased alphanumeric words of a text.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common substring of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(i, j, k)` with `a[i..i+k] == b[j..j+k]`; the earliest such block
/// wins ties.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    let width = bhi - blo + 1;
    let mut prev = vec![0usize; width];
    let mut cur = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let idx = j - blo + 1;
            if a[i] == b[j] {
                cur[idx] = prev[idx - 1] + 1;
                if cur[idx] > best_k {
                    best_k = cur[idx];
                    best_i = i + 1 - best_k;
                    best_j = j + 1 - best_k;
                }
            } else {
                cur[idx] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (best_i, best_j, best_k)
}
