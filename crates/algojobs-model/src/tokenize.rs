//! Word tokenisation and feature hashing.

use std::collections::HashSet;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Lower-cased word tokens. `+` and `#` stay inside tokens so `c++` and `c#`
/// survive; tokens made only of those symbols, and stop words, are dropped.
pub(crate) fn tokenize(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(str::to_lowercase)
        .filter(|t| !stopwords.contains(t))
        .collect()
}

/// FNV-1a over `feature`, keyed by `seed`.
pub(crate) fn hash_feature(feature: &str, seed: u64) -> u64 {
    let mut hash = FNV_OFFSET ^ seed.wrapping_mul(FNV_PRIME);
    for byte in feature.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
