use crate::foundation::math::unit_hash;
use crate::markup::token::{StyledToken, parse_token};

/// Minimum character count for a word to be picked by the emphasis fallback.
const EMPHASIS_MIN_CHARS: usize = 3;

/// Split a script on whitespace and parse every word candidate.
pub fn parse_script(text: &str) -> Vec<StyledToken> {
    text.split_whitespace().map(parse_token).collect()
}

/// Guarantee at least one emphasized word in a generated script.
///
/// When no token is highlighted, one word with at least three characters is picked uniformly at
/// random (seeded) and marked. Scripts without a qualifying word are returned unchanged.
pub fn ensure_emphasis(mut tokens: Vec<StyledToken>, seed: u64) -> Vec<StyledToken> {
    if tokens.iter().any(|t| t.is_highlight) {
        return tokens;
    }
    let candidates = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.clean_text.chars().count() >= EMPHASIS_MIN_CHARS)
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    if candidates.is_empty() {
        return tokens;
    }

    let r = unit_hash(seed, &[tokens.len() as u64, candidates.len() as u64]);
    let pick = ((r * candidates.len() as f64) as usize).min(candidates.len() - 1);
    let idx = candidates[pick];
    tracing::debug!(word = %tokens[idx].clean_text, "emphasis fallback picked word");
    tokens[idx].is_highlight = true;
    tokens
}

#[cfg(test)]
#[path = "../../tests/unit/markup/script.rs"]
mod tests;
