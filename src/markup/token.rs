//! Word-level markup parsing.
//!
//! A word candidate may carry an emphasis marker (`*word*`) and any number of inline style
//! directives of the form `[literal](spec)`, where `spec` is a `|`-separated list of effect names
//! and color values.

/// Marker wrapping an emphasized word.
pub const EMPHASIS_MARKER: char = '*';

/// Per-character effect attached to a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Small positional jitter every frame.
    Wiggle,
    /// Occasional horizontal jump with partial transparency.
    Glitch,
    /// Traveling sinusoidal scale pulse.
    Pulse,
}

impl Effect {
    /// Recognize an effect name (trimmed, case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wiggle" => Some(Self::Wiggle),
            "glitch" => Some(Self::Glitch),
            "pulse" => Some(Self::Pulse),
            _ => None,
        }
    }
}

/// A run of characters sharing the same style overrides.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    /// Literal span text.
    pub text: String,
    /// Raw color value from a directive (`"red"`, `"#ff0044"`, ...).
    pub color: Option<String>,
    /// Effect override from a directive.
    pub effect: Option<Effect>,
}

impl Span {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            color: None,
            effect: None,
        }
    }
}

/// A single parsed word unit.
///
/// Invariant: concatenating `spans[i].text` in order reproduces `clean_text` exactly.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StyledToken {
    /// Word text with all markup removed.
    pub clean_text: String,
    /// Whether the word was wrapped in emphasis markers.
    pub is_highlight: bool,
    /// Ordered styled runs partitioning `clean_text`.
    pub spans: Vec<Span>,
}

impl StyledToken {
    /// Return `true` when any span carries a per-character effect.
    pub fn has_effects(&self) -> bool {
        self.spans.iter().any(|s| s.effect.is_some())
    }
}

/// Parse one whitespace-delimited word candidate.
pub fn parse_token(raw: &str) -> StyledToken {
    let (body, is_highlight) = strip_emphasis(raw);
    let spans = parse_spans(&body);
    let clean_text = spans.iter().map(|s| s.text.as_str()).collect::<String>();
    StyledToken {
        clean_text,
        is_highlight,
        spans,
    }
}

/// Strip a leading and trailing emphasis marker when both are present.
///
/// Punctuation outside the markers (`*busy*;`, `(*now*)`) stays attached to the word.
fn strip_emphasis(raw: &str) -> (String, bool) {
    let is_edge = |c: char| !c.is_alphanumeric() && c != EMPHASIS_MARKER;
    let core_start = raw.find(|c: char| !is_edge(c)).unwrap_or(raw.len());
    let core_end = raw
        .rfind(|c: char| !is_edge(c))
        .map(|i| i + raw[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(core_start);
    if core_end <= core_start {
        return (raw.to_owned(), false);
    }

    let core = &raw[core_start..core_end];
    let marker_len = EMPHASIS_MARKER.len_utf8();
    if core.len() >= 2 * marker_len + 1
        && core.starts_with(EMPHASIS_MARKER)
        && core.ends_with(EMPHASIS_MARKER)
    {
        let inner = &core[marker_len..core.len() - marker_len];
        let mut out = String::with_capacity(raw.len());
        out.push_str(&raw[..core_start]);
        out.push_str(inner);
        out.push_str(&raw[core_end..]);
        return (out, true);
    }
    (raw.to_owned(), false)
}

struct Directive<'a> {
    start: usize,
    end: usize,
    literal: &'a str,
    spec: &'a str,
}

/// Find the leftmost `[literal](spec)` starting at or after `from`.
///
/// Matches the shortest `literal` whose closing `]` is directly followed by `(` and a later `)`.
fn find_directive(s: &str, from: usize) -> Option<Directive<'_>> {
    let mut open = from;
    while let Some(rel) = s[open..].find('[') {
        let lb = open + rel;
        let mut search = lb + 1;
        while let Some(rel_rb) = s[search..].find(']') {
            let rb = search + rel_rb;
            if s[rb + 1..].starts_with('(')
                && let Some(rel_rp) = s[rb + 2..].find(')')
            {
                let rp = rb + 2 + rel_rp;
                return Some(Directive {
                    start: lb,
                    end: rp + 1,
                    literal: &s[lb + 1..rb],
                    spec: &s[rb + 2..rp],
                });
            }
            search = rb + 1;
        }
        open = lb + 1;
    }
    None
}

fn parse_spans(body: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0usize;
    while let Some(d) = find_directive(body, cursor) {
        if d.start > cursor {
            spans.push(Span::plain(&body[cursor..d.start]));
        }
        if !d.literal.is_empty() {
            let (color, effect) = parse_style_spec(d.spec);
            spans.push(Span {
                text: d.literal.to_owned(),
                color,
                effect,
            });
        }
        cursor = d.end;
    }
    if cursor < body.len() || spans.is_empty() {
        spans.push(Span::plain(&body[cursor..]));
    }
    spans
}

fn parse_style_spec(spec: &str) -> (Option<String>, Option<Effect>) {
    let mut color = None;
    let mut effect = None;
    for item in spec.split('|').map(str::trim).filter(|s| !s.is_empty()) {
        match Effect::from_name(item) {
            Some(e) => effect = Some(e),
            None => color = Some(item.to_owned()),
        }
    }
    (color, effect)
}

#[cfg(test)]
#[path = "../../tests/unit/markup/token.rs"]
mod tests;
