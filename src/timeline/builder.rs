//! Turns parsed tokens (or transcript segments) into a [`Timeline`].

use crate::foundation::error::{KineError, KineResult};
use crate::markup::script::parse_script;
use crate::markup::token::StyledToken;
use crate::timeline::drift::time_scale;
use crate::timeline::model::{PageLookup, TimedWord, Timeline, TimelinePage, TranscriptSegment};

/// Scripts longer than this are paged even without audio.
pub const AMBIENT_MAX_WORDS: usize = 40;
/// Words per page in paged mode.
pub const WORDS_PER_PAGE: usize = 5;
/// Fraction of a page's budget over which its words are spread.
pub const PAGE_SPREAD_FRACTION: f64 = 0.9;
/// Base gap between consecutive words in ambient mode.
pub const BASE_WORD_DELAY_MS: f64 = 300.0;
/// Entrance transition length shared with the frame renderer.
pub const FADE_DURATION_MS: f64 = 500.0;
/// Tail after the last segment in timestamped mode.
pub const TIMESTAMPED_TAIL_MS: f64 = 1000.0;
/// Hold after the last ambient word settles.
pub const PREVIEW_HOLD_MS: f64 = 2000.0;
pub const EXPORT_HOLD_MS: f64 = 5000.0;

const SENTENCE_END_MULTIPLIER: f64 = 2.5;
const CLAUSE_MULTIPLIER: f64 = 1.8;

/// Scheduling strategy, chosen once per session.
#[derive(Clone, Debug, PartialEq)]
pub enum TimelineMode {
    /// Word timing comes from transcript segments.
    Timestamped {
        segments: Vec<TranscriptSegment>,
        audio_ms: Option<f64>,
    },
    /// Fixed-size word groups sharing the total duration equally.
    Paged { audio_ms: Option<f64> },
    /// Single page paced by punctuation.
    Ambient { hold_ms: f64 },
}

impl TimelineMode {
    /// Pick the mode for a session.
    ///
    /// Segments are only honored for exports; audio or a long script selects paging; everything
    /// else is ambient.
    pub fn select(
        segments: &[TranscriptSegment],
        word_count: usize,
        audio_ms: Option<f64>,
        preview: bool,
    ) -> Self {
        if !segments.is_empty() && !preview {
            return Self::Timestamped {
                segments: segments.to_vec(),
                audio_ms,
            };
        }
        if audio_ms.is_some() || word_count > AMBIENT_MAX_WORDS {
            return Self::Paged { audio_ms };
        }
        Self::Ambient {
            hold_ms: if preview {
                PREVIEW_HOLD_MS
            } else {
                EXPORT_HOLD_MS
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Timestamped { .. } => "timestamped",
            Self::Paged { .. } => "paged",
            Self::Ambient { .. } => "ambient",
        }
    }
}

/// Build the timeline for `tokens` under `mode`.
///
/// An empty token list is an input error. In timestamped mode the words come from the segment
/// texts.
#[tracing::instrument(skip(tokens, mode), fields(mode = mode.name(), words = tokens.len()))]
pub fn build_timeline(
    tokens: &[StyledToken],
    mode: &TimelineMode,
    looping: bool,
) -> KineResult<Timeline> {
    if tokens.is_empty() {
        return Err(KineError::input("script is empty"));
    }
    let timeline = match mode {
        TimelineMode::Timestamped { segments, audio_ms } => {
            build_timestamped(segments, *audio_ms, looping)
        }
        TimelineMode::Paged { audio_ms } => build_paged(tokens, *audio_ms, looping),
        TimelineMode::Ambient { hold_ms } => build_ambient(tokens, *hold_ms, looping),
    };
    tracing::debug!(
        pages = timeline.pages.len(),
        total_ms = timeline.total_ms,
        "timeline built"
    );
    Ok(timeline)
}

fn build_timestamped(
    segments: &[TranscriptSegment],
    audio_ms: Option<f64>,
    looping: bool,
) -> Timeline {
    let last_end_sec = segments.iter().map(|s| s.end).fold(0.0, f64::max);
    let scale = time_scale(last_end_sec, audio_ms.map(|ms| ms / 1000.0));

    let pages = segments
        .iter()
        .map(|seg| {
            let start_ms = seg.start * scale * 1000.0;
            let end_ms = (seg.end * scale * 1000.0).max(start_ms);
            let tokens = parse_script(&seg.text);
            let word_ms = if tokens.is_empty() {
                0.0
            } else {
                (end_ms - start_ms) / tokens.len() as f64
            };
            let words = tokens
                .into_iter()
                .enumerate()
                .map(|(i, token)| TimedWord {
                    token,
                    absolute_start_ms: start_ms + i as f64 * word_ms,
                    active_duration_ms: word_ms,
                })
                .collect();
            TimelinePage {
                words,
                start_ms,
                end_ms,
            }
        })
        .collect::<Vec<_>>();

    let last_end_ms = last_end_sec * scale * 1000.0;
    let total_ms = (last_end_ms + TIMESTAMPED_TAIL_MS).max(audio_ms.unwrap_or(0.0));
    Timeline {
        pages,
        total_ms,
        looping,
        lookup: PageLookup::Intervals,
    }
}

fn build_paged(tokens: &[StyledToken], audio_ms: Option<f64>, looping: bool) -> Timeline {
    let total_ms = audio_ms
        .filter(|ms| *ms > 0.0)
        .unwrap_or_else(|| (tokens.len() as f64 * 500.0).max(5000.0));
    let page_count = tokens.len().div_ceil(WORDS_PER_PAGE);
    let page_ms = total_ms / page_count as f64;

    let pages = tokens
        .chunks(WORDS_PER_PAGE)
        .enumerate()
        .map(|(p, chunk)| {
            let start_ms = p as f64 * page_ms;
            let spacing = page_ms * PAGE_SPREAD_FRACTION / chunk.len() as f64;
            let words = chunk
                .iter()
                .enumerate()
                .map(|(i, token)| TimedWord {
                    token: token.clone(),
                    absolute_start_ms: start_ms + i as f64 * spacing,
                    active_duration_ms: spacing,
                })
                .collect();
            TimelinePage {
                words,
                start_ms,
                end_ms: start_ms + page_ms,
            }
        })
        .collect();

    Timeline {
        pages,
        total_ms,
        looping,
        lookup: PageLookup::Uniform { page_ms },
    }
}

fn build_ambient(tokens: &[StyledToken], hold_ms: f64, looping: bool) -> Timeline {
    let mut words = Vec::with_capacity(tokens.len());
    let mut t = 0.0;
    for token in tokens {
        let delay = word_delay_ms(&token.clean_text);
        words.push(TimedWord {
            token: token.clone(),
            absolute_start_ms: t,
            active_duration_ms: delay,
        });
        t += delay;
    }
    let last_start = words.last().map_or(0.0, |w| w.absolute_start_ms);
    let total_ms = last_start + FADE_DURATION_MS + hold_ms;

    Timeline {
        pages: vec![TimelinePage {
            words,
            start_ms: 0.0,
            end_ms: total_ms,
        }],
        total_ms,
        looping,
        lookup: PageLookup::Single,
    }
}

/// Pause that follows `word`, from its trailing punctuation.
///
/// Closing quotes and brackets after the punctuation are ignored.
pub fn word_delay_ms(word: &str) -> f64 {
    let trimmed = word.trim_end_matches(['"', '\'', ')', ']', '}', '\u{201D}', '\u{2019}', '\u{00BB}']);
    match trimmed.chars().last() {
        Some('.' | '!' | '?') => BASE_WORD_DELAY_MS * SENTENCE_END_MULTIPLIER,
        Some(',') => BASE_WORD_DELAY_MS * CLAUSE_MULTIPLIER,
        _ => BASE_WORD_DELAY_MS,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;
