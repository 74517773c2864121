use crate::markup::token::StyledToken;

/// One transcript segment, in seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// A token scheduled on the render clock.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TimedWord {
    pub token: StyledToken,
    /// Milliseconds from clock zero at which the word starts appearing.
    pub absolute_start_ms: f64,
    /// How long the word counts as "being spoken"; may be zero.
    pub active_duration_ms: f64,
}

impl TimedWord {
    /// `true` for `elapsed_ms` in `[start, start + active_duration)`.
    pub fn is_active_at(&self, elapsed_ms: f64) -> bool {
        let local = elapsed_ms - self.absolute_start_ms;
        local >= 0.0 && local < self.active_duration_ms
    }
}

/// A group of words shown together.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TimelinePage {
    pub words: Vec<TimedWord>,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// How the active page is derived from elapsed time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PageLookup {
    /// Timestamped pages with possible gaps.
    Intervals,
    /// Equal-length pages.
    Uniform { page_ms: f64 },
    /// Exactly one page.
    Single,
}

/// Output of the timeline builder. Immutable once built.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Timeline {
    pub pages: Vec<TimelinePage>,
    pub total_ms: f64,
    /// Preview timelines wrap `elapsed mod total` instead of ending.
    pub looping: bool,
    pub lookup: PageLookup,
}

impl Timeline {
    /// Map a raw clock reading onto the timeline (wrapping when looping).
    pub fn local_elapsed(&self, elapsed_ms: f64) -> f64 {
        let e = elapsed_ms.max(0.0);
        if self.looping && self.total_ms > 0.0 {
            e % self.total_ms
        } else {
            e
        }
    }

    /// `true` once a non-looping timeline has run to its end.
    pub fn is_finished(&self, elapsed_ms: f64) -> bool {
        !self.looping && elapsed_ms >= self.total_ms
    }

    /// Index of the page shown at `elapsed_ms` (already mapped by [`Self::local_elapsed`]).
    ///
    /// Returns `None` only for a timeline without pages.
    pub fn page_index_at(&self, elapsed_ms: f64) -> Option<usize> {
        let last = self.pages.len().checked_sub(1)?;
        let idx = match self.lookup {
            PageLookup::Single => 0,
            PageLookup::Uniform { page_ms } => {
                if page_ms <= 0.0 {
                    0
                } else {
                    ((elapsed_ms / page_ms).floor().max(0.0) as usize).min(last)
                }
            }
            PageLookup::Intervals => self.interval_index_at(elapsed_ms, last),
        };
        Some(idx)
    }

    fn interval_index_at(&self, t: f64, last: usize) -> usize {
        if let Some(i) = self
            .pages
            .iter()
            .position(|p| t >= p.start_ms && t < p.end_ms)
        {
            return i;
        }
        if t < self.pages[0].start_ms {
            return 0;
        }
        if t >= self.pages[last].end_ms {
            return last;
        }
        // Gap between pages: the latest page that already ended.
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.end_ms <= t)
            .max_by(|(_, a), (_, b)| a.end_ms.total_cmp(&b.end_ms))
            .map_or(0, |(i, _)| i)
    }

    /// Page shown at `elapsed_ms`.
    pub fn page_at(&self, elapsed_ms: f64) -> Option<&TimelinePage> {
        self.page_index_at(elapsed_ms).map(|i| &self.pages[i])
    }

    /// Number of words across all pages.
    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|p| p.words.len()).sum()
    }
}
