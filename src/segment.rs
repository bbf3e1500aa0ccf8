//! Window segmentation.
//!
//! Converts one document's text into a fixed number of evenly spaced,
//! possibly overlapping word windows. Long documents are truncated from
//! the start at a hard word cap before windowing, so a pathological input
//! can never blow up scoring cost.

/// Configuration for [`WindowSegmenter`].
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Words per window.
    pub window_size: usize,
    /// Number of windows emitted for documents longer than one window.
    pub window_count: usize,
    /// Hard cap on total words considered; anything beyond is dropped.
    pub word_cap: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            window_size: 500,
            window_count: 100,
            word_cap: 50_000,
        }
    }
}

/// Stateless segmenter producing word windows from raw text.
#[derive(Debug, Clone, Default)]
pub struct WindowSegmenter {
    config: SegmenterConfig,
}

impl WindowSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment `text` into windows, in increasing start order.
    ///
    /// Words are split on whitespace and capped at `word_cap`. Empty text
    /// yields no windows; text of at most `window_size` words yields one
    /// window holding the whole capped text; anything longer yields
    /// exactly `window_count` windows at evenly spaced offsets, where the
    /// spacing `(total - (window_size + 1)) / window_count` stays
    /// real-valued so the windows cover the full document without
    /// accumulated rounding drift.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let mut words: Vec<&str> = text.split_whitespace().collect();
        words.truncate(self.config.word_cap);
        let total_words = words.len();

        if total_words == 0 {
            return Vec::new();
        }
        if total_words <= self.config.window_size {
            return vec![words.join(" ")];
        }

        let step =
            (total_words - (self.config.window_size + 1)) as f64 / self.config.window_count as f64;

        let mut windows = Vec::with_capacity(self.config.window_count);
        for perc in 1..=self.config.window_count {
            let start = (step * (perc - 1) as f64) as usize;
            let end = usize::min(start + self.config.window_size, total_words);
            windows.push(words[start..end].join(" "));
        }
        windows
    }
}
