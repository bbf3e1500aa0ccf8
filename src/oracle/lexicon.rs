//! Lexicon-based positivity scoring.
//!
//! A deliberately cheap, whole-document analyzer: the positivity of a text
//! is the proportion of its tokens that match a small valence lexicon,
//! with single-token negation flipping polarity ("not good" counts as
//! negative). This is a lightweight stand-in for a full valence lexicon
//! and is orders of magnitude cheaper than the windowed classifier, which
//! is why it runs once per document rather than once per window.

use ahash::AHashSet;

const POSITIVE_WORDS: &[&str] = &[
    "admire", "adore", "amazing", "awesome", "beautiful", "best", "better", "bliss", "brilliant",
    "calm", "cheerful", "comfort", "delight", "eager", "easy", "enjoy", "excellent", "excited",
    "fantastic", "fond", "fun", "genius", "gentle", "glad", "good", "grateful", "great", "happy",
    "hope", "joy", "kind", "laugh", "like", "love", "lovely", "nice", "peace", "perfect",
    "pleasant", "pleased", "pretty", "proud", "relief", "safe", "smile", "sweet", "thank",
    "trust", "warm", "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "afraid", "angry", "annoyed", "anxious", "awful", "bad", "bitter", "broken", "cruel", "cry",
    "danger", "dark", "dead", "death", "despair", "dread", "evil", "fail", "fear", "fight",
    "grief", "hate", "horrible", "hurt", "kill", "lonely", "lost", "mad", "miserable", "pain",
    "panic", "poor", "rage", "sad", "scared", "shame", "sick", "sorrow", "terrible", "terror",
    "tired", "ugly", "upset", "weak", "worse", "worst", "worry", "wrong",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nor", "cannot", "n't", "dont", "don't", "didnt",
    "didn't", "isnt", "isn't", "wasnt", "wasn't", "wont", "won't",
];

/// Whole-document positivity analyzer.
#[derive(Debug, Clone)]
pub struct PositivityLexicon {
    positive: AHashSet<&'static str>,
    negative: AHashSet<&'static str>,
    negations: AHashSet<&'static str>,
}

impl Default for PositivityLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl PositivityLexicon {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
        }
    }

    /// Positivity of `text` in `[0, 1]`: the fraction of tokens carrying
    /// positive valence after negation flips. Empty text scores 0.
    pub fn score(&self, text: &str) -> f64 {
        let mut total = 0usize;
        let mut positive_hits = 0usize;
        let mut negated = false;

        for raw in text.split_whitespace() {
            let token: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
                .to_lowercase();
            if token.is_empty() {
                continue;
            }
            total += 1;

            if self.negations.contains(token.as_str()) {
                negated = true;
                continue;
            }

            let polarity = if self.positive.contains(token.as_str()) {
                Some(true)
            } else if self.negative.contains(token.as_str()) {
                Some(false)
            } else {
                None
            };
            if let Some(is_positive) = polarity {
                if is_positive != negated {
                    positive_hits += 1;
                }
            }
            negated = false;
        }

        if total == 0 {
            return 0.0;
        }
        positive_hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_scores_zero() {
        let lexicon = PositivityLexicon::new();
        assert_eq!(lexicon.score(""), 0.0);
        assert_eq!(lexicon.score("   "), 0.0);
    }

    #[test]
    fn test_positive_text_scores_above_neutral() {
        let lexicon = PositivityLexicon::new();
        let positive = lexicon.score("what a wonderful happy lovely day");
        let neutral = lexicon.score("the chair stood beside the table");
        assert!(positive > neutral);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let lexicon = PositivityLexicon::new();
        assert!(lexicon.score("good") > 0.0);
        assert_eq!(lexicon.score("not good"), 0.0);
        // A negated negative counts as positive.
        assert!(lexicon.score("not bad") > 0.0);
    }

    #[test]
    fn test_score_bounded() {
        let lexicon = PositivityLexicon::new();
        for text in ["love love love", "hate hate", "love hate not maybe"] {
            let s = lexicon.score(text);
            assert!((0.0..=1.0).contains(&s), "{text} scored {s}");
        }
    }
}
