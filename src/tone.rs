//! Lightweight emotional tone classification
//!
//! Counts how many words of three fixed vocabularies appear in the text
//! (case-insensitive substring test, each word counted once).

use crate::types::EmotionalTone;

#[rustfmt::skip]
const POSITIVE_WORDS: &[&str] = &[
    "feliz", "grato", "amor", "paz", "alegria", "happy", "grateful", "love", "peace", "joy",
];

#[rustfmt::skip]
const NEGATIVE_WORDS: &[&str] = &[
    "triste", "ansioso", "deprimido", "sad", "anxious", "depressed", "worried",
];

#[rustfmt::skip]
const TOXIC_WORDS: &[&str] = &[
    "inveja", "ódio", "raiva", "hate", "envy", "anger", "jealous",
];

/// Tone classifier over fixed word lists
pub struct ToneClassifier;

impl ToneClassifier {
    /// Classify a text.
    ///
    /// Precedence: any toxic-affect word wins, then negative over positive,
    /// then positive, else neutral.
    pub fn classify(text: &str) -> EmotionalTone {
        let lower = text.to_lowercase();
        Self::classify_lowercase(&lower)
    }

    /// Classify text that is already lowercased
    pub fn classify_lowercase(lower: &str) -> EmotionalTone {
        let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();

        if count(TOXIC_WORDS) > 0 {
            return EmotionalTone::Toxic;
        }

        let positive = count(POSITIVE_WORDS);
        let negative = count(NEGATIVE_WORDS);

        if negative > positive {
            EmotionalTone::Negative
        } else if positive > 0 {
            EmotionalTone::Positive
        } else {
            EmotionalTone::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral() {
        assert_eq!(ToneClassifier::classify(""), EmotionalTone::Neutral);
        assert_eq!(ToneClassifier::classify("the bus is late"), EmotionalTone::Neutral);
    }

    #[test]
    fn test_positive() {
        assert_eq!(ToneClassifier::classify("Tão FELIZ hoje"), EmotionalTone::Positive);
    }

    #[test]
    fn test_negative_beats_positive_only_when_greater() {
        assert_eq!(
            ToneClassifier::classify("sad and worried but happy"),
            EmotionalTone::Negative
        );
        assert_eq!(ToneClassifier::classify("sad but happy"), EmotionalTone::Positive);
    }

    #[test]
    fn test_toxic_takes_precedence() {
        assert_eq!(
            ToneClassifier::classify("happy happy joy love, a bit of envy"),
            EmotionalTone::Toxic
        );
        assert_eq!(ToneClassifier::classify("que ÓDIO"), EmotionalTone::Toxic);
    }
}
