//! Contextual analysis
//!
//! Each sub-analysis is a pure function over the raw text that returns an
//! additive [`ContextSignal`]: a score contribution plus zero or more factor
//! descriptions. None of them can force or veto a block on its own; their
//! scores are simply summed into the toxicity total.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AdvancedSettings;
use crate::lexicon::{LexiconCategory, LexiconStore};

/// Emoji occurrences tolerated before density counts
const EMOJI_DENSITY_MIN: usize = 3;
const EMOJI_WEIGHT: u32 = 3;
const HASHTAG_WEIGHT: u32 = 8;
const SUPERIORITY_WEIGHT: u32 = 18;
const HUMBLE_BRAG_WEIGHT: u32 = 15;
const KEYWORD_DENSITY_THRESHOLD: f64 = 0.3;
const KEYWORD_DENSITY_WEIGHT: u32 = 12;
const EXCLUSIVITY_WEIGHT: u32 = 10;
const IMPLICIT_COMPARISON_WEIGHT: u32 = 20;
const FALSE_MODESTY_WEIGHT: u32 = 16;
const SOCIAL_PRESSURE_WEIGHT: u32 = 14;
const MASKED_NEGATIVITY_WEIGHT: u32 = 12;
const ASPIRATIONAL_WEIGHT: u32 = 8;

const EXCLUSIVITY_WORDS: &[&str] = &[
    "exclusivo",
    "vip",
    "premium",
    "elite",
    "first class",
    "luxury",
];

const ASPIRATIONAL_WORDS: &[&str] = &[
    "inspiração",
    "motivação",
    "hustle",
    "grind",
    "mindset",
    "manifestation",
    "abundance",
    "prosperity",
    "wealth mindset",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
}

static SUPERIORITY_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"eu sou.*(melhor|superior|único|especial)",
        r"consegui.*(que ninguém|sozinho|primeiro)",
        r"tenho.*(que vocês|mais que|melhor que)",
    ])
});

static HUMBLE_BRAG_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"não quero me gabar mas",
        r"com toda humildade",
        r"sem querer me exibir",
        r"not to brag but",
        r"humbly speaking",
    ])
});

static IMPLICIT_COMPARISON_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"enquanto vocês.*(eu|eu já)",
        r"diferente de.*(outros|maioria)",
        r"ao contrário de.*(todos|pessoas)",
    ])
});

static FALSE_MODESTY_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"sorte.*(conseguir|ter|ganhar)",
        r"acaso.*(consegui|ganhei)",
        r"por acidente.*(sucesso|conquista)",
    ])
});

static SOCIAL_PRESSURE_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"todo mundo.*(tem|faz|consegue)",
        r"normal.*(ter|fazer|conseguir)",
        r"óbvio que.*(você|qualquer)",
    ])
});

static MASKED_NEGATIVITY_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"feliz mas.*(gostaria|queria|sonho)",
        r"grato mas.*(falta|preciso|quero)",
        r"blessed mas.*(ainda|só|apenas)",
    ])
});

/// Additive score contribution with its factor descriptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSignal {
    pub score: u32,
    pub factors: Vec<String>,
}

impl ContextSignal {
    fn add(&mut self, score: u32, factor: impl Into<String>) {
        self.score += score;
        self.factors.push(factor.into());
    }

    /// Append another signal's score and factors
    pub fn merge(&mut self, other: ContextSignal) {
        self.score += other.score;
        self.factors.extend(other.factors);
    }

    pub fn is_empty(&self) -> bool {
        self.score == 0 && self.factors.is_empty()
    }
}

/// Runs the contextual sub-analyses enabled by the advanced settings
pub struct ContextualAnalyzer;

impl ContextualAnalyzer {
    /// Run every enabled family in order: contextual factors, complex
    /// patterns, semantic content.
    pub fn analyze(
        text: &str,
        lexicon: &LexiconStore,
        settings: &AdvancedSettings,
    ) -> ContextSignal {
        let lower = text.to_lowercase();
        let mut signal = ContextSignal::default();

        if settings.contextual_analysis {
            signal.merge(emoji_density(text, lexicon));
            signal.merge(hashtag_density(&lower, lexicon));
            signal.merge(superiority_language(text));
            signal.merge(humble_brag(text));
            signal.merge(keyword_density_signal(text, lexicon));
            signal.merge(exclusivity_language(&lower));
        }

        if settings.pattern_recognition {
            signal.merge(complex_patterns(text, settings.implicit_comparison_detection));
        }

        if settings.semantic_analysis {
            signal.merge(semantic_content(text, &lower));
        }

        signal
    }
}

/// Count toxic emoji occurrences (every occurrence counts)
pub fn count_toxic_emojis(text: &str, lexicon: &LexiconStore) -> usize {
    lexicon
        .phrases(LexiconCategory::ToxicEmojis)
        .iter()
        .map(|emoji| text.matches(emoji.as_str()).count())
        .sum()
}

/// Count distinct toxic hashtags present in lowercased text
pub fn count_toxic_hashtags(lower: &str, lexicon: &LexiconStore) -> usize {
    lexicon
        .phrases(LexiconCategory::ToxicHashtags)
        .iter()
        .filter(|tag| lower.contains(tag.as_str()))
        .count()
}

pub fn emoji_density(text: &str, lexicon: &LexiconStore) -> ContextSignal {
    let mut signal = ContextSignal::default();
    let count = count_toxic_emojis(text, lexicon);
    if count > EMOJI_DENSITY_MIN {
        signal.add(count as u32 * EMOJI_WEIGHT, format!("{count} ostentation emojis"));
    }
    signal
}

pub fn hashtag_density(lower: &str, lexicon: &LexiconStore) -> ContextSignal {
    let mut signal = ContextSignal::default();
    let count = count_toxic_hashtags(lower, lexicon);
    if count > 0 {
        signal.add(count as u32 * HASHTAG_WEIGHT, format!("{count} toxic hashtags"));
    }
    signal
}

fn pattern_family(text: &str, patterns: &[Regex], weight: u32, factor: &str) -> ContextSignal {
    let mut signal = ContextSignal::default();
    for re in patterns {
        if re.is_match(text) {
            signal.add(weight, factor);
        }
    }
    signal
}

pub fn superiority_language(text: &str) -> ContextSignal {
    pattern_family(text, &SUPERIORITY_RE, SUPERIORITY_WEIGHT, "Superiority language")
}

pub fn humble_brag(text: &str) -> ContextSignal {
    pattern_family(text, &HUMBLE_BRAG_RE, HUMBLE_BRAG_WEIGHT, "Humble bragging detected")
}

/// Share of whitespace-delimited tokens contained in any scoring phrase
pub fn keyword_density(text: &str, lexicon: &LexiconStore) -> f64 {
    let tokens: Vec<String> = text.split_whitespace().map(|w| w.to_lowercase()).collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let matching = tokens
        .iter()
        .filter(|token| lexicon.density_phrases().any(|p| p.contains(token.as_str())))
        .count();

    matching as f64 / tokens.len() as f64
}

pub fn keyword_density_signal(text: &str, lexicon: &LexiconStore) -> ContextSignal {
    let mut signal = ContextSignal::default();
    if keyword_density(text, lexicon) > KEYWORD_DENSITY_THRESHOLD {
        signal.add(KEYWORD_DENSITY_WEIGHT, "High density of toxic keywords");
    }
    signal
}

pub fn exclusivity_language(lower: &str) -> ContextSignal {
    let mut signal = ContextSignal::default();
    for word in EXCLUSIVITY_WORDS {
        if lower.contains(word) {
            signal.add(EXCLUSIVITY_WEIGHT, "Exclusive/elitist language");
        }
    }
    signal
}

/// Implicit comparison, false modesty and social pressure families
pub fn complex_patterns(text: &str, implicit_comparison: bool) -> ContextSignal {
    let mut signal = ContextSignal::default();
    if implicit_comparison {
        signal.merge(pattern_family(
            text,
            &IMPLICIT_COMPARISON_RE,
            IMPLICIT_COMPARISON_WEIGHT,
            "Implicit comparison detected",
        ));
    }
    signal.merge(pattern_family(
        text,
        &FALSE_MODESTY_RE,
        FALSE_MODESTY_WEIGHT,
        "False modesty detected",
    ));
    signal.merge(pattern_family(
        text,
        &SOCIAL_PRESSURE_RE,
        SOCIAL_PRESSURE_WEIGHT,
        "Social pressure detected",
    ));
    signal
}

/// Masked negativity patterns and toxic aspirational vocabulary
pub fn semantic_content(text: &str, lower: &str) -> ContextSignal {
    let mut signal = pattern_family(
        text,
        &MASKED_NEGATIVITY_RE,
        MASKED_NEGATIVITY_WEIGHT,
        "Masked negativity",
    );
    for word in ASPIRATIONAL_WORDS {
        if lower.contains(word) {
            signal.add(ASPIRATIONAL_WEIGHT, "Potentially toxic aspirational language");
        }
    }
    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> LexiconStore {
        LexiconStore::builtin()
    }

    #[test]
    fn test_emoji_density_needs_more_than_three() {
        let lex = lexicon();
        assert!(emoji_density("🚗🏠✨", &lex).is_empty());

        let signal = emoji_density("🔥🔥💰💎 wow", &lex);
        assert_eq!(signal.score, 12);
        assert_eq!(signal.factors, vec!["4 ostentation emojis".to_string()]);
    }

    #[test]
    fn test_hashtags_counted_once_each() {
        let lex = lexicon();
        let signal = hashtag_density("#goals #goals #goals", &lex);
        assert_eq!(signal.score, 8);

        // "#rich" is also a substring of "#richlife"
        assert_eq!(count_toxic_hashtags("#richlife", &lex), 2);
    }

    #[test]
    fn test_superiority_and_humble_brag() {
        let signal = superiority_language("Eu sou MELHOR do que todos");
        assert_eq!(signal.score, 18);
        assert_eq!(signal.factors, vec!["Superiority language".to_string()]);

        let signal = humble_brag("Not to brag but... with all humility");
        assert_eq!(signal.score, 15);
    }

    #[test]
    fn test_keyword_density() {
        let lex = lexicon();
        assert_eq!(keyword_density("", &lex), 0.0);
        assert_eq!(keyword_density("   ", &lex), 0.0);
        assert!((keyword_density("sou um perdedor", &lex) - 1.0).abs() < 1e-9);
        assert_eq!(keyword_density("quantum chromodynamics", &lex), 0.0);

        assert_eq!(keyword_density_signal("sou um perdedor", &lex).score, 12);
    }

    #[test]
    fn test_exclusivity_each_word() {
        let signal = exclusivity_language("vip premium access");
        assert_eq!(signal.score, 20);
        assert_eq!(signal.factors.len(), 2);
    }

    #[test]
    fn test_complex_patterns() {
        let signal = complex_patterns("Enquanto vocês dormem, eu já trabalho", true);
        assert_eq!(signal.score, 20);

        let signal = complex_patterns("Enquanto vocês dormem, eu já trabalho", false);
        assert!(signal.is_empty());

        let signal = complex_patterns("todo mundo tem um desses", true);
        assert_eq!(signal.score, 14);
        assert_eq!(signal.factors, vec!["Social pressure detected".to_string()]);

        let signal = complex_patterns("foi sorte conseguir", true);
        assert_eq!(signal.score, 16);
    }

    #[test]
    fn test_semantic_content() {
        let text = "Feliz mas queria mais. Hustle and grind mindset";
        let signal = semantic_content(text, &text.to_lowercase());
        // masked negativity 12 + hustle, grind, mindset 3 x 8
        assert_eq!(signal.score, 36);
        assert_eq!(signal.factors[0], "Masked negativity");
    }

    #[test]
    fn test_analyzer_respects_settings() {
        let lex = lexicon();
        let text = "Eu sou especial #blessed vip mindset";

        let all = ContextualAnalyzer::analyze(text, &lex, &AdvancedSettings::default());
        assert!(all.score > 0);

        let none = ContextualAnalyzer::analyze(text, &lex, &AdvancedSettings::all_disabled());
        assert!(none.is_empty());

        let semantic_only = AdvancedSettings {
            semantic_analysis: true,
            ..AdvancedSettings::all_disabled()
        };
        let signal = ContextualAnalyzer::analyze(text, &lex, &semantic_only);
        assert_eq!(signal.score, 8);
    }
}
