//! Lexical scoring
//!
//! Every scored lexicon category is scanned independently into a
//! [`CategoryOutcome`]; the outcomes are then folded into a [`LexicalScan`]
//! where the first category with a hit supplies the trigger label. The
//! contextual, tone and per-app stages are combined in [`score_text`], which
//! yields a [`ScoreCard`] that is turned into an [`Assessment`].

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::apps::app_specific_score;
use crate::config::{EngineConfig, SensitivityProfile};
use crate::contextual::ContextualAnalyzer;
use crate::lexicon::{LexiconCategory, LexiconStore};
use crate::tone::ToneClassifier;
use crate::types::{
    Assessment, CategoryScores, EmotionalTone, RiskLevel, TriggerKind, BLOCK_THRESHOLD,
};

const CONFIDENCE_MIN: f64 = 60.0;
const CONFIDENCE_MAX: f64 = 98.0;

/// Weight of a single trigger hit
///
/// `round((base + specificity) * sensitivity / 100)` where specificity is
/// +5 for phrases longer than 15 characters and +3 for longer than 10.
pub fn trigger_weight(
    phrase: &str,
    category: LexiconCategory,
    sensitivity: &SensitivityProfile,
) -> f64 {
    let length = phrase.chars().count();
    let specificity = if length > 15 {
        5.0
    } else if length > 10 {
        3.0
    } else {
        0.0
    };
    let level = sensitivity.level(category) as f64;
    ((category.base_weight() + specificity) * (level / 100.0)).round()
}

/// Result of scanning one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryOutcome {
    pub category: LexiconCategory,
    /// Sum of raw weights
    pub sub_score: f64,
    /// Sum of weights scaled by the category's toxicity multiplier
    pub toxicity: f64,
    pub triggers: Vec<String>,
    /// Set when the category produced at least one hit
    pub label: Option<TriggerKind>,
}

/// Scan one category against lowercased text
pub fn scan_category(
    lower: &str,
    category: LexiconCategory,
    lexicon: &LexiconStore,
    sensitivity: &SensitivityProfile,
) -> CategoryOutcome {
    let mut outcome = CategoryOutcome {
        category,
        sub_score: 0.0,
        toxicity: 0.0,
        triggers: Vec::new(),
        label: None,
    };

    for phrase in lexicon.phrases(category) {
        if lower.contains(phrase.as_str()) {
            let weight = trigger_weight(phrase, category, sensitivity);
            outcome.sub_score += weight;
            outcome.toxicity += weight * category.toxicity_multiplier();
            outcome.triggers.push(phrase.clone());
        }
    }

    if !outcome.triggers.is_empty() {
        outcome.label = category.trigger_kind();
    }
    outcome
}

/// Unclamped per-category levels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryLevels {
    pub comparison: f64,
    pub anxiety: f64,
    pub depression: f64,
    pub body_image: f64,
    pub materialism: f64,
}

impl CategoryLevels {
    fn add(&mut self, category: LexiconCategory, value: f64) {
        match category {
            LexiconCategory::Comparison => self.comparison += value,
            LexiconCategory::Anxiety => self.anxiety += value,
            LexiconCategory::Depression => self.depression += value,
            LexiconCategory::BodyImage => self.body_image += value,
            // Ostentation has no slot of its own; it feeds materialism
            LexiconCategory::Materialism | LexiconCategory::Ostentation => {
                self.materialism += value
            }
            LexiconCategory::ToxicEmojis | LexiconCategory::ToxicHashtags => {}
        }
    }

    fn clamped(&self) -> CategoryScores {
        CategoryScores {
            comparison: clamp_score(self.comparison),
            anxiety: clamp_score(self.anxiety),
            depression: clamp_score(self.depression),
            body_image: clamp_score(self.body_image),
            materialism: clamp_score(self.materialism),
        }
    }
}

/// Fold of every category outcome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalScan {
    pub levels: CategoryLevels,
    pub toxicity: f64,
    pub triggers: Vec<String>,
    pub label: Option<TriggerKind>,
}

impl LexicalScan {
    /// Combine one more outcome; the first non-empty label wins
    pub fn absorb(mut self, outcome: CategoryOutcome) -> Self {
        self.levels.add(outcome.category, outcome.sub_score);
        self.toxicity += outcome.toxicity;
        self.triggers.extend(outcome.triggers);
        self.label = self.label.or(outcome.label);
        self
    }
}

/// Scan every scored category in order
pub fn scan_lexicon(
    lower: &str,
    lexicon: &LexiconStore,
    sensitivity: &SensitivityProfile,
) -> LexicalScan {
    LexiconCategory::SCORED
        .into_iter()
        .map(|category| scan_category(lower, category, lexicon, sensitivity))
        .fold(LexicalScan::default(), LexicalScan::absorb)
}

/// Intermediate, unclamped scoring result
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    /// Raw toxicity before rounding and clamping
    pub toxicity: f64,
    pub levels: CategoryLevels,
    pub found_triggers: Vec<String>,
    pub trigger_type: Option<TriggerKind>,
    pub contextual_factors: Vec<String>,
    pub emotional_tone: EmotionalTone,
}

impl ScoreCard {
    pub fn should_block(&self) -> bool {
        self.toxicity > BLOCK_THRESHOLD
    }

    /// Number of distinct matched phrases
    pub fn distinct_triggers(&self) -> usize {
        self.found_triggers
            .iter()
            .map(|t| t.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn confidence(&self) -> u8 {
        confidence(
            self.toxicity,
            self.distinct_triggers(),
            self.found_triggers.len(),
            self.contextual_factors.len(),
        )
    }

    /// Finalize into an immutable assessment
    pub fn into_assessment(self, app_context: &str, processing_time_ms: u64) -> Assessment {
        let should_block = self.should_block();
        let confidence = self.confidence();
        let risk_level = RiskLevel::from_score(self.toxicity);

        let trigger_type = match self.trigger_type {
            None if should_block => Some(TriggerKind::GeneralAnalysis),
            other => other,
        };

        Assessment {
            assessment_id: Uuid::new_v4(),
            assessed_at: Utc::now(),
            app_context: app_context.to_string(),
            toxicity_score: clamp_score(self.toxicity),
            category_scores: self.levels.clamped(),
            found_triggers: self.found_triggers,
            should_block,
            confidence,
            trigger_type,
            trigger_reason: trigger_type.map(|k| k.reason().to_string()),
            risk_level,
            contextual_factors: self.contextual_factors,
            emotional_tone: self.emotional_tone,
            processing_time_ms,
        }
    }
}

/// Run every scoring stage over a text
pub fn score_text(text: &str, app_context: &str, config: &EngineConfig) -> ScoreCard {
    // Stage 1: Normalize for phrase matching
    let lower = text.to_lowercase();

    // Stage 2: Lexical scan across categories
    let scan = scan_lexicon(&lower, &config.lexicon, &config.sensitivity);
    let mut toxicity = scan.toxicity;

    // Stage 3: Contextual, pattern and semantic analyses
    let context = ContextualAnalyzer::analyze(text, &config.lexicon, &config.advanced);
    toxicity += context.score as f64;

    // Stage 4: Emotional tone
    let emotional_tone = if config.advanced.emotional_tone_detection {
        ToneClassifier::classify_lowercase(&lower)
    } else {
        EmotionalTone::Neutral
    };

    // Stage 5: App heuristics
    toxicity += app_specific_score(text, app_context) as f64;

    ScoreCard {
        toxicity,
        levels: scan.levels,
        found_triggers: scan.triggers,
        trigger_type: scan.label,
        contextual_factors: context.factors,
        emotional_tone,
    }
}

/// Confidence estimate.
///
/// Starts at `min(98, score * 1.2)`, +5 for more than two distinct triggers,
/// +3 for more than one contextual factor, -10 when the trigger list holds a
/// single entry, then clamped to 60-98.
///
/// The 98 cap is applied to the base before the adjustments, so a strong
/// single-trigger hit lands at 88 rather than 98. Existing assessments depend
/// on this ordering.
pub fn confidence(
    toxicity: f64,
    distinct_triggers: usize,
    trigger_hits: usize,
    contextual_factors: usize,
) -> u8 {
    let mut confidence = (toxicity * 1.2).min(CONFIDENCE_MAX);

    if distinct_triggers > 2 {
        confidence += 5.0;
    }
    if contextual_factors > 1 {
        confidence += 3.0;
    }
    // Hits are counted per category, so a phrase listed twice is two hits
    if toxicity > 0.0 && trigger_hits == 1 {
        confidence -= 10.0;
    }

    confidence.round().clamp(CONFIDENCE_MIN, CONFIDENCE_MAX) as u8
}

/// Round and clamp a raw score into 0-100
pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
