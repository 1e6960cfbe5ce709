//! Assessment types produced by the scoring engine
//!
//! An [`Assessment`] is created fresh for every call to
//! [`PsychEngine::assess`](crate::engine::PsychEngine::assess) and is never
//! mutated afterwards; ownership transfers to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Toxicity score above which content is blocked
pub const BLOCK_THRESHOLD: f64 = 35.0;

/// Ordinal risk classification derived from the toxicity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a raw (unclamped) toxicity score
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= BLOCK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

/// Coarse emotional tone of a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    Positive,
    Neutral,
    Negative,
    Toxic,
}

impl EmotionalTone {
    pub fn label(&self) -> &'static str {
        match self {
            EmotionalTone::Positive => "Positive",
            EmotionalTone::Neutral => "Neutral",
            EmotionalTone::Negative => "Negative",
            EmotionalTone::Toxic => "Toxic",
        }
    }
}

/// Primary trigger category reported on an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    SocialComparison,
    AnxietyFomo,
    DepressionRisk,
    BodyImage,
    ExcessiveMaterialism,
    Ostentation,
    /// Fallback used when content is blocked without a lexical trigger
    GeneralAnalysis,
}

impl TriggerKind {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            TriggerKind::SocialComparison => "Social Comparison",
            TriggerKind::AnxietyFomo => "Anxiety/FOMO",
            TriggerKind::DepressionRisk => "Depression Risk",
            TriggerKind::BodyImage => "Body Image",
            TriggerKind::ExcessiveMaterialism => "Excessive Materialism",
            TriggerKind::Ostentation => "Ostentation",
            TriggerKind::GeneralAnalysis => "General Analysis",
        }
    }

    /// Canned explanation shown to the user
    pub fn reason(&self) -> &'static str {
        match self {
            TriggerKind::SocialComparison => {
                "Content may trigger harmful social comparison and low self-esteem"
            }
            TriggerKind::AnxietyFomo => "Detected inducers of anxiety and fear of missing out",
            TriggerKind::DepressionRisk => {
                "Potentially depressive content that may affect mood and self-esteem"
            }
            TriggerKind::BodyImage => {
                "Body image trigger that may cause dysmorphia and body dissatisfaction"
            }
            TriggerKind::ExcessiveMaterialism => {
                "Materialistic content that may cause financial dissatisfaction"
            }
            TriggerKind::Ostentation => "Ostentatious display that may fuel envy and inadequacy",
            TriggerKind::GeneralAnalysis => {
                "Harmful content detected by the advanced psychological analysis"
            }
        }
    }
}

/// Per-category sub-scores, each clamped to 0-100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub comparison: u8,
    pub anxiety: u8,
    pub depression: u8,
    pub body_image: u8,
    pub materialism: u8,
}

/// Structured output of one scoring call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique id of this assessment
    pub assessment_id: Uuid,
    /// When the assessment was produced
    pub assessed_at: DateTime<Utc>,
    /// App identifier the content came from, as given by the caller
    pub app_context: String,
    /// Aggregate toxicity (0-100)
    pub toxicity_score: u8,
    /// Per-category levels
    pub category_scores: CategoryScores,
    /// Matched trigger phrases in discovery order
    pub found_triggers: Vec<String>,
    /// Whether the consumer should intervene
    pub should_block: bool,
    /// Confidence estimate (60-98)
    pub confidence: u8,
    /// First category that produced a hit (or the fallback when blocked)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<TriggerKind>,
    /// Explanation matching `trigger_type`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_reason: Option<String>,
    pub risk_level: RiskLevel,
    /// Descriptions of contextual signals that contributed to the score
    pub contextual_factors: Vec<String>,
    pub emotional_tone: EmotionalTone,
    /// Wall-clock scoring latency in milliseconds
    pub processing_time_ms: u64,
}

impl Assessment {
    /// Display label of the primary trigger, empty when there is none
    pub fn trigger_label(&self) -> &'static str {
        self.trigger_type.map(|k| k.label()).unwrap_or("")
    }
}
