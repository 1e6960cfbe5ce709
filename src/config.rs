//! Engine configuration: lexicon, sensitivity profile and advanced settings
//!
//! Configuration is replaced wholesale or merged through [`ConfigUpdate`], a
//! typed partial structure with one optional fragment per domain. Every field
//! of a fragment is optional; present fields override existing values.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::lexicon::{LexiconCategory, LexiconStore};

/// Sensitivity used for categories without an explicit level
pub const DEFAULT_SENSITIVITY: u8 = 75;

/// Bounds applied by [`SensitivityProfile::apply_global_sensitivity`]
const GLOBAL_SENSITIVITY_MIN: u8 = 25;
const GLOBAL_SENSITIVITY_MAX: u8 = 100;

/// Per-category sensitivity (0-100) scaling trigger weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensitivityProfile {
    pub comparison: u8,
    pub anxiety: u8,
    pub depression: u8,
    pub body_image: u8,
    pub materialism: u8,
    pub perfectionism: u8,
    pub ostentation: u8,
}

impl Default for SensitivityProfile {
    fn default() -> Self {
        Self {
            comparison: 88,
            anxiety: 92,
            depression: 96,
            body_image: 90,
            materialism: 78,
            perfectionism: 85,
            ostentation: 82,
        }
    }
}

impl SensitivityProfile {
    /// Sensitivity for a lexicon category, clamped to 0-100
    pub fn level(&self, category: LexiconCategory) -> u8 {
        let level = match category {
            LexiconCategory::Comparison => self.comparison,
            LexiconCategory::Anxiety => self.anxiety,
            LexiconCategory::Depression => self.depression,
            LexiconCategory::BodyImage => self.body_image,
            LexiconCategory::Materialism => self.materialism,
            LexiconCategory::Ostentation => self.ostentation,
            LexiconCategory::ToxicEmojis | LexiconCategory::ToxicHashtags => DEFAULT_SENSITIVITY,
        };
        level.min(100)
    }

    /// Sensitivity by name; unknown names fall back to [`DEFAULT_SENSITIVITY`]
    pub fn level_for_key(&self, key: &str) -> u8 {
        if key == "perfectionism" {
            return self.perfectionism.min(100);
        }
        LexiconCategory::from_key(key)
            .map(|c| self.level(c))
            .unwrap_or(DEFAULT_SENSITIVITY)
    }

    /// Merge a partial update, clamping each level to 0-100
    pub fn merge(&mut self, update: &SensitivityUpdate) {
        let set = |slot: &mut u8, value: Option<u8>| {
            if let Some(v) = value {
                *slot = v.min(100);
            }
        };
        set(&mut self.comparison, update.comparison);
        set(&mut self.anxiety, update.anxiety);
        set(&mut self.depression, update.depression);
        set(&mut self.body_image, update.body_image);
        set(&mut self.materialism, update.materialism);
        set(&mut self.perfectionism, update.perfectionism);
        set(&mut self.ostentation, update.ostentation);
    }

    /// Scale every category by a global level.
    ///
    /// The level is clamped to 25-100 and each resulting category level is
    /// clamped to the same range.
    pub fn apply_global_sensitivity(&mut self, level: u8) {
        let level = level.clamp(GLOBAL_SENSITIVITY_MIN, GLOBAL_SENSITIVITY_MAX) as f64;
        for slot in [
            &mut self.comparison,
            &mut self.anxiety,
            &mut self.depression,
            &mut self.body_image,
            &mut self.materialism,
            &mut self.perfectionism,
            &mut self.ostentation,
        ] {
            let scaled = (*slot as f64 * (level / 100.0)).floor() as u8;
            *slot = scaled.clamp(GLOBAL_SENSITIVITY_MIN, GLOBAL_SENSITIVITY_MAX);
        }
    }
}

/// Feature flags gating the optional analyses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedSettings {
    /// Emoji/hashtag density, superiority, humble-brag, keyword density, exclusivity
    pub contextual_analysis: bool,
    /// Implicit comparison, false modesty and social pressure patterns
    pub pattern_recognition: bool,
    /// Append a journal sample after every assessment
    pub learning_mode: bool,
    /// Masked negativity and toxic aspirational vocabulary
    pub semantic_analysis: bool,
    pub emotional_tone_detection: bool,
    /// Sub-flag of `pattern_recognition` for the implicit comparison family
    pub implicit_comparison_detection: bool,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            contextual_analysis: true,
            pattern_recognition: true,
            learning_mode: true,
            semantic_analysis: true,
            emotional_tone_detection: true,
            implicit_comparison_detection: true,
        }
    }
}

impl AdvancedSettings {
    pub fn merge(&mut self, update: &AdvancedSettingsUpdate) {
        let set = |slot: &mut bool, value: Option<bool>| {
            if let Some(v) = value {
                *slot = v;
            }
        };
        set(&mut self.contextual_analysis, update.contextual_analysis);
        set(&mut self.pattern_recognition, update.pattern_recognition);
        set(&mut self.learning_mode, update.learning_mode);
        set(&mut self.semantic_analysis, update.semantic_analysis);
        set(&mut self.emotional_tone_detection, update.emotional_tone_detection);
        set(
            &mut self.implicit_comparison_detection,
            update.implicit_comparison_detection,
        );
    }

    /// Settings with every optional analysis turned off
    pub fn all_disabled() -> Self {
        Self {
            contextual_analysis: false,
            pattern_recognition: false,
            learning_mode: false,
            semantic_analysis: false,
            emotional_tone_detection: false,
            implicit_comparison_detection: false,
        }
    }
}

/// Partial sensitivity update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anxiety: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depression: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_image: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materialism: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perfectionism: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostentation: Option<u8>,
}

/// Partial advanced-settings update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_analysis: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_recognition: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_analysis: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotional_tone_detection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit_comparison_detection: Option<bool>,
}

/// Partial lexicon update; each present category replaces the stored list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexiconUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_triggers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anxiety_triggers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depression_triggers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_image_triggers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materialism_triggers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostentation_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toxic_emojis: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toxic_hashtags: Option<Vec<String>>,
}

impl LexiconUpdate {
    /// Present fragments paired with their category
    pub fn into_entries(self) -> Vec<(LexiconCategory, Vec<String>)> {
        [
            (LexiconCategory::Comparison, self.comparison_triggers),
            (LexiconCategory::Anxiety, self.anxiety_triggers),
            (LexiconCategory::Depression, self.depression_triggers),
            (LexiconCategory::BodyImage, self.body_image_triggers),
            (LexiconCategory::Materialism, self.materialism_triggers),
            (LexiconCategory::Ostentation, self.ostentation_patterns),
            (LexiconCategory::ToxicEmojis, self.toxic_emojis),
            (LexiconCategory::ToxicHashtags, self.toxic_hashtags),
        ]
        .into_iter()
        .filter_map(|(category, phrases)| phrases.map(|p| (category, p)))
        .collect()
    }
}

/// Typed partial configuration update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(rename = "psychologyDatabase", skip_serializing_if = "Option::is_none")]
    pub lexicon: Option<LexiconUpdate>,
    #[serde(rename = "sensitivityLevels", skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityUpdate>,
    #[serde(
        rename = "advanced",
        alias = "advancedSettings",
        skip_serializing_if = "Option::is_none"
    )]
    pub advanced: Option<AdvancedSettingsUpdate>,
}

impl ConfigUpdate {
    /// Parse an update from a JSON settings blob
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Full engine configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(rename = "psychologyDatabase", default)]
    pub lexicon: LexiconStore,
    #[serde(rename = "sensitivityLevels", default)]
    pub sensitivity: SensitivityProfile,
    #[serde(rename = "advancedSettings", alias = "advanced", default)]
    pub advanced: AdvancedSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lexicon: LexiconStore::builtin(),
            sensitivity: SensitivityProfile::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Merge a partial update; incoming values override existing ones
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(lexicon) = update.lexicon {
            for (category, phrases) in lexicon.into_entries() {
                self.lexicon.replace(category, phrases);
            }
        }
        if let Some(sensitivity) = update.sensitivity {
            self.sensitivity.merge(&sensitivity);
        }
        if let Some(advanced) = update.advanced {
            self.advanced.merge(&advanced);
        }
    }

    /// Parse a full configuration document and validate it
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sensitivity levels outside 0-100
    pub fn validate(&self) -> Result<(), EngineError> {
        let s = &self.sensitivity;
        let levels = [
            ("comparison", s.comparison),
            ("anxiety", s.anxiety),
            ("depression", s.depression),
            ("bodyImage", s.body_image),
            ("materialism", s.materialism),
            ("perfectionism", s.perfectionism),
            ("ostentation", s.ostentation),
        ];
        match levels.iter().find(|(_, level)| *level > 100) {
            Some((name, level)) => Err(EngineError::InvalidConfiguration(format!(
                "sensitivity {name} is {level}, expected 0-100"
            ))),
            None => Ok(()),
        }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_levels() {
        let profile = SensitivityProfile::default();
        assert_eq!(profile.level(LexiconCategory::Depression), 96);
        assert_eq!(profile.level(LexiconCategory::Ostentation), 82);
        assert_eq!(profile.level(LexiconCategory::ToxicEmojis), DEFAULT_SENSITIVITY);
        assert_eq!(profile.level_for_key("bodyImage"), 90);
        assert_eq!(profile.level_for_key("perfectionism"), 85);
        assert_eq!(profile.level_for_key("sarcasm"), DEFAULT_SENSITIVITY);
    }

    #[test]
    fn test_sensitivity_merge_clamps() {
        let mut profile = SensitivityProfile::default();
        profile.merge(&SensitivityUpdate {
            anxiety: Some(150),
            materialism: Some(10),
            ..Default::default()
        });
        assert_eq!(profile.anxiety, 100);
        assert_eq!(profile.materialism, 10);
        assert_eq!(profile.comparison, 88);
    }

    #[test]
    fn test_global_sensitivity() {
        let mut profile = SensitivityProfile::default();
        profile.apply_global_sensitivity(50);
        // 88 * 0.5 = 44, 96 * 0.5 = 48
        assert_eq!(profile.comparison, 44);
        assert_eq!(profile.depression, 48);

        // Levels never drop below 25
        profile.apply_global_sensitivity(10);
        assert_eq!(profile.comparison, 25);
    }

    #[test]
    fn test_partial_update_overrides_only_present_fields() {
        let mut config = EngineConfig::default();
        let update = ConfigUpdate::from_json(
            r#"{
                "psychologyDatabase": { "anxietyTriggers": ["Hurry", "hurry", "now"] },
                "sensitivityLevels": { "depression": 50 },
                "advanced": { "learningMode": false }
            }"#,
        )
        .unwrap();

        config.apply(update);

        assert_eq!(
            config.lexicon.phrases(LexiconCategory::Anxiety),
            &["hurry".to_string(), "now".to_string()]
        );
        assert!(config.lexicon.contains(LexiconCategory::Comparison, "blessed"));
        assert_eq!(config.sensitivity.depression, 50);
        assert_eq!(config.sensitivity.anxiety, 92);
        assert!(!config.advanced.learning_mode);
        assert!(config.advanced.contextual_analysis);
    }

    #[test]
    fn test_config_round_trip_keys() {
        let config = EngineConfig::default();
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert!(value["psychologyDatabase"]["toxicHashtags"].is_array());
        assert_eq!(value["sensitivityLevels"]["bodyImage"], 90);
        assert_eq!(value["advancedSettings"]["emotionalToneDetection"], true);

        let restored = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_full_config_rejects_out_of_range_levels() {
        let err = EngineConfig::from_json(r#"{"sensitivityLevels":{"anxiety":140}}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("anxiety"));
    }

    #[test]
    fn test_invalid_update_json() {
        assert!(ConfigUpdate::from_json("{ not json").is_err());
    }
}
