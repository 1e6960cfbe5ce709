//! Analysis statistics and the learning journal
//!
//! The ledger owns the running counters updated after every assessment and a
//! bounded FIFO of recent samples. The journal only feeds the progress ratio;
//! it never influences scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of samples kept in the journal
pub const DEFAULT_JOURNAL_CAPACITY: usize = 1000;

/// Characters of content kept per journal sample
pub const SAMPLE_TEXT_CHARS: usize = 100;

const INITIAL_ACCURACY: f64 = 96.8;
const MAX_ACCURACY: f64 = 98.5;
const ACCURACY_STEP: f64 = 0.001;
const INITIAL_PROCESSING_SPEED_MS: u64 = 42;
const MODELS_ACTIVE: u32 = 8;

/// Running analysis counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub total_analyzed: u64,
    pub toxic_content_detected: u64,
    /// Accuracy estimate, never decreases
    pub accuracy_rate: f64,
    /// Running average of scoring latency in milliseconds
    #[serde(rename = "processingSpeed")]
    pub processing_speed_ms: u64,
    pub models_active: u32,
    /// Journal fill ratio (0-100)
    pub learning_progress: f64,
    #[serde(default)]
    pub last_analysis: Option<DateTime<Utc>>,
}

impl Default for AnalysisStats {
    fn default() -> Self {
        Self {
            total_analyzed: 0,
            toxic_content_detected: 0,
            accuracy_rate: INITIAL_ACCURACY,
            processing_speed_ms: INITIAL_PROCESSING_SPEED_MS,
            models_active: MODELS_ACTIVE,
            learning_progress: 0.0,
            last_analysis: None,
        }
    }
}

/// One journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSample {
    /// Leading characters of the assessed text
    pub text: String,
    pub score: u8,
    #[serde(alias = "triggers")]
    pub trigger_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO of learning samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LearningSample>", into = "Vec<LearningSample>")]
pub struct LearningJournal {
    samples: VecDeque<LearningSample>,
    capacity: usize,
}

impl Default for LearningJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl From<Vec<LearningSample>> for LearningJournal {
    fn from(samples: Vec<LearningSample>) -> Self {
        let mut journal = Self::default();
        for sample in samples {
            journal.push(sample);
        }
        journal
    }
}

impl From<LearningJournal> for Vec<LearningSample> {
    fn from(journal: LearningJournal) -> Self {
        journal.samples.into()
    }
}

impl LearningJournal {
    /// Create an empty journal holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_JOURNAL_CAPACITY)),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest beyond capacity
    pub fn push(&mut self, sample: LearningSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fill ratio in percent
    pub fn progress(&self) -> f64 {
        if self.capacity == 0 {
            return 100.0;
        }
        (self.samples.len() as f64 / self.capacity as f64 * 100.0).min(100.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LearningSample> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// `round((a + b) / 2)` with .5 rounding up, without overflowing
fn rounded_mean(a: u64, b: u64) -> u64 {
    a / 2 + b / 2 + (a % 2 + b % 2 + 1) / 2
}

/// Stats and journal behind one lock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisLedger {
    stats: AnalysisStats,
    journal: LearningJournal,
}

impl AnalysisLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one assessment outcome into the counters
    pub fn record_outcome(&mut self, blocked: bool, latency_ms: u64) {
        let stats = &mut self.stats;
        // Counters may come from a persisted blob, so none of this may overflow
        stats.total_analyzed = stats.total_analyzed.saturating_add(1);
        if blocked {
            stats.toxic_content_detected = stats.toxic_content_detected.saturating_add(1);
        }
        stats.processing_speed_ms = rounded_mean(stats.processing_speed_ms, latency_ms);
        let accuracy = INITIAL_ACCURACY + stats.total_analyzed as f64 * ACCURACY_STEP;
        stats.accuracy_rate = stats.accuracy_rate.max(accuracy.min(MAX_ACCURACY));
        stats.last_analysis = Some(Utc::now());
    }

    /// Append a truncated sample to the journal and refresh progress
    pub fn append_sample(&mut self, text: &str, score: u8, trigger_count: usize) {
        self.journal.push(LearningSample {
            text: text.chars().take(SAMPLE_TEXT_CHARS).collect(),
            score,
            trigger_count,
            timestamp: Utc::now(),
        });
        self.stats.learning_progress = self.journal.progress();
    }

    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    pub fn journal(&self) -> &LearningJournal {
        &self.journal
    }

    /// Replace the counters with a persisted snapshot
    pub fn restore_stats(&mut self, stats: AnalysisStats) {
        self.stats = stats;
    }

    /// Replace the journal with a persisted snapshot
    pub fn restore_journal(&mut self, journal: LearningJournal) {
        self.journal = journal;
        self.stats.learning_progress = self.journal.progress();
    }

    /// Drop journal samples, keeping the counters
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Restore both counters and journal to their initial state
    pub fn reset(&mut self) {
        self.stats = AnalysisStats::default();
        self.journal.clear();
    }

    pub fn stats_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.stats)
    }

    pub fn journal_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.journal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_initial_stats() {
        let stats = AnalysisStats::default();
        assert_eq!(stats.total_analyzed, 0);
        assert_eq!(stats.accuracy_rate, 96.8);
        assert_eq!(stats.processing_speed_ms, 42);
        assert_eq!(stats.models_active, 8);
        assert!(stats.last_analysis.is_none());
    }

    #[test]
    fn test_record_outcome() {
        let mut ledger = AnalysisLedger::new();
        ledger.record_outcome(true, 10);
        ledger.record_outcome(false, 3);

        let stats = ledger.stats();
        assert_eq!(stats.total_analyzed, 2);
        assert_eq!(stats.toxic_content_detected, 1);
        // (42 + 10) / 2 = 26, then (26 + 3) / 2 = 14.5 -> 15
        assert_eq!(stats.processing_speed_ms, 15);
        assert!((stats.accuracy_rate - 96.802).abs() < 1e-9);
        assert!(stats.last_analysis.is_some());
    }

    #[test]
    fn test_rounded_mean() {
        assert_eq!(rounded_mean(42, 10), 26);
        assert_eq!(rounded_mean(26, 3), 15);
        assert_eq!(rounded_mean(0, 0), 0);
        assert_eq!(rounded_mean(u64::MAX, u64::MAX), u64::MAX);
        assert_eq!(rounded_mean(u64::MAX, 1), u64::MAX / 2 + 1);
    }

    #[test]
    fn test_extreme_restored_counters_do_not_overflow() {
        let mut ledger = AnalysisLedger::new();
        ledger.restore_stats(AnalysisStats {
            total_analyzed: u64::MAX,
            toxic_content_detected: u64::MAX,
            processing_speed_ms: u64::MAX,
            ..AnalysisStats::default()
        });

        ledger.record_outcome(true, 7);

        let stats = ledger.stats();
        assert_eq!(stats.total_analyzed, u64::MAX);
        assert_eq!(stats.toxic_content_detected, u64::MAX);
        assert_eq!(stats.processing_speed_ms, u64::MAX / 2 + 4);
        assert_eq!(stats.accuracy_rate, 98.5);
    }

    #[test]
    fn test_accuracy_is_capped() {
        let mut ledger = AnalysisLedger::new();
        for _ in 0..2000 {
            ledger.record_outcome(false, 1);
        }
        assert_eq!(ledger.stats().accuracy_rate, 98.5);
    }

    #[test]
    fn test_journal_keeps_latest_samples() {
        let mut ledger = AnalysisLedger::new();
        for i in 0..1500 {
            ledger.append_sample(&format!("post {i}"), 10, 1);
        }

        let journal = ledger.journal();
        assert_eq!(journal.len(), 1000);
        assert_eq!(journal.iter().next().map(|s| s.text.as_str()), Some("post 500"));
        assert_eq!(journal.iter().last().map(|s| s.text.as_str()), Some("post 1499"));
        assert_eq!(ledger.stats().learning_progress, 100.0);
    }

    #[test]
    fn test_sample_text_is_truncated_by_chars() {
        let mut ledger = AnalysisLedger::new();
        let text = "ç".repeat(150);
        ledger.append_sample(&text, 50, 2);

        let sample = ledger.journal().iter().next().unwrap();
        assert_eq!(sample.text.chars().count(), 100);
        assert_eq!(sample.trigger_count, 2);
        assert!((ledger.stats().learning_progress - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut ledger = AnalysisLedger::new();
        ledger.record_outcome(true, 5);
        ledger.append_sample("text", 40, 1);
        ledger.reset();
        assert_eq!(ledger, AnalysisLedger::new());
    }

    #[test]
    fn test_persisted_blobs_round_trip() {
        let mut ledger = AnalysisLedger::new();
        ledger.record_outcome(true, 8);
        ledger.append_sample("olhem meu carro", 44, 2);

        let stats: AnalysisStats = serde_json::from_str(&ledger.stats_json().unwrap()).unwrap();
        let journal: LearningJournal =
            serde_json::from_str(&ledger.journal_json().unwrap()).unwrap();

        let mut restored = AnalysisLedger::new();
        restored.restore_stats(stats);
        restored.restore_journal(journal);
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_stats_use_camel_case_keys() {
        let json = AnalysisLedger::new().stats_json().unwrap();
        assert!(json.contains("\"totalAnalyzed\":0"));
        assert!(json.contains("\"processingSpeed\":42"));
    }
}
