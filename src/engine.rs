//! The psychological scoring engine
//!
//! [`PsychEngine`] owns the mutable configuration and the stats ledger and
//! exposes the host-facing operations. Scoring itself is the pure
//! [`score_text`] pipeline; the engine adds lifecycle checks, latency
//! measurement and bookkeeping around it.
//!
//! One engine value is created per process and shared by reference or `Arc`.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigUpdate, EngineConfig};
use crate::error::EngineError;
use crate::journal::{AnalysisLedger, AnalysisStats, LearningJournal};
use crate::lexicon::{LexiconCategory, LEXICON_VERSION};
use crate::scoring::score_text;
use crate::storage::{KeyValueStore, JOURNAL_KEY, STATS_KEY};
use crate::types::Assessment;

/// Summary of the trigger database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    pub total_triggers: usize,
    /// Number of lexicon categories
    pub categories: usize,
    /// Entry count per category key
    pub category_counts: BTreeMap<String, usize>,
    pub last_update: DateTime<Utc>,
    pub version: String,
}

/// Rule-based content risk engine
pub struct PsychEngine {
    config: RwLock<EngineConfig>,
    ledger: Mutex<AnalysisLedger>,
    initialized: AtomicBool,
}

impl Default for PsychEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PsychEngine {
    /// Create an initialized engine with the built-in configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an initialized engine with a specific configuration
    pub fn with_config(config: EngineConfig) -> Self {
        info!(
            triggers = config.lexicon.total_entries(),
            categories = config.lexicon.category_count(),
            "psych engine initialized"
        );
        Self {
            config: RwLock::new(config),
            ledger: Mutex::new(AnalysisLedger::new()),
            initialized: AtomicBool::new(true),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Re-arm the engine after [`PsychEngine::cleanup`]
    pub fn initialize(&self) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!("psych engine re-initialized");
        }
    }

    /// Score one piece of content.
    ///
    /// Fails with [`EngineError::NotInitialized`] after [`PsychEngine::cleanup`].
    pub fn assess(&self, text: &str, app_context: &str) -> Result<Assessment, EngineError> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        let started = Instant::now();
        let (card, learning) = {
            let config = self.config.read();
            (
                score_text(text, app_context, &config),
                config.advanced.learning_mode,
            )
        };
        let latency_ms = started.elapsed().as_millis() as u64;
        let assessment = card.into_assessment(app_context, latency_ms);

        {
            let mut ledger = self.ledger.lock();
            ledger.record_outcome(assessment.should_block, latency_ms);
            if learning {
                ledger.append_sample(
                    text,
                    assessment.toxicity_score,
                    assessment.found_triggers.len(),
                );
            }
        }

        debug!(
            app = app_context,
            score = assessment.toxicity_score,
            blocked = assessment.should_block,
            triggers = assessment.found_triggers.len(),
            label = assessment.trigger_label(),
            "content assessed"
        );

        Ok(assessment)
    }

    /// Merge a partial configuration update
    pub fn update_configuration(&self, update: ConfigUpdate) {
        self.config.write().apply(update);
        info!("configuration updated");
    }

    /// Add a trigger phrase to a category.
    ///
    /// Unknown categories are logged and ignored. Returns `true` when the
    /// phrase was added.
    pub fn add_trigger(&self, category: &str, phrase: &str) -> bool {
        let Some(category) = self.resolve_category(category) else {
            return false;
        };
        let added = self.config.write().lexicon.insert(category, phrase);
        if added {
            info!(category = category.key(), phrase, "trigger added");
        }
        added
    }

    /// Remove a trigger phrase from a category.
    ///
    /// Unknown categories are logged and ignored. Returns `true` when the
    /// phrase was present.
    pub fn remove_trigger(&self, category: &str, phrase: &str) -> bool {
        let Some(category) = self.resolve_category(category) else {
            return false;
        };
        let removed = self.config.write().lexicon.remove(category, phrase);
        if removed {
            info!(category = category.key(), phrase, "trigger removed");
        }
        removed
    }

    fn resolve_category(&self, key: &str) -> Option<LexiconCategory> {
        let category = LexiconCategory::from_key(key);
        if category.is_none() {
            let err = EngineError::UnknownCategory(key.to_string());
            warn!(%err, "ignoring trigger change");
        }
        category
    }

    /// Scale every sensitivity level by a global level (clamped to 25-100)
    pub fn apply_global_sensitivity(&self, level: u8) {
        self.config.write().sensitivity.apply_global_sensitivity(level);
        info!(level, "global sensitivity applied");
    }

    /// Snapshot of the current configuration
    pub fn configuration(&self) -> EngineConfig {
        self.config.read().clone()
    }

    pub fn analysis_stats(&self) -> AnalysisStats {
        self.ledger.lock().stats().clone()
    }

    /// Snapshot of the learning journal
    pub fn learning_journal(&self) -> LearningJournal {
        self.ledger.lock().journal().clone()
    }

    pub fn database_info(&self) -> DatabaseInfo {
        let config = self.config.read();
        DatabaseInfo {
            total_triggers: config.lexicon.total_entries(),
            categories: config.lexicon.category_count(),
            category_counts: config.lexicon.counts(),
            last_update: Utc::now(),
            version: LEXICON_VERSION.to_string(),
        }
    }

    /// Restore stats and journal to their initial state
    pub fn reset(&self) {
        self.ledger.lock().reset();
        info!("analysis stats reset");
    }

    /// Drop the journal and mark the engine uninitialized
    pub fn cleanup(&self) {
        self.ledger.lock().clear_journal();
        self.initialized.store(false, Ordering::Release);
        info!("psych engine cleaned up");
    }

    /// Persist stats and journal.
    ///
    /// Failures are logged and never propagated. Returns `true` when both
    /// blobs were written.
    pub async fn synchronize(&self, store: &dyn KeyValueStore) -> bool {
        let blobs = {
            let ledger = self.ledger.lock();
            ledger
                .journal_json()
                .and_then(|journal| ledger.stats_json().map(|stats| (journal, stats)))
        };

        let (journal, stats) = match blobs {
            Ok(blobs) => blobs,
            Err(err) => {
                error!(error = %err, "failed to serialize engine state");
                return false;
            }
        };

        for (key, value) in [(JOURNAL_KEY, journal), (STATS_KEY, stats)] {
            if let Err(err) = store.set(key, &value).await {
                error!(key, error = %err, "engine synchronization failed");
                return false;
            }
        }

        info!("engine state synchronized");
        true
    }

    /// Reload stats and journal written by [`PsychEngine::synchronize`].
    ///
    /// Missing keys leave the current state untouched; unreadable or corrupt
    /// blobs are logged and skipped.
    pub async fn restore(&self, store: &dyn KeyValueStore) {
        if let Some(stats) = load_blob::<AnalysisStats>(store, STATS_KEY).await {
            self.ledger.lock().restore_stats(stats);
        }
        if let Some(journal) = load_blob::<LearningJournal>(store, JOURNAL_KEY).await {
            self.ledger.lock().restore_journal(journal);
        }
        debug!("engine state restore finished");
    }
}

async fn load_blob<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            error!(key, error = %err, "failed to read persisted state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            error!(key, error = %err, "ignoring corrupt persisted state");
            None
        }
    }
}
