//! RedeSegura - On-device psychological risk scoring for social media content
//!
//! The PsychAI engine scores captured text for psychological harm through a
//! deterministic rule pipeline: lexicon scan → contextual heuristics →
//! app-specific patterns → emotional tone → block decision.
//!
//! ## Modules
//!
//! - **Engine**: Score content, manage triggers and sensitivity, persist stats
//! - **Protection**: Turn blocking assessments into overlays and counters

pub mod apps;
pub mod config;
pub mod contextual;
pub mod engine;
pub mod error;
pub mod journal;
pub mod lexicon;
pub mod protection;
pub mod scoring;
pub mod storage;
pub mod tone;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{ConfigUpdate, EngineConfig};
pub use engine::{DatabaseInfo, PsychEngine};
pub use error::EngineError;
pub use journal::{AnalysisStats, LearningJournal};
pub use lexicon::LexiconCategory;
pub use types::{Assessment, CategoryScores, EmotionalTone, RiskLevel, TriggerKind};

// Persistence exports
pub use storage::{FileStore, KeyValueStore, MemoryStore};

// Protection exports
pub use protection::{
    AssessmentSink, CaptureSource, CapturedContent, ProtectionPipeline, ProtectionSink,
};

/// Crate version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name used in diagnostics
pub const PRODUCER_NAME: &str = "redesegura";
