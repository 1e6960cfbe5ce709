//! Capture → assess → protect wiring
//!
//! Content arrives from a [`CaptureSource`], is scored by the engine and the
//! result is handed to an [`AssessmentSink`]. [`ProtectionSink`] is the
//! stock sink: it plans the on-screen intervention for blocked content and
//! keeps the protection counters and the blocked-event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::apps::SourceApp;
use crate::engine::PsychEngine;
use crate::error::EngineError;
use crate::types::{Assessment, RiskLevel};

/// Newest-first blocked events kept by [`ProtectionSink`]
pub const BLOCKED_EVENT_CAPACITY: usize = 500;

/// Delay before the host scrolls past blocked content
pub const AUTO_SCROLL_DELAY: Duration = Duration::from_secs(2);

const MENTAL_HEALTH_STEP: f64 = 0.2;
const MENTAL_HEALTH_MAX: f64 = 100.0;
const MENTAL_HEALTH_BASELINE: f64 = 85.0;

/// Tag stored on every blocked event
pub const ENGINE_TAG: &str = "PsychAI v4.0";

/// One piece of on-screen content captured by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedContent {
    pub text: String,
    /// App identifier (short name or package name)
    #[serde(default, alias = "appContext", alias = "app_context")]
    pub app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl CapturedContent {
    pub fn new(text: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            app: app.into(),
            captured_at: None,
        }
    }
}

/// Producer of captured content
pub trait CaptureSource {
    fn next_capture(&mut self) -> Option<CapturedContent>;
}

impl<I> CaptureSource for I
where
    I: Iterator<Item = CapturedContent>,
{
    fn next_capture(&mut self) -> Option<CapturedContent> {
        self.next()
    }
}

/// Consumer of assessments
pub trait AssessmentSink {
    fn accept(
        &mut self,
        content: &CapturedContent,
        assessment: &Assessment,
    ) -> Result<(), EngineError>;
}

/// Overlay the host should draw over blocked content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRequest {
    /// Display label of the primary trigger
    pub trigger_reason: String,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub app_name: String,
}

/// Intervention planned for one blocked assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionAction {
    pub overlay: OverlayRequest,
    /// Delay before auto-scrolling, absent when auto-scroll is off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scroll_after_ms: Option<u64>,
}

/// Maps blocking assessments to protection actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionPlanner {
    pub auto_scroll: bool,
    pub auto_scroll_delay: Duration,
}

impl Default for ProtectionPlanner {
    fn default() -> Self {
        Self {
            auto_scroll: true,
            auto_scroll_delay: AUTO_SCROLL_DELAY,
        }
    }
}

impl ProtectionPlanner {
    /// Plan an intervention; `None` when the assessment does not block
    pub fn plan(&self, app: &str, assessment: &Assessment) -> Option<ProtectionAction> {
        if !assessment.should_block {
            return None;
        }
        Some(ProtectionAction {
            overlay: OverlayRequest {
                trigger_reason: assessment.trigger_label().to_string(),
                risk_level: assessment.risk_level,
                confidence: assessment.confidence,
                app_name: app_name(app),
            },
            auto_scroll_after_ms: self
                .auto_scroll
                .then(|| self.auto_scroll_delay.as_millis() as u64),
        })
    }
}

fn app_name(app: &str) -> String {
    match SourceApp::from_identifier(app) {
        SourceApp::Unknown => app.to_string(),
        known => known.display_name().to_string(),
    }
}

/// Protection counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionStats {
    pub posts_blocked: u64,
    pub triggers_avoided: u64,
    /// Wellbeing indicator, +0.2 per block, capped at 100
    pub mental_health_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for ProtectionStats {
    fn default() -> Self {
        Self {
            posts_blocked: 0,
            triggers_avoided: 0,
            mental_health_score: MENTAL_HEALTH_BASELINE,
            last_updated: Utc::now(),
        }
    }
}

impl ProtectionStats {
    fn record_block(&mut self) {
        self.posts_blocked += 1;
        self.triggers_avoided += 1;
        self.mental_health_score =
            (self.mental_health_score + MENTAL_HEALTH_STEP).min(MENTAL_HEALTH_MAX);
        self.last_updated = Utc::now();
    }
}

/// Log entry for one blocked piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub app: String,
    pub trigger_label: String,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub toxicity_score: u8,
    pub engine: String,
}

/// Stock sink: counters, blocked-event log and planned actions
#[derive(Debug, Default)]
pub struct ProtectionSink {
    planner: ProtectionPlanner,
    stats: ProtectionStats,
    events: VecDeque<BlockedEvent>,
    actions: VecDeque<ProtectionAction>,
}

impl ProtectionSink {
    pub fn new(planner: ProtectionPlanner) -> Self {
        Self {
            planner,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> &ProtectionStats {
        &self.stats
    }

    /// Blocked events, newest first
    pub fn events(&self) -> impl Iterator<Item = &BlockedEvent> {
        self.events.iter()
    }

    /// Take the actions planned since the last call.
    ///
    /// At most [`BLOCKED_EVENT_CAPACITY`] undrained actions are kept; older
    /// ones are dropped first.
    pub fn drain_actions(&mut self) -> Vec<ProtectionAction> {
        self.actions.drain(..).collect()
    }

    /// Clear counters and the event log
    pub fn reset(&mut self) {
        self.stats = ProtectionStats::default();
        self.events.clear();
        self.actions.clear();
    }
}

impl AssessmentSink for ProtectionSink {
    fn accept(
        &mut self,
        content: &CapturedContent,
        assessment: &Assessment,
    ) -> Result<(), EngineError> {
        let Some(action) = self.planner.plan(&content.app, assessment) else {
            return Ok(());
        };

        self.stats.record_block();
        self.events.push_front(BlockedEvent {
            id: assessment.assessment_id,
            timestamp: Utc::now(),
            app: content.app.clone(),
            trigger_label: action.overlay.trigger_reason.clone(),
            risk_level: assessment.risk_level,
            confidence: assessment.confidence,
            toxicity_score: assessment.toxicity_score,
            engine: ENGINE_TAG.to_string(),
        });
        self.events.truncate(BLOCKED_EVENT_CAPACITY);

        debug!(
            app = %action.overlay.app_name,
            trigger = %action.overlay.trigger_reason,
            confidence = action.overlay.confidence,
            "protection planned"
        );
        self.actions.push_back(action);
        while self.actions.len() > BLOCKED_EVENT_CAPACITY {
            self.actions.pop_front();
        }
        Ok(())
    }
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub processed: usize,
    pub blocked: usize,
    /// Captures the engine refused to score
    pub failed: usize,
    /// Assessments the sink rejected
    pub sink_errors: usize,
}

/// Drives captures through the engine into a sink
pub struct ProtectionPipeline<'a> {
    engine: &'a PsychEngine,
}

impl<'a> ProtectionPipeline<'a> {
    pub fn new(engine: &'a PsychEngine) -> Self {
        Self { engine }
    }

    /// Consume the source until exhausted
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> PipelineSummary
    where
        S: CaptureSource + ?Sized,
        K: AssessmentSink + ?Sized,
    {
        let mut summary = PipelineSummary::default();

        while let Some(content) = source.next_capture() {
            let assessment = match self.engine.assess(&content.text, &content.app) {
                Ok(assessment) => assessment,
                Err(err) => {
                    warn!(app = %content.app, error = %err, "capture not assessed");
                    summary.failed += 1;
                    continue;
                }
            };

            summary.processed += 1;
            if assessment.should_block {
                summary.blocked += 1;
            }

            if let Err(err) = sink.accept(&content, &assessment) {
                warn!(app = %content.app, error = %err, "sink rejected assessment");
                summary.sink_errors += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BLOCKED_POST: &str =
        "Minha vida é perfeita! Olhem minha nova BMW M8 🚗🏠✨ #blessed #richlife";

    fn captures() -> Vec<CapturedContent> {
        vec![
            CapturedContent::new(BLOCKED_POST, "com.instagram.android"),
            CapturedContent::new("bom dia", "com.instagram.android"),
            CapturedContent::new("sou um perdedor", "tiktok"),
        ]
    }

    #[test]
    fn test_planner_skips_safe_content() {
        let engine = PsychEngine::new();
        let assessment = engine.assess("bom dia", "instagram").unwrap();
        assert_eq!(ProtectionPlanner::default().plan("instagram", &assessment), None);
    }

    #[test]
    fn test_planner_builds_overlay() {
        let engine = PsychEngine::new();
        let assessment = engine.assess(BLOCKED_POST, "com.instagram.android").unwrap();

        let action = ProtectionPlanner::default()
            .plan("com.instagram.android", &assessment)
            .unwrap();
        assert_eq!(action.overlay.app_name, "Instagram");
        assert_eq!(action.overlay.trigger_reason, "Social Comparison");
        assert_eq!(action.overlay.confidence, assessment.confidence);
        assert_eq!(action.auto_scroll_after_ms, Some(2000));

        let planner = ProtectionPlanner {
            auto_scroll: false,
            ..ProtectionPlanner::default()
        };
        let action = planner.plan("com.example", &assessment).unwrap();
        assert_eq!(action.overlay.app_name, "com.example");
        assert_eq!(action.auto_scroll_after_ms, None);
    }

    #[test]
    fn test_pipeline_run() {
        let engine = PsychEngine::new();
        let mut sink = ProtectionSink::default();
        let mut source = captures().into_iter();

        let summary = ProtectionPipeline::new(&engine).run(&mut source, &mut sink);
        assert_eq!(
            summary,
            PipelineSummary {
                processed: 3,
                blocked: 2,
                failed: 0,
                sink_errors: 0,
            }
        );

        assert_eq!(sink.stats().posts_blocked, 2);
        assert_eq!(sink.stats().triggers_avoided, 2);
        assert!((sink.stats().mental_health_score - 85.4).abs() < 1e-9);

        let newest = sink.events().next().unwrap();
        assert_eq!(newest.app, "tiktok");
        assert_eq!(newest.trigger_label, "Depression Risk");
        assert_eq!(newest.engine, ENGINE_TAG);

        assert_eq!(sink.drain_actions().len(), 2);
        assert!(sink.drain_actions().is_empty());
        assert_eq!(engine.analysis_stats().total_analyzed, 3);
    }

    #[test]
    fn test_event_log_and_score_are_capped() {
        let engine = PsychEngine::new();
        let mut sink = ProtectionSink::default();
        let mut source =
            std::iter::repeat_with(|| CapturedContent::new("sou um perdedor", "tiktok")).take(600);

        let summary = ProtectionPipeline::new(&engine).run(&mut source, &mut sink);
        assert_eq!(summary.blocked, 600);
        assert_eq!(sink.events().count(), BLOCKED_EVENT_CAPACITY);
        assert_eq!(sink.stats().posts_blocked, 600);
        assert_eq!(sink.stats().mental_health_score, 100.0);
    }

    #[test]
    fn test_undrained_actions_are_bounded() {
        let engine = PsychEngine::new();
        let mut sink = ProtectionSink::default();
        let mut source = (0..BLOCKED_EVENT_CAPACITY + 250)
            .map(|i| CapturedContent::new(format!("sou um perdedor {i}"), "tiktok"));

        let summary = ProtectionPipeline::new(&engine).run(&mut source, &mut sink);
        assert_eq!(summary.blocked, BLOCKED_EVENT_CAPACITY + 250);

        let actions = sink.drain_actions();
        assert_eq!(actions.len(), BLOCKED_EVENT_CAPACITY);
        assert!(sink.drain_actions().is_empty());
        assert_eq!(sink.stats().posts_blocked, (BLOCKED_EVENT_CAPACITY + 250) as u64);
    }

    #[test]
    fn test_pipeline_counts_engine_failures() {
        let engine = PsychEngine::new();
        engine.cleanup();
        let mut sink = ProtectionSink::default();
        let mut source = captures().into_iter();

        let summary = ProtectionPipeline::new(&engine).run(&mut source, &mut sink);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.processed, 0);
        assert_eq!(sink.events().count(), 0);
    }

    struct RejectingSink;

    impl AssessmentSink for RejectingSink {
        fn accept(&mut self, _: &CapturedContent, _: &Assessment) -> Result<(), EngineError> {
            Err(EngineError::PersistenceFailure("closed".to_string()))
        }
    }

    #[test]
    fn test_sink_errors_do_not_stop_the_run() {
        let engine = PsychEngine::new();
        let mut source = captures().into_iter();
        let summary = ProtectionPipeline::new(&engine).run(&mut source, &mut RejectingSink);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.sink_errors, 3);
    }

    #[test]
    fn test_captured_content_accepts_app_context_key() {
        let content: CapturedContent =
            serde_json::from_str(r#"{"text":"oi","appContext":"tiktok"}"#).unwrap();
        assert_eq!(content, CapturedContent::new("oi", "tiktok"));
    }
}
