use std::time::{Duration, Instant};

use log::{info, warn};

use super::classifier::Predictions;
use super::config::PipelineConfig;
use crate::workspace::Workspace;

/// carries everything a stage needs: the workspace handle, the
/// configuration, and a deadline clock. Passed explicitly into every
/// stage function rather than looked up from a global, per spec.md §9
/// Design Notes ("Global state").
pub struct PipelineContext {
    pub workspace: Workspace,
    pub config: PipelineConfig,
    deadline: Option<Instant>,
    started_at: Instant,
    vertex_predictions: Predictions,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig) -> Self {
        let region_tag = format!("{}-{}", config.region_key, "run");
        PipelineContext {
            workspace: Workspace::new(region_tag),
            config,
            deadline: None,
            started_at: Instant::now(),
            vertex_predictions: Predictions::new(),
        }
    }

    pub fn set_vertex_predictions(&mut self, predictions: Predictions) {
        self.vertex_predictions = predictions;
    }

    pub fn vertex_predictions(&self) -> &Predictions {
        &self.vertex_predictions
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(self.started_at + deadline);
        self
    }

    pub fn deadline_exceeded(&self) -> bool {
        match self.deadline {
            Some(d) => Instant::now() >= d,
            None => false,
        }
    }

    /// the raw deadline instant, if one was set, for stages (e.g. the
    /// Route Enumerator) that need to hand it to parallel workers rather
    /// than re-check `deadline_exceeded` through a shared `&self`.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn log_stage_start(&self, stage: super::error::Stage) {
        info!("[{stage}] starting, region={}", self.config.region_key);
    }

    pub fn log_stage_done(&self, stage: super::error::Stage, elapsed: Duration) {
        info!("[{stage}] completed in {:?}", elapsed);
    }

    pub fn log_dropped(&self, stage: super::error::Stage, count: usize, reason: &str) {
        if count > 0 {
            warn!("[{stage}] dropped {count} record(s): {reason}");
        }
    }
}
