//! Laser current sweep.
//!
//! Steps the pilot laser's injection current across a configured range and
//! triggers one board acquisition per step, handing each decoded
//! [`SampleSet`] plus a fresh metadata snapshot to a [`SampleSink`]. Values
//! the current writer's validator refuses are logged and skipped; everything
//! else surfaces as an error and aborts the sweep.

use crate::device::m6812::M6812;
use crate::device::pilot::Pilot;
use crate::error::{AppResult, DaqError};
use crate::frame::SampleSet;
use crate::metadata::MetadataMap;
use crate::transport::Transport;
use log::{info, warn};
use serde::Deserialize;

/// Inclusive stepped values from `from` towards `to`.
///
/// Classic numeric step-loop semantics: values are produced while they have
/// not passed `to` in the direction of `step`; an endpoint that lands
/// exactly is included. A `from` already past `to` yields nothing, not even
/// `from` itself.
pub(crate) fn step_values(from: f64, to: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    if step == 0.0 {
        return values;
    }
    let count = ((to - from) / step + 1e-9).floor() as i64;
    if count < 0 {
        return values;
    }
    for i in 0..=count {
        values.push(from + step * i as f64);
    }
    values
}

/// The current range of one sweep, in amps.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScanRange {
    /// First current value.
    pub start: f64,
    /// Last current value (inclusive when the step lands on it).
    pub stop: f64,
    /// Step increment; its sign must point from `start` to `stop`.
    pub step: f64,
}

impl ScanRange {
    /// Check the range is steppable.
    pub fn validate(&self) -> AppResult<()> {
        if self.step == 0.0 {
            return Err(DaqError::Configuration(
                "scan step must be non-zero".to_string(),
            ));
        }
        if (self.stop - self.start) * self.step < 0.0 {
            return Err(DaqError::Configuration(format!(
                "scan step {} points away from stop ({} -> {})",
                self.step, self.start, self.stop
            )));
        }
        Ok(())
    }

    /// The current values of the sweep, in order.
    pub fn currents(&self) -> Vec<f64> {
        step_values(self.start, self.stop, self.step)
    }
}

/// Consumer of one sweep step's output.
pub trait SampleSink {
    /// Persist one step: the commanded current, the metadata snapshot taken
    /// at that step, and the decoded samples.
    fn write_step(
        &mut self,
        current: f64,
        meta: &MetadataMap,
        samples: &SampleSet,
    ) -> AppResult<()>;
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Steps that produced a sample file.
    pub steps: usize,
    /// Current values the validator refused.
    pub rejected: usize,
}

/// Run one current sweep.
///
/// For each value in `range`: set the laser current (validated write),
/// trigger a board acquisition, snapshot the controller and board metadata,
/// and hand everything to `sink`. Rejected current values skip the step with
/// a warning; they do not abort the sweep.
pub fn run_scan<P, B, S>(
    pilot: &mut Pilot<P>,
    board: &mut M6812<B>,
    range: &ScanRange,
    sink: &mut S,
) -> AppResult<ScanSummary>
where
    P: Transport,
    B: Transport,
    S: SampleSink,
{
    range.validate()?;
    let mut summary = ScanSummary::default();

    for current in range.currents() {
        if !pilot.set_laser_current(current)? {
            warn!("laser current {:.3} A rejected by validator, skipping step", current);
            summary.rejected += 1;
            continue;
        }

        let samples = board.sample()?;
        let mut meta = pilot.snapshot()?;
        for (key, value) in &board.meta()? {
            meta.insert(key, value);
        }

        info!(
            "current {:.3} A: {} samples acquired",
            current,
            samples.len()
        );
        sink.write_step(current, &meta, &samples)?;
        summary.steps += 1;
    }

    info!(
        "scan finished: {} steps written, {} rejected",
        summary.steps, summary.rejected
    );
    Ok(summary)
}
