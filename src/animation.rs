//! Year-by-year correlation heatmaps, played back as a finite sequence of
//! frames that can be stopped at any time.

use crate::analysis::correlation::{correlation_matrix, CorrelationMatrix};
use crate::analysis::error::AnalysisError;
use crate::filtering::{FilterSet, InclusionFilter};
use crate::types::columns::YEAR;
use crate::utils::i32_values;
use log::{debug, info};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameContent {
    Matrix(CorrelationMatrix),
    /// The year had too few complete rows for a matrix.
    Warning { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationFrame {
    pub year: i32,
    pub content: FrameContent,
}

/// How a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Every frame of the sequence was sent.
    Completed { frames: usize },
    /// Stopped by the token or because the receiver went away.
    Cancelled { frames: usize },
}

/// Correlation table of one station split by year.
#[derive(Debug, Clone)]
pub struct YearAnimation {
    table: DataFrame,
    variables: Vec<String>,
    years: Vec<i32>,
}

impl YearAnimation {
    /// Fails with `InsufficientVariables` when fewer than two variables are
    /// selected, since no frame could ever be drawn.
    pub fn new(table: DataFrame, variables: &[&str]) -> Result<YearAnimation, AnalysisError> {
        let distinct: BTreeSet<&str> = variables.iter().copied().collect();
        if distinct.len() < 2 {
            return Err(AnalysisError::InsufficientVariables {
                selected: distinct.len(),
            });
        }
        let years: BTreeSet<i32> = i32_values(&table, YEAR)?.into_iter().flatten().collect();
        Ok(YearAnimation {
            table,
            variables: variables.iter().map(|v| v.to_string()).collect(),
            years: years.into_iter().collect(),
        })
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Years visited from `start`: up to the last year going forward, back to
    /// the first year going backward.
    pub fn sequence(&self, start: i32, direction: Direction) -> Result<Vec<i32>, AnalysisError> {
        let index = self
            .years
            .iter()
            .position(|y| *y == start)
            .ok_or_else(|| AnalysisError::InvalidParameter(format!("no data for year {}", start)))?;
        Ok(match direction {
            Direction::Forward => self.years[index..].to_vec(),
            Direction::Backward => self.years[..=index].iter().rev().copied().collect(),
        })
    }

    /// Frame of a single year.
    pub fn frame(&self, year: i32) -> Result<AnimationFrame, AnalysisError> {
        let rows = FilterSet::new()
            .with(InclusionFilter::years([year]))
            .apply(&self.table)?;
        let variables: Vec<&str> = self.variables.iter().map(String::as_str).collect();
        let content = match correlation_matrix(&rows, &variables) {
            Ok(matrix) => FrameContent::Matrix(matrix),
            Err(AnalysisError::InsufficientObservations { found, .. }) => FrameContent::Warning {
                message: format!("No hay correlaciones válidas en {} ({} filas válidas)", year, found),
            },
            Err(e) => return Err(e),
        };
        Ok(AnimationFrame { year, content })
    }

    /// All frames of a sequence, computed eagerly.
    pub fn frames(&self, start: i32, direction: Direction) -> Result<Vec<AnimationFrame>, AnalysisError> {
        self.sequence(start, direction)?
            .into_iter()
            .map(|year| self.frame(year))
            .collect()
    }

    /// Sends the frames of a sequence to `tx`, waiting `delay` between frames.
    /// Cancelling `token` stops playback before the next frame. Calling again
    /// restarts from `start`.
    pub async fn play(
        &self,
        start: i32,
        direction: Direction,
        delay: Duration,
        token: CancellationToken,
        tx: mpsc::Sender<AnimationFrame>,
    ) -> Result<Playback, AnalysisError> {
        let sequence = self.sequence(start, direction)?;
        info!("Playing {} frame(s) from {} ({:?})", sequence.len(), start, direction);

        let mut sent = 0;
        for (i, year) in sequence.iter().enumerate() {
            if token.is_cancelled() {
                return Ok(Playback::Cancelled { frames: sent });
            }
            let frame = self.frame(*year)?;
            if tx.send(frame).await.is_err() {
                debug!("Animation receiver dropped after {} frame(s)", sent);
                return Ok(Playback::Cancelled { frames: sent });
            }
            sent += 1;

            if i + 1 < sequence.len() {
                tokio::select! {
                    _ = token.cancelled() => return Ok(Playback::Cancelled { frames: sent }),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
        Ok(Playback::Completed { frames: sent })
    }
}
