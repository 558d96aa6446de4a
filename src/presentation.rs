//! Presentation surface derived from tracker snapshots.
//!
//! Nothing here holds state of its own: a [`Dashboard`] is rebuilt from a
//! [`TrackerSnapshot`] on every change and rendered either as plain text or
//! as JSON.

use std::fmt;

use serde::Serialize;

use crate::sample_generator::{Sample, TIME_FORMAT};
use crate::tracker::TrackerSnapshot;

/// Axis range used when there are no samples to derive one from.
pub const DEFAULT_AXIS_DOMAIN: AxisDomain = AxisDomain { min: 0, max: 1 };

/// Width of the widest chart bar, in characters.
const CHART_WIDTH: usize = 30;

/// Vertical axis range of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisDomain {
    pub min: i64,
    pub max: i64,
}

impl AxisDomain {
    /// `[min(count) - 1, max(count) + 1]` over `samples`, or
    /// [`DEFAULT_AXIS_DOMAIN`] when `samples` is empty.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut counts = samples.iter().map(|s| i64::from(s.count));
        let Some(first) = counts.next() else {
            return DEFAULT_AXIS_DOMAIN;
        };

        let (min, max) = counts.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
        Self {
            min: min - 1,
            max: max + 1,
        }
    }

    pub fn span(&self) -> i64 {
        self.max - self.min
    }
}

/// Large count display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountTile {
    pub title: String,
    pub count: u32,
    pub label: &'static str,
}

/// One row of the recent changes list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRow {
    pub label: &'static str,
    pub time: String,
}

/// Chart series plus its axis range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub series: Vec<Sample>,
    pub domain: AxisDomain,
}

/// Everything the display needs, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub tile: CountTile,

    /// Newest first
    pub recent_changes: Vec<ChangeRow>,

    pub chart: ChartData,
}

impl Dashboard {
    pub fn from_snapshot(facility: &str, snapshot: &TrackerSnapshot) -> Self {
        let tile = CountTile {
            title: format!("{} Capacity Tracker", facility),
            count: snapshot.count,
            label: "Attendees",
        };

        let recent_changes = snapshot
            .events
            .iter()
            .rev()
            .map(|event| ChangeRow {
                label: event.kind.label(),
                time: event.timestamp.format(TIME_FORMAT).to_string(),
            })
            .collect();

        let chart = ChartData {
            domain: AxisDomain::from_samples(&snapshot.samples),
            series: snapshot.samples.clone(),
        };

        Self {
            tile,
            recent_changes,
            chart,
        }
    }

    /// Plain-text rendering: tile, recent changes, then a horizontal bar chart.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.tile.title)?;
        writeln!(f, "{} {}", self.tile.count, self.tile.label)?;
        writeln!(f)?;

        writeln!(f, "Recent Changes")?;
        if self.recent_changes.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for row in &self.recent_changes {
            writeln!(f, "  {:<10} {}", row.label, row.time)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Capacity Over Time [{}..{}]",
            self.chart.domain.min, self.chart.domain.max
        )?;
        if self.chart.series.is_empty() {
            writeln!(f, "  (no data)")?;
        }
        for sample in &self.chart.series {
            let bar = "#".repeat(bar_width(sample.count, self.chart.domain));
            writeln!(
                f,
                "  {} |{:<width$} {}",
                sample.time,
                bar,
                sample.count,
                width = CHART_WIDTH
            )?;
        }

        Ok(())
    }
}

/// Scale `count` into `0..=CHART_WIDTH` within `domain`.
fn bar_width(count: u32, domain: AxisDomain) -> usize {
    let span = domain.span();
    if span <= 0 {
        return 0;
    }

    let offset = (i64::from(count) - domain.min).clamp(0, span);
    (offset as usize * CHART_WIDTH) / span as usize
}

/// One-line JSON rendering of a snapshot.
pub fn render_json(snapshot: &TrackerSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}
