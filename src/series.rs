use serde::Serialize;

use crate::aggregate::aggregate;
use crate::bucket::bucket;
use crate::color::{Hsl, Theme, border_of, color_of};
use crate::formats::Book;
use crate::normalize::{Bucket, Field};
use crate::order::{OrderMode, order};

/// How a series is derived. Kept next to the series so a selection can
/// re-derive `Other` membership with the same field and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesSpec {
    pub field: Field,
    pub threshold: usize,
    pub order: OrderMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub bucket: Bucket,
    pub count: usize,
    /// Percentage of the series total, rounded to one decimal.
    pub share_percent: f64,
    pub color: Hsl,
    pub border_color: Hsl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    #[serde(flatten)]
    pub spec: SeriesSpec,
    pub total: usize,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|point| point.label.as_str())
    }

    pub fn point(&self, label: &str) -> Option<&SeriesPoint> {
        self.points.iter().find(|point| point.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// records -> normalize -> aggregate -> bucket -> order -> color.
pub fn build_series(books: &[Book], spec: SeriesSpec, theme: &Theme) -> Series {
    let counts = aggregate(books, spec.field);
    let total = counts.total();
    let grouped = bucket(&counts, spec.threshold);

    let points = order(grouped, spec.order)
        .into_iter()
        .map(|entry| {
            let label = entry.bucket.label();
            SeriesPoint {
                color: color_of(&label, theme),
                border_color: border_of(&label, theme),
                share_percent: share_percent(entry.count, total),
                count: entry.count,
                bucket: entry.bucket,
                label,
            }
        })
        .collect();

    Series {
        spec,
        total,
        points,
    }
}

fn share_percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}
