use std::collections::BTreeMap;

use crate::standings::{SeriesStyle, StandingsMatrix};

pub type Segment = Vec<(f64, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub style: SeriesStyle,
    pub segments: Vec<Segment>,
}

/// Contiguous runs of present values for one competitor column. A missing cell
/// ends the current run, so absence renders as a gap and never as zero.
pub fn line_segments(matrix: &StandingsMatrix, competitor: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current: Segment = Vec::new();
    for row in matrix.rows() {
        match row.get(competitor).flatten() {
            Some(value) => current.push((row.round as f64, value)),
            None => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// One series per matrix column, emphasised series last so they draw on top.
pub fn series_for(
    matrix: &StandingsMatrix,
    styles: &BTreeMap<String, SeriesStyle>,
) -> Vec<ChartSeries> {
    let mut series: Vec<ChartSeries> = matrix
        .competitors()
        .iter()
        .map(|name| ChartSeries {
            name: name.clone(),
            style: styles.get(name).copied().unwrap_or(SeriesStyle::MUTED),
            segments: line_segments(matrix, name),
        })
        .collect();
    series.sort_by_key(|s| s.style.emphasized);
    series
}

pub fn x_bounds(matrix: &StandingsMatrix) -> [f64; 2] {
    match (matrix.rows().first(), matrix.rows().last()) {
        (Some(first), Some(last)) if last.round > first.round => {
            [first.round as f64, last.round as f64]
        }
        (Some(first), _) => [first.round as f64 - 0.5, first.round as f64 + 0.5],
        _ => [0.0, 1.0],
    }
}

pub fn y_bounds(matrix: &StandingsMatrix) -> [f64; 2] {
    let Some((lo, hi)) = matrix.value_range() else {
        return [0.0, 1.0];
    };
    let lo = lo.min(0.0);
    let span = (hi - lo).max(1.0);
    [lo, hi + span * 0.05]
}

/// Axis labels at both ends and the midpoint.
pub fn axis_labels(bounds: [f64; 2]) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| format!("{v:.0}"))
        .collect()
}
