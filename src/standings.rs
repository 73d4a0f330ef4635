use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One standings observation: a competitor's championship points after a round.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandingsRecord {
    #[serde(deserialize_with = "deserialize_round")]
    pub round: u32,
    #[serde(alias = "driver")]
    pub competitor: String,
    #[serde(alias = "points_standings", default)]
    pub points: Points,
}

impl StandingsRecord {
    pub fn new(round: u32, competitor: impl Into<String>, points: Points) -> Self {
        Self {
            round,
            competitor: competitor.into(),
            points,
        }
    }
}

/// Upstream points value. Anything that is not a finite number (or a string holding
/// one) is kept as `NotANumber` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum Points {
    Value(f64),
    #[default]
    NotANumber,
}

impl Points {
    /// Cell value used by the matrix. Non-numeric points count as zero, which
    /// conflates "did not finish" with "scored nothing".
    pub fn cell_value(self) -> f64 {
        match self {
            Points::Value(v) => v,
            Points::NotANumber => 0.0,
        }
    }
}

impl From<f64> for Points {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Points::Value(v)
        } else {
            Points::NotANumber
        }
    }
}

impl From<Value> for Points {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(Points::from).unwrap_or(Points::NotANumber),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Points::from)
                .unwrap_or(Points::NotANumber),
            _ => Points::NotANumber,
        }
    }
}

pub(crate) fn deserialize_round<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    whole_number(deserializer, "round")
}

pub(crate) fn deserialize_grid_position<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    whole_number(deserializer, "grid position")
}

// Data-frame backed upstreams emit integer columns as floats (3.0) once a
// column holds a missing value anywhere.
fn whole_number<'de, D>(deserializer: D, what: &str) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = f64::deserialize(deserializer)?;
    if raw.fract() != 0.0 || raw < 0.0 || raw > u32::MAX as f64 {
        return Err(D::Error::custom(format!("invalid {what} {raw}")));
    }
    Ok(raw as u32)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoundRow {
    pub round: u32,
    pub cells: BTreeMap<String, Option<f64>>,
}

impl RoundRow {
    /// `None` if the competitor is not a column; `Some(None)` for an explicit gap.
    pub fn get(&self, competitor: &str) -> Option<Option<f64>> {
        self.cells.get(competitor).copied()
    }
}

const ROUND_KEY: &str = "round";

/// Rows go to the chart as flat objects: `{"round": 1, "ham": 10.0, "vet": null}`.
///
/// `round` is reserved in this form. A competitor with that id is left out of the
/// flat row (it stays in the matrix and in `competitors`) so keys stay unique.
impl Serialize for RoundRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let columns = self.cells.iter().filter(|(competitor, _)| *competitor != ROUND_KEY);
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(ROUND_KEY, &self.round)?;
        for (competitor, value) in columns {
            map.serialize_entry(competitor, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StandingsMatrix {
    competitors: Vec<String>,
    rows: Vec<RoundRow>,
}

impl StandingsMatrix {
    pub fn competitors(&self) -> &[String] {
        &self.competitors
    }

    pub fn rows(&self) -> &[RoundRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, round: u32) -> Option<&RoundRow> {
        self.rows
            .binary_search_by_key(&round, |row| row.round)
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Flattens every present cell back into records. Feeding the result to
    /// [`build_matrix`] reproduces this matrix.
    pub fn to_records(&self) -> Vec<StandingsRecord> {
        let mut out = Vec::new();
        for row in &self.rows {
            for (competitor, value) in &row.cells {
                if let Some(v) = value {
                    out.push(StandingsRecord::new(
                        row.round,
                        competitor.clone(),
                        Points::Value(*v),
                    ));
                }
            }
        }
        out
    }

    /// Column projection. Rows are kept even when every retained cell is a gap so
    /// the round axis stays aligned with the full season.
    pub fn retain_competitors(&self, keep: &[&str]) -> StandingsMatrix {
        let competitors: Vec<String> = self
            .competitors
            .iter()
            .filter(|c| keep.contains(&c.as_str()))
            .cloned()
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| RoundRow {
                round: row.round,
                cells: row
                    .cells
                    .iter()
                    .filter(|(c, _)| keep.contains(&c.as_str()))
                    .map(|(c, v)| (c.clone(), *v))
                    .collect(),
            })
            .collect();
        StandingsMatrix { competitors, rows }
    }

    /// Min and max over present cells, `None` when every cell is a gap.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.values().flatten().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Densifies a flat record list into one row per round with a cell for every
/// competitor. Duplicate (round, competitor) records resolve last-seen-wins.
pub fn build_matrix(records: &[StandingsRecord]) -> StandingsMatrix {
    if records.is_empty() {
        return StandingsMatrix::default();
    }

    let mut rounds = BTreeSet::new();
    let mut competitors = BTreeSet::new();
    let mut lookup: BTreeMap<(u32, &str), Points> = BTreeMap::new();
    for record in records {
        rounds.insert(record.round);
        competitors.insert(record.competitor.as_str());
        lookup.insert((record.round, record.competitor.as_str()), record.points);
    }

    let rows = rounds
        .into_iter()
        .map(|round| RoundRow {
            round,
            cells: competitors
                .iter()
                .map(|competitor| {
                    let value = lookup
                        .get(&(round, *competitor))
                        .map(|points| points.cell_value());
                    ((*competitor).to_string(), value)
                })
                .collect(),
        })
        .collect();

    StandingsMatrix {
        competitors: competitors.into_iter().map(str::to_string).collect(),
        rows,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrokeWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesStyle {
    pub emphasized: bool,
    pub stroke_weight: StrokeWeight,
}

impl SeriesStyle {
    pub const HIGHLIGHT: SeriesStyle = SeriesStyle {
        emphasized: true,
        stroke_weight: StrokeWeight::Bold,
    };
    pub const MUTED: SeriesStyle = SeriesStyle {
        emphasized: false,
        stroke_weight: StrokeWeight::Normal,
    };
}

pub fn resolve_style(competitor: &str, subject: &str) -> SeriesStyle {
    if competitor.trim() == subject.trim() {
        SeriesStyle::HIGHLIGHT
    } else {
        SeriesStyle::MUTED
    }
}

pub fn style_map(competitors: &[String], subject: Option<&str>) -> BTreeMap<String, SeriesStyle> {
    competitors
        .iter()
        .map(|competitor| {
            let style = subject
                .map(|s| resolve_style(competitor, s))
                .unwrap_or(SeriesStyle::MUTED);
            (competitor.clone(), style)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_from_json_values() {
        assert_eq!(Points::from(serde_json::json!(12)), Points::Value(12.0));
        assert_eq!(Points::from(serde_json::json!(4.5)), Points::Value(4.5));
        assert_eq!(Points::from(serde_json::json!(" 7 ")), Points::Value(7.0));
        assert_eq!(Points::from(serde_json::json!("DNF")), Points::NotANumber);
        assert_eq!(Points::from(serde_json::json!("NaN")), Points::NotANumber);
        assert_eq!(Points::from(Value::Null), Points::NotANumber);
        assert_eq!(Points::from(serde_json::json!(true)), Points::NotANumber);
        assert_eq!(Points::from(f64::INFINITY), Points::NotANumber);
    }

    #[test]
    fn round_accepts_integral_floats_only() {
        let rec: StandingsRecord =
            serde_json::from_str(r#"{"round": 3.0, "driver": "ham", "points_standings": 40}"#)
                .unwrap();
        assert_eq!(rec.round, 3);
        assert_eq!(rec.competitor, "ham");
        assert_eq!(rec.points, Points::Value(40.0));

        let bad = serde_json::from_str::<StandingsRecord>(
            r#"{"round": 2.5, "driver": "ham", "points_standings": 40}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn missing_points_field_is_not_a_number() {
        let rec: StandingsRecord =
            serde_json::from_str(r#"{"round": 1, "competitor": "vet"}"#).unwrap();
        assert_eq!(rec.points, Points::NotANumber);
    }
}
