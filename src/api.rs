use std::borrow::Cow;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http_cache::{CacheMode, fetch_json};
use crate::http_client::http_client;
use crate::standings::StandingsRecord;
use crate::state::{DriverEntry, DriverStats, GridSlot, RoundPoints, SeasonPodiums};

/// Client for the season data service. Every endpoint is a GET keyed by path
/// segments under `base`.
#[derive(Debug, Clone)]
pub struct Gateway {
    base: Url,
    cache: CacheMode,
}

impl Gateway {
    pub fn new(base_url: &str, use_cache: bool) -> Result<Self> {
        let base = Url::parse(base_url.trim())
            .with_context(|| format!("invalid api base url {base_url:?}"))?;
        if base.cannot_be_a_base() {
            bail!("api base url {base_url:?} cannot carry path segments");
        }
        Ok(Self {
            base,
            cache: if use_cache {
                CacheMode::Revalidate
            } else {
                CacheMode::Bypass
            },
        })
    }

    pub fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow!("api base url cannot carry path segments"))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<String> {
        let client = http_client()?;
        let url = self.endpoint_url(segments)?;
        fetch_json(client, url.as_str(), self.cache)
            .with_context(|| format!("GET {}", url.path()))
    }

    pub fn fetch_drivers(&self) -> Result<Vec<DriverEntry>> {
        parse_drivers_json(&self.get(&["drivers"])?)
    }

    pub fn fetch_driver_stats(&self, driver: &str) -> Result<Option<DriverStats>> {
        parse_driver_stats_json(&self.get(&["driverstats", driver])?)
    }

    pub fn fetch_driver_years(&self, driver: &str) -> Result<Vec<i32>> {
        parse_driver_years_json(&self.get(&["driveryears", driver])?)
    }

    pub fn fetch_driver_points(&self, driver: &str, year: i32) -> Result<Vec<RoundPoints>> {
        let year = year.to_string();
        parse_driver_points_json(&self.get(&["driverpoints", driver, &year])?)
    }

    pub fn fetch_driver_standings(&self, driver: &str, year: i32) -> Result<Vec<StandingsRecord>> {
        let year = year.to_string();
        parse_standings_json(&self.get(&["driverstandings", driver, &year])?)
    }

    pub fn fetch_starting_positions(&self, driver: &str, year: i32) -> Result<Vec<GridSlot>> {
        let year = year.to_string();
        parse_starting_positions_json(&self.get(&["driverstartingpositions", driver, &year])?)
    }

    pub fn fetch_podiums_by_season(&self, driver: &str) -> Result<Vec<SeasonPodiums>> {
        parse_podiums_by_season_json(&self.get(&["driverpodiumsbyseason", driver])?)
    }
}

pub fn parse_drivers_json(raw: &str) -> Result<Vec<DriverEntry>> {
    let Some(root) = parse_root(raw, "drivers")? else {
        return Ok(Vec::new());
    };
    if !root.is_array() {
        bail!("drivers: expected a list");
    }
    serde_json::from_value(root).context("invalid drivers entries")
}

pub fn parse_driver_stats_json(raw: &str) -> Result<Option<DriverStats>> {
    let Some(root) = parse_root(raw, "driverstats")? else {
        return Ok(None);
    };
    if !root.is_object() {
        bail!("driverstats: expected an object");
    }
    serde_json::from_value(root)
        .map(Some)
        .context("invalid driverstats fields")
}

pub fn parse_driver_years_json(raw: &str) -> Result<Vec<i32>> {
    collection(raw, "driveryears", "available_years")
}

pub fn parse_standings_json(raw: &str) -> Result<Vec<StandingsRecord>> {
    let mut records: Vec<StandingsRecord> = collection(raw, "driverstandings", "standings_data")?;
    records.retain(|r| r.round >= 1);
    Ok(records)
}

pub fn parse_driver_points_json(raw: &str) -> Result<Vec<RoundPoints>> {
    let mut rows: Vec<RoundPoints> = collection(raw, "driverpoints", "points_by_round")?;
    rows.sort_by_key(|r| r.round);
    Ok(rows)
}

pub fn parse_starting_positions_json(raw: &str) -> Result<Vec<GridSlot>> {
    let mut rows: Vec<GridSlot> =
        collection(raw, "driverstartingpositions", "starting_positions")?;
    rows.sort_by_key(|r| r.round);
    Ok(rows)
}

pub fn parse_podiums_by_season_json(raw: &str) -> Result<Vec<SeasonPodiums>> {
    let mut rows: Vec<SeasonPodiums> =
        collection(raw, "driverpodiumsbyseason", "podiums_by_season")?;
    rows.sort_by_key(|r| r.year);
    Ok(rows)
}

/// An absent or null `key` is "no data"; anything but a list there is an error.
fn collection<T: DeserializeOwned>(raw: &str, what: &str, key: &str) -> Result<Vec<T>> {
    let Some(root) = parse_root(raw, what)? else {
        return Ok(Vec::new());
    };
    let Value::Object(mut fields) = root else {
        bail!("{what}: expected an object");
    };
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list @ Value::Array(_)) => {
            serde_json::from_value(list).with_context(|| format!("invalid {what} entries"))
        }
        Some(_) => bail!("{what}: expected `{key}` to be a list"),
    }
}

fn parse_root(raw: &str, what: &str) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let cleaned = replace_non_finite_tokens(trimmed);
    let root: Value =
        serde_json::from_str(&cleaned).with_context(|| format!("invalid {what} json"))?;
    Ok(Some(root))
}

/// The service serialises missing floats as bare `NaN` (and occasionally
/// `Infinity`), which is not JSON. Those tokens become `null` outside of string
/// literals.
pub fn replace_non_finite_tokens(raw: &str) -> Cow<'_, str> {
    if !raw.contains("NaN") && !raw.contains("Infinity") {
        return Cow::Borrowed(raw);
    }

    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = raw;
    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(*t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_tokens_outside_strings_become_null() {
        let raw = r#"{"a": NaN, "b": "NaN", "c": [Infinity, -Infinity], "d": "say \"NaN\""}"#;
        let cleaned = replace_non_finite_tokens(raw);
        assert_eq!(
            cleaned,
            r#"{"a": null, "b": "NaN", "c": [null, null], "d": "say \"NaN\""}"#
        );
    }

    #[test]
    fn clean_json_is_borrowed() {
        let raw = r#"{"a": 1}"#;
        assert!(matches!(replace_non_finite_tokens(raw), Cow::Borrowed(_)));
    }

    #[test]
    fn endpoint_url_encodes_segments() {
        let gw = Gateway::new("http://localhost:5000/api/", false).unwrap();
        let url = gw.endpoint_url(&["driverstandings", "max verstappen", "2021"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/driverstandings/max%20verstappen/2021"
        );
    }

    #[test]
    fn endpoint_url_without_trailing_slash() {
        let gw = Gateway::new("http://example.test/api", true).unwrap();
        let url = gw.endpoint_url(&["drivers"]).unwrap();
        assert_eq!(url.as_str(), "http://example.test/api/drivers");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(Gateway::new("mailto:someone@example.test", false).is_err());
        assert!(Gateway::new("not a url", false).is_err());
    }
}
