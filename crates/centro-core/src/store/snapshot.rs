// ── Snapshot and merge rules ──
//
// A published snapshot only ever grows: both merges overlay new values on
// the previous map, so a key disappears only when the process restarts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use centro_api::{FieldValue, ParamMap};

/// Which acquisition path produced a snapshot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SnapshotSource {
    /// Nothing published yet.
    #[default]
    Empty,
    /// A telemetry frame was overlaid.
    Telemetry,
    /// Full refresh with a successful portal pull.
    Pulled,
    /// Full refresh whose pull failed; only live telemetry was merged.
    Degraded,
}

/// Immutable merged view of the boiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub params: ParamMap,
    pub source: SnapshotSource,
    pub published_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub(crate) fn published(params: ParamMap, source: SnapshotSource) -> Self {
        Self {
            params,
            source,
            published_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.params.get(key)
    }

    /// Numeric view of a field; numeric-looking text is parsed.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn overlay(mut base: ParamMap, top: &ParamMap) -> ParamMap {
    base.extend(top.iter().map(|(k, v)| (k.clone(), v.clone())));
    base
}

/// Telemetry event: `previous ∪ delta`, delta wins.
pub fn merge_telemetry(previous: &ParamMap, delta: &ParamMap) -> ParamMap {
    overlay(previous.clone(), delta)
}

/// Full refresh: `previous ∪ live ∪ pulled`, later maps win.
///
/// `pulled` is `None` when the portal pull failed, in which case the
/// previous snapshot is only refreshed from live telemetry.
pub fn merge_refresh(previous: &ParamMap, live: &ParamMap, pulled: Option<&ParamMap>) -> ParamMap {
    let merged = overlay(previous.clone(), live);
    match pulled {
        Some(pulled) => overlay(merged, pulled),
        None => merged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(entries: &[(&str, FieldValue)]) -> ParamMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn telemetry_values_overwrite_previous() {
        let previous = map(&[("B_Tk1", 60.0.into()), ("B_STATE", "OFF".into())]);
        let delta = map(&[("B_Tk1", 62.5.into())]);

        let merged = merge_telemetry(&previous, &delta);

        for (key, value) in &delta {
            assert_eq!(merged.get(key), Some(value));
        }
        assert_eq!(merged["B_STATE"], FieldValue::from("OFF"));
    }

    #[test]
    fn telemetry_merge_is_idempotent() {
        let previous = map(&[("B_Tk1", 60.0.into())]);
        let delta = map(&[("B_Tk1", 61.0.into()), ("B_fan", 1200.0.into())]);

        let once = merge_telemetry(&previous, &delta);
        let twice = merge_telemetry(&once, &delta);

        assert_eq!(once, twice);
    }

    #[test]
    fn pulled_values_win_over_live() {
        let live = map(&[("X", 1.0.into())]);
        let pulled = map(&[("X", 2.0.into())]);

        let merged = merge_refresh(&ParamMap::new(), &live, Some(&pulled));

        assert_eq!(merged["X"], FieldValue::Number(2.0));
    }

    #[test]
    fn live_values_win_over_previous() {
        let previous = map(&[("X", 1.0.into())]);
        let live = map(&[("X", 3.0.into())]);

        let merged = merge_refresh(&previous, &live, Some(&ParamMap::new()));

        assert_eq!(merged["X"], FieldValue::Number(3.0));
    }

    #[test]
    fn failed_pull_keeps_previous_keys() {
        let previous = map(&[("Y", 5.0.into())]);

        let merged = merge_refresh(&previous, &ParamMap::new(), None);

        assert_eq!(merged["Y"], FieldValue::Number(5.0));
    }

    #[test]
    fn empty_pull_removes_nothing() {
        let previous = map(&[("PVAL_3_0", 82.0.into()), ("B_Tk1", 64.0.into())]);

        let merged = merge_refresh(&previous, &ParamMap::new(), Some(&ParamMap::new()));

        assert_eq!(merged, previous);
    }

    #[test]
    fn snapshot_numeric_lookup_parses_text() {
        let snap = Snapshot::published(
            map(&[("PVAL_3_0", "82".into()), ("B_STATE", "S7-1".into())]),
            SnapshotSource::Pulled,
        );

        assert_eq!(snap.get_f64("PVAL_3_0"), Some(82.0));
        assert_eq!(snap.get_f64("B_STATE"), None);
        assert!(snap.published_at.is_some());
        assert_eq!(snap.source.to_string(), "pulled");
    }
}
