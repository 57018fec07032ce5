//! Status command: print every point once.

use tabled::Tabled;

use centro_core::points::{PointReading, unique_id};
use centro_core::{Controller, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat, StatusArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Key")]
    key: String,
}

impl ReadingRow {
    fn new(r: &PointReading, color: bool) -> Self {
        Self {
            name: r.name.clone(),
            value: output::paint_state(&r.value.to_string(), color),
            unit: r.unit.clone().unwrap_or_default(),
            kind: r.kind.to_string(),
            key: r.key.clone(),
        }
    }
}

/// Render readings in the selected format.
pub(super) fn render_readings(readings: &[PointReading], global: &GlobalOpts) -> String {
    let color = output::should_color(global.color);
    output::render_list(
        global.output,
        readings,
        |r| ReadingRow::new(r, color),
        |r| format!("{}\t{}", r.unique_id, r.value),
    )
}

/// One-line description of where the snapshot came from.
pub(super) fn snapshot_summary(snapshot: &Snapshot) -> String {
    let at = snapshot.published_at.map_or_else(
        || "never".to_owned(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    format!("{} fields, {} at {at}", snapshot.len(), snapshot.source)
}

fn refresh_age(seconds: Option<i64>) -> String {
    match seconds {
        Some(s) => format!("last portal refresh {s}s ago"),
        None => "no portal refresh yet".to_owned(),
    }
}

/// Keep readings matching any of `wanted` (point id, unique id or field key).
fn select(
    readings: Vec<PointReading>,
    install_id: &str,
    wanted: &[String],
) -> Result<Vec<PointReading>, CliError> {
    if wanted.is_empty() {
        return Ok(readings);
    }
    let matches = |r: &PointReading, name: &str| {
        r.key.eq_ignore_ascii_case(name)
            || r.unique_id.eq_ignore_ascii_case(name)
            || r.unique_id
                .eq_ignore_ascii_case(&unique_id(install_id, &name.to_ascii_lowercase()))
    };
    if let Some(missing) = wanted
        .iter()
        .find(|name| !readings.iter().any(|r| matches(r, name)))
    {
        return Err(CliError::point_not_found(missing));
    }
    Ok(readings
        .into_iter()
        .filter(|r| wanted.iter().any(|name| matches(r, name)))
        .collect())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    controller: &Controller,
    args: &StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let install_id = &controller.config().install_id;
    let mut readings = select(controller.points().readings(), install_id, &args.points)?;
    if args.known {
        readings.retain(|r| !r.value.is_unknown());
    }

    output::print_output(&render_readings(&readings, global), global.quiet);
    if global.output == OutputFormat::Table && !global.quiet {
        let age = controller.store().data_age().map(|d| d.num_seconds());
        eprintln!(
            "{}; {}",
            snapshot_summary(&controller.snapshot()),
            refresh_age(age)
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use centro_core::{PointKind, Reading};

    use super::*;

    fn reading(id: &str, key: &str, value: Reading) -> PointReading {
        PointReading {
            unique_id: unique_id("1844", id),
            name: id.to_owned(),
            kind: PointKind::Number,
            key: key.to_owned(),
            value,
            unit: None,
            attributes: BTreeMap::new(),
        }
    }

    fn sample() -> Vec<PointReading> {
        vec![
            reading("pwr10", "PVAL_10_0", Reading::Number(60.0)),
            reading("pwr3", "PVAL_3_0", Reading::Unknown),
        ]
    }

    #[test]
    fn empty_selection_keeps_everything() {
        assert_eq!(select(sample(), "1844", &[]).unwrap().len(), 2);
    }

    #[test]
    fn selects_by_point_id_or_key() {
        let by_id = select(sample(), "1844", &["PWR10".into()]).unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].key, "PVAL_10_0");

        let by_key = select(sample(), "1844", &["pval_3_0".into()]).unwrap();
        assert_eq!(by_key[0].unique_id, "centro_1844_pwr3");
    }

    #[test]
    fn unknown_point_is_not_found() {
        let err = select(sample(), "1844", &["nope".into()]).unwrap_err();
        assert!(matches!(err, CliError::NotFound { ref identifier, .. } if identifier == "nope"));
    }

    #[test]
    fn refresh_age_is_reported() {
        assert_eq!(refresh_age(Some(4)), "last portal refresh 4s ago");
        assert_eq!(refresh_age(None), "no portal refresh yet");
    }
}
