//! Points command: list the registry without connecting.

use serde::Serialize;
use tabled::Tabled;

use centro_core::PointKind;
use centro_core::points::registry::{self, NUMBER_CONTROLS, STATUS_KEY, SWITCHES};

use crate::cli::{GlobalOpts, PointFilter, PointsArgs};
use crate::output;

#[derive(Debug, Serialize)]
struct PointInfo {
    id: &'static str,
    kind: PointKind,
    /// Field key read from the snapshot.
    key: &'static str,
    /// Portal parameter written by control calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'static str>,
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<(f64, f64, f64)>,
}

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "ID")]
    id: &'static str,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Unit")]
    unit: &'static str,
    #[tabled(rename = "Writable")]
    writable: String,
}

impl From<&PointInfo> for PointRow {
    fn from(p: &PointInfo) -> Self {
        let writable = match (p.command, p.range) {
            (Some(cmd), Some((min, max, step))) => format!("{cmd} [{min}..{max} step {step}]"),
            (Some(cmd), None) => cmd.to_owned(),
            (None, _) => String::new(),
        };
        Self {
            id: p.id,
            kind: p.kind.to_string(),
            key: p.key,
            name: p.name,
            unit: p.unit.unwrap_or_default(),
            writable,
        }
    }
}

fn sensors() -> impl Iterator<Item = PointInfo> {
    let status = PointInfo {
        id: "status",
        kind: PointKind::Status,
        key: STATUS_KEY,
        command: None,
        name: "Boiler Status",
        unit: None,
        range: None,
    };
    std::iter::once(status).chain(registry::sensors().map(|d| PointInfo {
        id: d.id,
        kind: d.kind,
        key: d.key,
        command: None,
        name: d.name,
        unit: d.unit,
        range: None,
    }))
}

fn numbers() -> impl Iterator<Item = PointInfo> {
    NUMBER_CONTROLS.iter().map(|d| PointInfo {
        id: d.id,
        kind: PointKind::Number,
        key: d.state_key,
        command: Some(d.command),
        name: d.name,
        unit: Some(d.unit),
        range: Some((d.min, d.max, d.step)),
    })
}

fn switches() -> impl Iterator<Item = PointInfo> {
    let climate = PointInfo {
        id: "climate",
        kind: PointKind::Climate,
        key: "PWR 99",
        command: Some("PWR 99"),
        name: "Boiler heating",
        unit: None,
        range: None,
    };
    SWITCHES
        .iter()
        .map(|d| PointInfo {
            id: d.id,
            kind: PointKind::Switch,
            key: d.state_key,
            command: Some(d.command),
            name: d.name,
            unit: None,
            range: None,
        })
        .chain(std::iter::once(climate))
}

fn catalogue(filter: Option<PointFilter>) -> Vec<PointInfo> {
    match filter {
        Some(PointFilter::Sensors) => sensors().collect(),
        Some(PointFilter::Numbers) => numbers().collect(),
        Some(PointFilter::Switches) => switches().collect(),
        None => sensors().chain(numbers()).chain(switches()).collect(),
    }
}

pub fn handle(args: &PointsArgs, global: &GlobalOpts) {
    let points = catalogue(args.kind);
    let out = output::render_list(
        global.output,
        &points,
        |p| PointRow::from(p),
        |p| p.id.to_owned(),
    );
    output::print_output(&out, global.quiet);
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalogue_ids_are_unique() {
        let all = catalogue(None);
        let ids: HashSet<_> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn filters_partition_the_catalogue() {
        let total = catalogue(None).len();
        let parts = catalogue(Some(PointFilter::Sensors)).len()
            + catalogue(Some(PointFilter::Numbers)).len()
            + catalogue(Some(PointFilter::Switches)).len();
        assert_eq!(parts, total);
    }

    #[test]
    fn numbers_carry_their_range() {
        let pwr10 = catalogue(Some(PointFilter::Numbers))
            .into_iter()
            .find(|p| p.id == "pwr10")
            .and_then(|p| p.range);
        assert_eq!(pwr10, Some((40.0, 80.0, 1.0)));
    }
}
