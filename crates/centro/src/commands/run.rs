//! Run command: stay connected and print readings as they change.

use tracing::{debug, info};

use centro_core::Controller;
use centro_core::points::PointReading;

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::error::CliError;
use crate::output;

use super::status::{render_readings, snapshot_summary};

/// Readings that differ from the previous round, by unique id.
fn changed(previous: &[PointReading], current: &[PointReading]) -> Vec<PointReading> {
    current
        .iter()
        .filter(|r| {
            previous
                .iter()
                .find(|p| p.unique_id == r.unique_id)
                .is_none_or(|p| p.value != r.value || p.attributes != r.attributes)
        })
        .cloned()
        .collect()
}

fn print_round(readings: &[PointReading], summary: &str, global: &GlobalOpts) {
    if global.quiet || readings.is_empty() {
        return;
    }
    if global.output == OutputFormat::Table {
        println!("── {summary}");
    }
    output::print_output(&render_readings(readings, global), false);
}

pub async fn handle(
    controller: &Controller,
    args: &RunArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let points = controller.points();
    let mut stream = controller.subscribe();

    let mut previous = points.readings();
    print_round(&previous, &snapshot_summary(stream.current()), global);

    info!(points = points.len(), "watching for changes (Ctrl-C to stop)");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, disconnecting");
                break;
            }
            next = stream.changed() => {
                let Some(snapshot) = next else {
                    debug!("snapshot channel closed");
                    break;
                };
                debug!(source = %snapshot.source, fields = snapshot.len(), "snapshot published");

                let current = points.readings();
                let shown = if args.changes_only {
                    changed(&previous, &current)
                } else {
                    current.clone()
                };
                print_round(&shown, &snapshot_summary(&snapshot), global);
                previous = current;
            }
        }
    }
    Ok(())
}
