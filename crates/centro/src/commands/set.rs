//! Set command: write a setpoint.

use serde::Serialize;

use centro_core::{Controller, Reading};

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct WriteResult {
    point: &'static str,
    command: &'static str,
    requested: f64,
    current: Reading,
    unit: &'static str,
}

pub async fn handle(
    controller: &Controller,
    args: &SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let points = controller.points();
    let number = points
        .number(&args.point)
        .ok_or_else(|| CliError::point_not_found(&args.point))?;
    let d = number.descriptor();

    number.validate(args.value)?;
    if !number.write(args.value).await {
        return Err(CliError::CommandFailed { point: d.id.into() });
    }

    let result = WriteResult {
        point: d.id,
        command: d.command,
        requested: args.value,
        current: Reading::from(number.value()),
        unit: d.unit,
    };
    let out = output::render_single(
        global.output,
        &result,
        |r| format!("{} set to {} {} (now reads {})", r.point, r.requested, r.unit, r.current),
        |r| r.current.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
