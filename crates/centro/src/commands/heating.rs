//! Heating command: switch the boiler between heat and off.

use serde::Serialize;

use centro_core::{Controller, HvacMode};

use crate::cli::{GlobalOpts, HeatingArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct HeatingResult {
    name: String,
    requested: HvacMode,
    mode: HvacMode,
    current_temperature: Option<f64>,
}

pub async fn handle(
    controller: &Controller,
    args: &HeatingArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let climate = controller.points().climate;
    let requested = if args.state.is_on() {
        HvacMode::Heat
    } else {
        HvacMode::Off
    };

    if !climate.set_hvac_mode(requested).await {
        return Err(CliError::CommandFailed {
            point: climate.name().into(),
        });
    }

    let result = HeatingResult {
        name: climate.name().to_owned(),
        requested,
        mode: climate.hvac_mode(),
        current_temperature: climate.current_temperature(),
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &result,
        |r| {
            let temp = r
                .current_temperature
                .map(|t| format!(", boiler at {t} °C"))
                .unwrap_or_default();
            format!(
                "{}: {}{temp}",
                r.name,
                output::paint_state(&r.mode.to_string(), color)
            )
        },
        |r| r.mode.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
