//! Switch command: turn an on/off control on or off.

use serde::Serialize;

use centro_core::Controller;

use crate::cli::{GlobalOpts, SwitchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SwitchResult {
    point: &'static str,
    name: &'static str,
    requested: bool,
    is_on: Option<bool>,
}

fn state_label(on: Option<bool>) -> &'static str {
    match on {
        Some(true) => "ON",
        Some(false) => "OFF",
        None => "unknown",
    }
}

pub async fn handle(
    controller: &Controller,
    args: &SwitchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let points = controller.points();
    let switch = points
        .switch(&args.point)
        .ok_or_else(|| CliError::point_not_found(&args.point))?;
    let d = switch.descriptor();

    if !switch.set(args.state.is_on()).await {
        return Err(CliError::CommandFailed { point: d.id.into() });
    }

    let result = SwitchResult {
        point: d.id,
        name: d.name,
        requested: args.state.is_on(),
        is_on: switch.is_on(),
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &result,
        |r| {
            format!(
                "{} is {}",
                r.name,
                output::paint_state(state_label(r.is_on), color)
            )
        },
        |r| state_label(r.is_on).to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_switch_state() {
        assert_eq!(state_label(Some(true)), "ON");
        assert_eq!(state_label(Some(false)), "OFF");
        assert_eq!(state_label(None), "unknown");
    }
}
