//! Command dispatch: bridges CLI args -> controller -> output formatting.

pub mod config_cmd;
pub mod heating;
pub mod login;
pub mod points;
pub mod run;
pub mod set;
pub mod status;
pub mod switch;

use centro_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Session};
use crate::error::CliError;

/// Connect, run a portal-bound command, and always disconnect afterwards.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let session = match cmd {
        Command::Run(_) => Session::LongRunning,
        _ => Session::OneShot,
    };
    let controller = Controller::new(config::controller_config(global, session)?);
    controller.connect().await?;

    let result = match cmd {
        Command::Run(args) => run::handle(&controller, &args, global).await,
        Command::Status(args) => status::handle(&controller, &args, global),
        Command::Set(args) => set::handle(&controller, &args, global).await,
        Command::Switch(args) => switch::handle(&controller, &args, global).await,
        Command::Heating(args) => heating::handle(&controller, &args, global).await,
        Command::Login => {
            login::handle(&controller, global);
            Ok(())
        }
        // Local commands are handled before dispatch
        Command::Points(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    };

    controller.disconnect().await;
    result
}
