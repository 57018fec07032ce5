//! Login command: authenticate and report what the portal returned.

use serde::Serialize;

use centro_core::Controller;

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Debug, Serialize)]
struct LoginInfo {
    portal: String,
    email: String,
    install_id: String,
    fields: usize,
}

/// Connecting already logged in; reaching here means the credentials work.
pub fn handle(controller: &Controller, global: &GlobalOpts) {
    let config = controller.config();
    let info = LoginInfo {
        portal: config.portal_url.to_string(),
        email: config.email.clone(),
        install_id: config.install_id.clone(),
        fields: controller.snapshot().len(),
    };
    let out = output::render_single(
        global.output,
        &info,
        |i| {
            format!(
                "Authenticated as {} at {}\nInstallation {}: {} fields",
                i.email, i.portal, i.install_id, i.fields
            )
        },
        |i| i.email.clone(),
    );
    output::print_output(&out, global.quiet);
}
