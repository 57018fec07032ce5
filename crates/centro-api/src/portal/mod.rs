// Portal API client modules
//
// Hand-written client for the Centrometal web portal: scripted form login,
// control commands and the per-installation status endpoint. Endpoint
// groups are implemented as inherent methods in separate files so that
// `client` stays focused on transport mechanics.

pub mod auth;
pub mod client;
pub mod control;
pub mod models;
pub mod status;

pub use client::PortalClient;
pub use models::{ControlCommand, InstallationStatus, ParamEnvelope};
pub use status::STATUS_PARAM_PREFIX;

/// Production portal root.
pub const DEFAULT_PORTAL_URL: &str = "https://portal.centrometal.hr";

/// Installation id shared by all portal accounts.
pub const DEFAULT_INSTALL_ID: &str = "1844";

pub(crate) const LOGIN_PAGE: &str = "/login";
pub(crate) const LOGIN_CHECK: &str = "/login_check";
pub(crate) const API_CONTROL: &str = "/api/inst/control/multiple";
pub(crate) const API_STATUS: &str = "/wdata/data/installation-status/";
