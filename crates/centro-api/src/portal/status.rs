// Installation status endpoint
//
// The portal keeps the last value of every boiler parameter. Only the
// `PVAL_*` entries are consumed: they carry setpoints and switch states,
// including ones the user just changed that telemetry has not echoed yet.

use reqwest::StatusCode;
use tracing::{debug, warn};

use super::API_STATUS;
use crate::error::Error;
use crate::portal::client::PortalClient;
use crate::portal::models::InstallationStatus;
use crate::value::{FieldValue, ParamMap};

/// Reserved key prefix of consumed status parameters.
pub const STATUS_PARAM_PREFIX: &str = "PVAL_";

/// Flatten a status body into a [`ParamMap`].
///
/// Keeps `PVAL_*` keys, unwraps `{v, ut}` envelopes and coerces
/// numeric-looking strings to floats. Entries with a non-scalar `v` are
/// dropped.
pub fn extract_status_params(status: InstallationStatus) -> ParamMap {
    status
        .params
        .into_iter()
        .filter(|(key, _)| key.starts_with(STATUS_PARAM_PREFIX))
        .filter_map(|(key, envelope)| FieldValue::coerce_json(&envelope.v).map(|v| (key, v)))
        .collect()
}

impl PortalClient {
    /// Fetch the installation status, reporting the exact failure.
    pub async fn try_fetch_status(&self) -> Result<ParamMap, Error> {
        self.ensure_session().await?;

        let url = self.url(&format!("{API_STATUS}{}", self.install_id()))?;
        debug!("GET {}", url);

        let resp = self
            .http()
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status.is_redirection() || status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("session expired (HTTP {status})"),
            });
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        let body: InstallationStatus =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        let params = extract_status_params(body);
        debug!(count = params.len(), "installation status decoded");
        Ok(params)
    }

    /// Fetch the installation status; an empty map on any failure.
    pub async fn fetch_status(&self) -> ParamMap {
        match self.try_fetch_status().await {
            Ok(params) => params,
            Err(e) => {
                if e.invalidates_session() {
                    self.invalidate_session();
                }
                warn!(error = %e, "status fetch failed");
                ParamMap::new()
            }
        }
    }
}
