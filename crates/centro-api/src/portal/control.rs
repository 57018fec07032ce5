// Portal control endpoint
//
// Every write to the boiler is a `{param: value}` map posted for the
// configured installation. The portal acknowledges with
// `{"status": "success"}`.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use super::API_CONTROL;
use crate::error::Error;
use crate::portal::client::PortalClient;
use crate::portal::models::{ControlCommand, ControlRequest, ControlResponse};

impl PortalClient {
    /// Send a command, reporting the exact failure.
    ///
    /// Logs in first if there is no session. A single attempt is made;
    /// timeouts and non-200 replies are terminal for this call.
    pub async fn try_send_command(&self, command: &ControlCommand) -> Result<(), Error> {
        self.ensure_session().await?;

        let url = self.url(API_CONTROL)?;
        let body = serde_json::to_vec(&ControlRequest::new(self.install_id(), command)).map_err(
            |e| Error::Deserialization {
                message: e.to_string(),
                body: command.to_string(),
            },
        )?;

        debug!(%command, "POST {}", url);

        let resp = self
            .http()
            .post(url)
            .header(CONTENT_TYPE, "application/json;charset=UTF-8")
            .header(ACCEPT, "application/json, text/plain, */*")
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        let reply: ControlResponse =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        match reply.status.as_deref() {
            Some("success") => Ok(()),
            _ => Err(Error::CommandRejected { message: text }),
        }
    }

    /// Send a command; `true` if the portal accepted it.
    ///
    /// Never fails: every error is logged, the session is dropped, and
    /// `false` is returned.
    pub async fn send_command(&self, command: &ControlCommand) -> bool {
        match self.try_send_command(command).await {
            Ok(()) => {
                debug!(%command, "command accepted");
                true
            }
            Err(e) => {
                if e.invalidates_session() {
                    self.invalidate_session();
                }
                warn!(error = %e, %command, "command failed");
                false
            }
        }
    }

    /// Ask the boiler to publish a fresh status.
    pub async fn refresh_status(&self) -> bool {
        self.send_command(&ControlCommand::refresh()).await
    }

    /// Switch the boiler (first heating circuit) on.
    pub async fn turn_on(&self) -> bool {
        self.send_command(&ControlCommand::set("PWR 99", 1.0)).await
    }

    /// Switch the boiler (first heating circuit) off.
    pub async fn turn_off(&self) -> bool {
        self.send_command(&ControlCommand::set("PWR 99", 0.0)).await
    }
}
