// Portal wire types
//
// Request/response bodies for the control and status endpoints.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A set of `{parameter: value}` writes for one installation.
///
/// Parameters are the portal's command names (`"PWR 10"`, `"REFRESH"`).
/// Whole numbers are sent as JSON integers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ControlCommand(BTreeMap<String, Value>);

impl ControlCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-parameter command.
    pub fn set(param: impl Into<String>, value: f64) -> Self {
        Self::new().with(param, value)
    }

    /// Add a parameter to the command.
    pub fn with(mut self, param: impl Into<String>, value: f64) -> Self {
        self.0.insert(param.into(), json_number(value));
        self
    }

    /// Ask the boiler to push a fresh status.
    pub fn refresh() -> Self {
        Self::set("REFRESH", 0.0)
    }

    pub fn get(&self, param: &str) -> Option<&Value> {
        self.0.get(param)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn json_number(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// Body of `POST /api/inst/control/multiple`.
#[derive(Debug, Serialize)]
pub(crate) struct ControlRequest<'a> {
    pub messages: BTreeMap<&'a str, &'a ControlCommand>,
}

impl<'a> ControlRequest<'a> {
    pub fn new(install_id: &'a str, command: &'a ControlCommand) -> Self {
        Self {
            messages: BTreeMap::from([(install_id, command)]),
        }
    }
}

/// Reply of the control endpoint; only `status` matters.
#[derive(Debug, Deserialize)]
pub(crate) struct ControlResponse {
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `GET /wdata/data/installation-status/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct InstallationStatus {
    #[serde(default)]
    pub params: BTreeMap<String, ParamEnvelope>,
}

/// One status parameter: `{"v": value, "ut": updated-at}`.
#[derive(Debug, Deserialize)]
pub struct ParamEnvelope {
    #[serde(default)]
    pub v: Value,
    #[serde(default)]
    pub ut: Option<Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_numbers_serialize_as_integers() {
        let cmd = ControlCommand::set("PWR 10", 80.0);
        assert_eq!(serde_json::to_value(&cmd).unwrap(), json!({"PWR 10": 80}));
    }

    #[test]
    fn fractional_values_keep_precision() {
        let cmd = ControlCommand::set("PWR 140", 21.5);
        assert_eq!(serde_json::to_value(&cmd).unwrap(), json!({"PWR 140": 21.5}));
    }

    #[test]
    fn request_is_keyed_by_installation() {
        let cmd = ControlCommand::refresh();
        let body = ControlRequest::new("1844", &cmd);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"messages": {"1844": {"REFRESH": 0}}})
        );
    }

    #[test]
    fn status_envelope_tolerates_missing_timestamp() {
        let status: InstallationStatus =
            serde_json::from_value(json!({"params": {"PVAL_3_0": {"v": "82"}}})).unwrap();
        assert_eq!(status.params["PVAL_3_0"].v, json!("82"));
        assert!(status.params["PVAL_3_0"].ut.is_none());
    }

    #[test]
    fn display_renders_json() {
        let cmd = ControlCommand::set("PWR 99", 1.0);
        assert_eq!(cmd.to_string(), r#"{"PWR 99":1}"#);
    }
}
