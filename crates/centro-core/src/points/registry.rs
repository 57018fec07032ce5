//! Static field registry.
//!
//! Every point the bridge exposes is described here once: which field key
//! it reads, how it is labelled, and which [`Transform`] turns the raw
//! value into a [`Reading`]. Writable points carry the portal command they
//! send and the `PVAL_*` key that reflects the result.

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use centro_api::FieldValue;

use super::Reading;

/// Value reported by a temperature probe that is not connected.
pub const DISCONNECTED_SENSOR: f64 = -55.0;

// ── Classification ───────────────────────────────────────────────────

/// Broad category of a point, used for grouping and display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PointKind {
    Temperature,
    Percentage,
    BinaryState,
    Counter,
    Numeric,
    Status,
    Number,
    Switch,
    Climate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

// ── Transform ────────────────────────────────────────────────────────

/// How a raw field value becomes a reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Numbers and text as delivered.
    PassThrough,
    /// Truthiness rendered as `"ON"` / `"OFF"`.
    OnOff,
    /// Numeric, except that `sentinel` reads as unknown.
    SentinelFilter { sentinel: f64 },
}

impl Transform {
    pub fn apply(self, value: Option<&FieldValue>) -> Reading {
        let Some(value) = value else {
            return Reading::Unknown;
        };

        match self {
            Self::PassThrough => Reading::from(value),
            Self::OnOff => {
                let on = value.as_f64().map_or_else(|| value.is_truthy(), |n| n != 0.0);
                Reading::Text(if on { "ON" } else { "OFF" }.into())
            }
            Self::SentinelFilter { sentinel } => match value.as_f64() {
                Some(n) if n == sentinel => Reading::Unknown,
                Some(n) => Reading::Number(n),
                None => Reading::from(value),
            },
        }
    }
}

// ── Descriptors ──────────────────────────────────────────────────────

/// One read-only field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Point id, unique across the registry.
    pub id: &'static str,
    /// Field key in the merged snapshot.
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub icon: &'static str,
    pub kind: PointKind,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub transform: Transform,
}

/// A writable setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumberDescriptor {
    pub id: &'static str,
    /// Portal parameter written by the control call, e.g. `PWR 10`.
    pub command: &'static str,
    /// Status key reflecting the current setpoint.
    pub state_key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: &'static str,
}

impl NumberDescriptor {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && (self.min..=self.max).contains(&value)
    }
}

/// An on/off control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwitchDescriptor {
    pub id: &'static str,
    pub command: &'static str,
    pub state_key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

// ── Table builders ───────────────────────────────────────────────────

const fn temperature(id: &'static str, name: &'static str, key: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        id,
        key,
        name,
        unit: Some("°C"),
        icon: "mdi:thermometer",
        kind: PointKind::Temperature,
        device_class: Some(DeviceClass::Temperature),
        state_class: Some(StateClass::Measurement),
        transform: Transform::SentinelFilter {
            sentinel: DISCONNECTED_SENSOR,
        },
    }
}

const fn percentage(
    id: &'static str,
    name: &'static str,
    key: &'static str,
    icon: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        id,
        key,
        name,
        unit: Some("%"),
        icon,
        kind: PointKind::Percentage,
        device_class: None,
        state_class: Some(StateClass::Measurement),
        transform: Transform::PassThrough,
    }
}

const fn binary(
    id: &'static str,
    name: &'static str,
    key: &'static str,
    icon: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        id,
        key,
        name,
        unit: None,
        icon,
        kind: PointKind::BinaryState,
        device_class: None,
        state_class: Some(StateClass::Measurement),
        transform: Transform::OnOff,
    }
}

const fn counter(
    id: &'static str,
    name: &'static str,
    key: &'static str,
    unit: Option<&'static str>,
    icon: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        id,
        key,
        name,
        unit,
        icon,
        kind: PointKind::Counter,
        device_class: if unit.is_some() {
            Some(DeviceClass::Duration)
        } else {
            None
        },
        state_class: Some(StateClass::TotalIncreasing),
        transform: Transform::PassThrough,
    }
}

const fn numeric(
    id: &'static str,
    name: &'static str,
    key: &'static str,
    unit: Option<&'static str>,
    icon: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        id,
        key,
        name,
        unit,
        icon,
        kind: PointKind::Numeric,
        device_class: None,
        state_class: Some(StateClass::Measurement),
        transform: Transform::PassThrough,
    }
}

// ── Tables ───────────────────────────────────────────────────────────

pub static TEMPERATURE_SENSORS: &[FieldDescriptor] = &[
    temperature("boiler_temperature", "Boiler Temperature", "B_Tk1"),
    temperature("hot_water_temperature", "Hot Water Temperature", "B_Tptv1"),
    temperature("outdoor_temperature", "Outdoor Temperature", "B_Tva1"),
    temperature("buffer_tank_up", "Buffer Tank Up", "B_Tak1"),
    temperature("buffer_tank_down", "Buffer Tank Down", "B_Tak2"),
    temperature("buffer_tank_up_alt", "Buffer Tank Up Alt", "B_Tak1_1"),
    temperature("buffer_tank_down_alt", "Buffer Tank Down Alt", "B_Tak2_1"),
    temperature("flue_gas_temperature", "Flue Gas Temperature", "B_Tdpl1"),
    temperature("hydraulic_crossover", "Hydraulic Crossover", "B_Ths1"),
    temperature("mixer_temperature", "Mixer Temperature", "B_Tpov1"),
    temperature("low_temp_sensor", "Low Temperature Sensor", "B_Tlo1"),
    temperature("circuit1_temperature", "Circuit 1 Temperature", "C1B_Tpol1"),
    temperature("circuit1_temperature_alt", "Circuit 1 Temperature Alt", "C1B_Tpol"),
    temperature("circuit2_temperature", "Circuit 2 Temperature", "C2B_Tpol1"),
    temperature("circuit2_temperature_alt", "Circuit 2 Temperature Alt", "C2B_Tpol"),
    temperature("circuit1_room_temp", "Circuit 1 Room Temp", "C1B_Tsob1"),
    temperature("circuit1_room_temp_alt", "Circuit 1 Room Temp Alt", "C1B_Tsob"),
    temperature("circuit2_room_temp", "Circuit 2 Room Temp", "C2B_Tsob1"),
    temperature("circuit2_room_temp_alt", "Circuit 2 Room Temp Alt", "C2B_Tsob"),
    // K-prefixed keys are reported by older controller firmware.
    temperature("k1_circuit_temperature", "Circuit 1 Flow Temperature", "K1B_Tpol"),
    temperature("k1_circuit_sensor", "Circuit 1 Flow Sensor", "K1B_Tpol1"),
    temperature("k2_circuit_temperature", "Circuit 2 Flow Temperature", "K2B_Tpol"),
    temperature("k2_circuit_sensor", "Circuit 2 Flow Sensor", "K2B_Tpol1"),
    temperature("k1_room_temp", "Circuit 1 Room Temperature", "K1B_Tsob"),
    temperature("k1_room_sensor", "Circuit 1 Room Sensor", "K1B_Tsob1"),
    temperature("k2_room_temp", "Circuit 2 Room Temperature", "K2B_Tsob"),
    temperature("k2_room_sensor", "Circuit 2 Room Sensor", "K2B_Tsob1"),
];

pub static PERCENTAGE_SENSORS: &[FieldDescriptor] = &[
    percentage("oxygen_level", "Oxygen Level", "B_Oxy1", "mdi:molecule"),
    percentage("air_flow_primary", "Air Flow Engine Primary", "B_priS", "mdi:air-filter"),
    percentage("air_flow_secondary", "Air Flow Engine Secondary", "B_secS", "mdi:air-filter"),
];

pub static BINARY_STATE_SENSORS: &[FieldDescriptor] = &[
    binary("fan_state", "Fan State", "B_fan", "mdi:fan"),
    binary("heater_state", "Heater State", "B_gri", "mdi:fire"),
    binary("boiler_pump", "Boiler Pump", "B_Pk", "mdi:pump"),
    binary("pellet_transporter", "Pellet Transporter", "B_puz", "mdi:grain"),
    binary("circuit1_on_off", "Circuit 1 ON/OFF", "C1B_onOff", "mdi:heating-coil"),
    binary("circuit2_on_off", "Circuit 2 ON/OFF", "C2B_onOff", "mdi:heating-coil"),
    binary("boiler_operational", "Boiler Operational", "B_uklKot", "mdi:power"),
    binary("freeze_guard", "Freeze Guard", "B_freezEn", "mdi:snowflake-alert"),
    binary("remote_start_enabled", "Remote Start Enabled", "B_netMon", "mdi:lan"),
    binary("circuit1_pump", "Circuit 1 Pump", "C1B_P", "mdi:pump"),
    binary("circuit2_pump", "Circuit 2 Pump", "C2B_P", "mdi:pump"),
    binary("circuit1_day_night", "Circuit 1 Day/Night", "C1B_dayNight", "mdi:weather-night"),
    binary("circuit2_day_night", "Circuit 2 Day/Night", "C2B_dayNight", "mdi:weather-night"),
    binary("k1_circuit_on_off", "Circuit 1 Enabled", "K1B_onOff", "mdi:heating-coil"),
    binary("k2_circuit_on_off", "Circuit 2 Enabled", "K2B_onOff", "mdi:heating-coil"),
    binary("k1_circuit_pump", "Circuit 1 Pump Running", "K1B_P", "mdi:pump"),
    binary("k2_circuit_pump", "Circuit 2 Pump Running", "K2B_P", "mdi:pump"),
    binary("pump_1", "Boiler Pump Output", "B_P1", "mdi:pump"),
    binary("pump_1_demand", "Boiler Pump Demand", "B_zahP1", "mdi:pump"),
    binary("pump_2", "Second Pump", "B_P2", "mdi:pump"),
    binary("pump_2_demand", "Second Pump Demand", "B_zahP2", "mdi:pump"),
    binary("pump_3", "Third Pump", "B_P3", "mdi:pump"),
    binary("pump_3_demand", "Third Pump Demand", "B_zahP3", "mdi:pump"),
    binary("glow", "Glow", "B_zar", "mdi:campfire"),
];

pub static COUNTER_SENSORS: &[FieldDescriptor] = &[
    counter("cnt_burner_work", "Burner Work Time", "CNT_0", Some("min"), "mdi:fire-circle"),
    counter("cnt_dhw_only", "DHW Only Time", "CNT_1", Some("min"), "mdi:water-boiler"),
    counter("cnt_freeze_protection", "Freeze Protection Time", "CNT_2", Some("min"), "mdi:snowflake"),
    counter("cnt_burner_starts", "Burner Start Count", "CNT_3", None, "mdi:counter"),
    counter("cnt_fan_work", "Fan Work Time", "CNT_4", Some("min"), "mdi:fan-clock"),
    counter("cnt_electric_heater_work", "Electric Heater Work Time", "CNT_5", Some("min"), "mdi:radiator"),
    counter("cnt_electric_heater_starts", "Electric Heater Starts", "CNT_6", None, "mdi:counter"),
    counter("cnt_vacuum_turbine", "Vacuum Turbine Work Time", "CNT_7", Some("min"), "mdi:turbine"),
    counter("cnt_boiler_pump", "Boiler Pump Work Time", "CNT_8", Some("min"), "mdi:pump-off"),
    counter("cnt_9", "Counter 9", "CNT_9", None, "mdi:counter"),
    counter("cnt_10", "Counter 10", "CNT_10", None, "mdi:counter"),
    counter("cnt_11", "Counter 11", "CNT_11", None, "mdi:counter"),
    counter("cnt_12", "Counter 12", "CNT_12", None, "mdi:counter"),
    counter("cnt_13", "Counter 13", "CNT_13", None, "mdi:counter"),
    counter("cnt_14", "Counter 14", "CNT_14", None, "mdi:counter"),
    counter("cnt_15", "Counter 15", "CNT_15", None, "mdi:counter"),
];

pub static NUMERIC_SENSORS: &[FieldDescriptor] = &[
    numeric("pellet_tank_level", "Pellet Tank Level", "B_cmsr100", Some("%"), "mdi:gauge"),
    numeric("fire_sensor", "Fire Sensor", "B_FotV", None, "mdi:fire-alert"),
    numeric("mixing_valve", "Mixing Valve", "B_misP", Some("%"), "mdi:valve"),
    numeric("circuit1_correction", "Circuit 1 Correction", "C1B_kor", Some("°C"), "mdi:thermometer"),
    numeric("circuit2_correction", "Circuit 2 Correction", "C2B_kor", Some("°C"), "mdi:thermometer"),
    numeric("k1_correction", "Circuit 1 Curve Correction", "K1B_kor", Some("°C"), "mdi:thermometer"),
    numeric("k2_correction", "Circuit 2 Curve Correction", "K2B_kor", Some("°C"), "mdi:thermometer"),
    numeric("pellet_on_time", "Pellet Transporter On", "B_puzOn", Some("s"), "mdi:timer"),
    numeric("pellet_off_time", "Pellet Transporter Off", "B_puzOff", Some("s"), "mdi:timer-off"),
    numeric("fan_speed", "Fan Speed", "B_fan", Some("rpm"), "mdi:fan"),
    numeric("cm2k_status", "CM2K Status", "B_cm2k", None, "mdi:state-machine"),
    numeric("pellet_level", "Pellet Level", "B_lvl", None, "mdi:gauge"),
];

pub static NUMBER_CONTROLS: &[NumberDescriptor] = &[
    NumberDescriptor {
        id: "pwr3",
        command: "PWR 3",
        state_key: "PVAL_3_0",
        name: "Boiler Temperature",
        description: "Boiler temperature setpoint",
        icon: "mdi:thermometer",
        min: 75.0,
        max: 90.0,
        step: 1.0,
        unit: "°C",
    },
    NumberDescriptor {
        id: "pwr10",
        command: "PWR 10",
        state_key: "PVAL_10_0",
        name: "DHW Temperature",
        description: "Domestic hot water temperature setpoint",
        icon: "mdi:water-thermometer",
        min: 40.0,
        max: 80.0,
        step: 1.0,
        unit: "°C",
    },
    NumberDescriptor {
        id: "pwr140",
        command: "PWR 140",
        state_key: "PVAL_140_0",
        name: "Day Room Temperature (2nd Circuit)",
        description: "Day room temperature setpoint for 2nd circuit",
        icon: "mdi:home-thermometer",
        min: 5.0,
        max: 30.0,
        step: 0.1,
        unit: "°C",
    },
];

pub static SWITCHES: &[SwitchDescriptor] = &[
    SwitchDescriptor {
        id: "pwr99",
        command: "PWR 99",
        state_key: "PVAL_99_0",
        name: "1st Heating Circuit",
        description: "1st heating circuit control",
        icon: "mdi:radiator",
    },
    SwitchDescriptor {
        id: "pwr129",
        command: "PWR 129",
        state_key: "PVAL_129_0",
        name: "2nd Heating Circuit",
        description: "2nd heating circuit control",
        icon: "mdi:radiator",
    },
];

/// Key carrying the overall boiler state.
pub const STATUS_KEY: &str = "B_STATE";

/// Status attribute name to field key.
pub static STATUS_ATTRIBUTES: &[(&str, &str)] = &[
    ("product_name", "B_PRODNAME"),
    ("brand", "B_BRAND"),
    ("power", "B_sng"),
    ("wifi_version", "B_WifiVER"),
    ("firmware_version", "B_VER"),
    ("installation", "B_INST"),
    ("configuration", "B_KONF"),
    ("configuration_string", "B_KONF_STR"),
    ("command_active", "B_CMD"),
    ("operation_mode", "B_zlj"),
    ("additional_features", "B_Add"),
    ("accessories", "B_AddConf"),
    ("sup_type", "B_SUP_TYPE"),
    ("time", "B_Time"),
];

// ── Lookup ───────────────────────────────────────────────────────────

/// Every read-only sensor descriptor, grouped by kind.
pub fn sensors() -> impl Iterator<Item = &'static FieldDescriptor> {
    TEMPERATURE_SENSORS
        .iter()
        .chain(PERCENTAGE_SENSORS)
        .chain(BINARY_STATE_SENSORS)
        .chain(COUNTER_SENSORS)
        .chain(NUMERIC_SENSORS)
}

/// Find a sensor by point id, falling back to the field key.
pub fn sensor(id_or_key: &str) -> Option<&'static FieldDescriptor> {
    sensors()
        .find(|d| d.id == id_or_key)
        .or_else(|| sensors().find(|d| d.key == id_or_key))
}

/// Find a setpoint by id, command or state key (case-insensitive).
pub fn number(name: &str) -> Option<&'static NumberDescriptor> {
    NUMBER_CONTROLS.iter().find(|d| {
        d.id.eq_ignore_ascii_case(name)
            || d.command.eq_ignore_ascii_case(name)
            || d.state_key.eq_ignore_ascii_case(name)
    })
}

/// Find a switch by id, command or state key (case-insensitive).
pub fn switch(name: &str) -> Option<&'static SwitchDescriptor> {
    SWITCHES.iter().find(|d| {
        d.id.eq_ignore_ascii_case(name)
            || d.command.eq_ignore_ascii_case(name)
            || d.state_key.eq_ignore_ascii_case(name)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn point_ids_are_unique() {
        let mut seen = HashSet::new();
        let ids = sensors()
            .map(|d| d.id)
            .chain(NUMBER_CONTROLS.iter().map(|d| d.id))
            .chain(SWITCHES.iter().map(|d| d.id))
            .chain(["status", "climate"]);
        for id in ids {
            assert!(seen.insert(id), "duplicate point id {id}");
        }
    }

    #[test]
    fn temperatures_filter_the_disconnected_sentinel() {
        for d in sensors().filter(|d| d.device_class == Some(DeviceClass::Temperature)) {
            assert_eq!(
                d.transform,
                Transform::SentinelFilter {
                    sentinel: DISCONNECTED_SENSOR
                },
                "{} must filter -55",
                d.key
            );
        }
    }

    #[test]
    fn sentinel_reads_as_unknown() {
        let t = TEMPERATURE_SENSORS[0].transform;
        assert_eq!(t.apply(Some(&FieldValue::Number(-55.0))), Reading::Unknown);
        assert_eq!(t.apply(Some(&FieldValue::Text("-55".into()))), Reading::Unknown);
        assert_eq!(t.apply(Some(&FieldValue::Number(62.5))), Reading::Number(62.5));
        assert_eq!(t.apply(None), Reading::Unknown);
    }

    #[test]
    fn on_off_labels() {
        let t = Transform::OnOff;
        assert_eq!(t.apply(Some(&FieldValue::Number(1.0))), Reading::Text("ON".into()));
        assert_eq!(t.apply(Some(&FieldValue::Number(0.0))), Reading::Text("OFF".into()));
        assert_eq!(t.apply(Some(&FieldValue::Text("0".into()))), Reading::Text("OFF".into()));
        assert_eq!(t.apply(Some(&FieldValue::Number(1450.0))), Reading::Text("ON".into()));
        assert_eq!(t.apply(None), Reading::Unknown);
    }

    #[test]
    fn pass_through_keeps_text() {
        let t = Transform::PassThrough;
        assert_eq!(t.apply(Some(&FieldValue::Text("S7-1".into()))), Reading::Text("S7-1".into()));
        assert_eq!(t.apply(Some(&FieldValue::Number(12.0))), Reading::Number(12.0));
    }

    #[test]
    fn lookups_accept_ids_commands_and_keys() {
        assert_eq!(number("pwr10").map(|d| d.command), Some("PWR 10"));
        assert_eq!(number("PWR 10").map(|d| d.id), Some("pwr10"));
        assert_eq!(number("pval_3_0").map(|d| d.id), Some("pwr3"));
        assert_eq!(switch("PWR 129").map(|d| d.state_key), Some("PVAL_129_0"));
        assert_eq!(sensor("B_Tk1").map(|d| d.id), Some("boiler_temperature"));
        assert_eq!(sensor("fan_speed").map(|d| d.unit), Some(Some("rpm")));
        assert!(number("PWR 99").is_none());
    }

    #[test]
    fn setpoint_ranges() {
        let dhw = number("pwr10").unwrap_or(&NUMBER_CONTROLS[0]);
        assert!(dhw.contains(80.0));
        assert!(dhw.contains(40.0));
        assert!(!dhw.contains(81.0));
        assert!(!dhw.contains(f64::NAN));

        let room = number("pwr140").unwrap_or(&NUMBER_CONTROLS[0]);
        assert!((room.step - 0.1).abs() < f64::EPSILON);
        assert!(room.contains(21.5));
    }
}
