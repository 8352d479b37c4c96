// IPC message types for the control loop
//
// One JSON object per line in both directions. A request line is either
// an array of active key identifiers (movement) or a {"command": ...}
// object; responses echo the shapes the supervisor expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::motor::kinematics::KeyState;

// Wire identifiers for the directional keys
pub const KEY_FORWARD: &str = "w";
pub const KEY_BACKWARD: &str = "s";
pub const KEY_LEFT: &str = "a";
pub const KEY_RIGHT: &str = "d";

/// Request parsing failures; both produce an error envelope, never a
/// loop exit.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),
}

/// The set of key identifiers currently held, as received.
///
/// Unknown identifiers are tolerated and ignored; the raw array is
/// echoed back in the movement response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet(pub Vec<String>);

impl KeySet {
    fn holds(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn key_state(&self) -> KeyState {
        KeyState {
            forward: self.holds(KEY_FORWARD),
            backward: self.holds(KEY_BACKWARD),
            left: self.holds(KEY_LEFT),
            right: self.holds(KEY_RIGHT),
        }
    }
}

/// One parsed request line
#[derive(Debug, Clone)]
pub enum Request {
    Move(KeySet),
    GetDistance,
    GetVoltage,
    GetRoverPowerStats,
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let value: Value =
            serde_json::from_str(line).map_err(|e| RequestError::Malformed(e.to_string()))?;

        match value {
            Value::Array(_) => {
                let keys: KeySet = serde_json::from_value(value)
                    .map_err(|e| RequestError::Malformed(e.to_string()))?;
                Ok(Request::Move(keys))
            }
            Value::Object(map) => {
                let command = map
                    .get("command")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RequestError::Malformed("missing command field".into()))?;
                match command {
                    "get_distance" => Ok(Request::GetDistance),
                    "get_voltage" => Ok(Request::GetVoltage),
                    "get_rover_power_stats" => Ok(Request::GetRoverPowerStats),
                    other => Err(RequestError::UnsupportedCommand(other.to_string())),
                }
            }
            _ => Err(RequestError::Malformed(
                "expected a key array or a command object".into(),
            )),
        }
    }
}

/// Left/right setpoints as echoed in the movement response
#[derive(Debug, Serialize)]
pub struct MotorPair {
    #[serde(rename = "L")]
    pub left: i16,
    #[serde(rename = "R")]
    pub right: i16,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub status: &'static str,
    pub motors: MotorPair,
    pub keys: KeySet,
    pub voltage: Option<f64>,
}

/// Per-channel distance totals, keyed by board identity
#[derive(Debug, Serialize)]
pub struct DistanceValues {
    #[serde(rename = "M1")]
    pub m1: f64,
    #[serde(rename = "M2")]
    pub m2: f64,
    #[serde(rename = "M3")]
    pub m3: f64,
    #[serde(rename = "M4")]
    pub m4: f64,
}

impl From<[f64; 4]> for DistanceValues {
    fn from(totals: [f64; 4]) -> Self {
        Self {
            m1: totals[0],
            m2: totals[1],
            m3: totals[2],
            m4: totals[3],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub values: DistanceValues,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VoltageResponse {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: Option<f64>,
    pub unit: &'static str,
    pub distance: f64,
}

#[derive(Debug, Serialize)]
pub struct PowerStatsResponse {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub voltage: Option<f64>,
    pub percentage: Option<f64>,
    pub distance: f64,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

/// One serialized response line
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Move(MoveResponse),
    Distance(DistanceResponse),
    Voltage(VoltageResponse),
    PowerStats(PowerStatsResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn moved(speeds_left: i16, speeds_right: i16, keys: KeySet, voltage: Option<f64>) -> Self {
        Response::Move(MoveResponse {
            status: "ok",
            motors: MotorPair {
                left: speeds_left,
                right: speeds_right,
            },
            keys,
            voltage,
        })
    }

    pub fn distance(values: [f64; 4]) -> Self {
        Response::Distance(DistanceResponse {
            status: "ok",
            kind: "distance",
            values: values.into(),
            unit: "mm",
        })
    }

    pub fn voltage(value: Option<f64>, distance: f64) -> Self {
        Response::Voltage(VoltageResponse {
            status: "ok",
            kind: "voltage",
            value,
            unit: "V",
            distance,
        })
    }

    pub fn power_stats(voltage: Option<f64>, percentage: Option<f64>, distance: f64) -> Self {
        Response::PowerStats(PowerStatsResponse {
            status: "ok",
            kind: "power_stats",
            voltage,
            percentage,
            distance,
            unit: "V",
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            status: "error",
            message: message.into(),
        })
    }
}
