// Operator commands sent from the dashboard to the rover.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Autonav,
    Calibrate,
    Estop,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Autonav => "AUTONAV",
            CommandKind::Calibrate => "CALIBRATE",
            CommandKind::Estop => "ESTOP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AUTONAV" => Some(CommandKind::Autonav),
            "CALIBRATE" => Some(CommandKind::Calibrate),
            "ESTOP" => Some(CommandKind::Estop),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverCommand {
    #[serde(rename = "type")]
    pub kind: CommandKind,
}

impl RoverCommand {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_uses_type_field() {
        let command: RoverCommand = serde_json::from_str(r#"{"type":"ESTOP"}"#).unwrap();
        assert_eq!(command.kind, CommandKind::Estop);
        let encoded = serde_json::to_string(&RoverCommand::new(CommandKind::Autonav)).unwrap();
        assert_eq!(encoded, r#"{"type":"AUTONAV"}"#);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(CommandKind::parse("calibrate"), Some(CommandKind::Calibrate));
        assert_eq!(CommandKind::parse(" estop "), Some(CommandKind::Estop));
        assert_eq!(CommandKind::parse("launch"), None);
    }

    #[test]
    fn unknown_command_type_is_rejected() {
        assert!(serde_json::from_str::<RoverCommand>(r#"{"type":"SELF_DESTRUCT"}"#).is_err());
    }
}
