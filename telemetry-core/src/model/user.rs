// Account roles and the auth response shared by gateway and clients.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by a successful register or login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

/// Error body used for every 4xx/5xx auth answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_uses_underscore_id() {
        let response = AuthResponse {
            id: "abc".to_string(),
            username: "ops".to_string(),
            email: "ops@rover.io".to_string(),
            role: Role::Admin,
            token: "t".to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["role"], "admin");
    }

    #[test]
    fn role_defaults_to_operator() {
        assert_eq!(Role::default(), Role::Operator);
    }
}
