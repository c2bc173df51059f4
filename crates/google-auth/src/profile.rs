//! User profile returned by the userinfo endpoint
//!
//! The userinfo payload is kept exactly as the provider sent it and carried
//! whole into the session token. Google's v2 field names get typed getters;
//! a getter returns `None` when the field is absent or has another JSON type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile of the signed-in user: the raw userinfo object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and hosts minting sessions.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Provider-assigned account identifier. Numeric ids are rendered as text.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    pub fn verified_email(&self) -> Option<bool> {
        self.0.get("verified_email").and_then(Value::as_bool)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn given_name(&self) -> Option<&str> {
        self.str_field("given_name")
    }

    pub fn family_name(&self) -> Option<&str> {
        self.str_field("family_name")
    }

    /// Avatar URL
    pub fn picture(&self) -> Option<&str> {
        self.str_field("picture")
    }

    pub fn locale(&self) -> Option<&str> {
        self.str_field("locale")
    }

    /// Email if present, otherwise the account id. Used in log lines.
    pub fn display_id(&self) -> String {
        self.email()
            .map(str::to_owned)
            .or_else(|| self.id())
            .unwrap_or_else(|| "<unknown>".to_owned())
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
