//! Firewall rule set model
//!
//! Typed mirror of the Robot webservice representation:
//!
//! ```json
//! {
//!   "firewall": {
//!     "server_ip": "203.0.113.10",
//!     "server_number": 321,
//!     "status": "active",
//!     "filter_ipv6": false,
//!     "whitelist_hos": true,
//!     "port": "main",
//!     "rules": { "input": [ ... ], "output": [ ... ] }
//!   }
//! }
//! ```
//!
//! Rule fields are tri-state ([`Field`]) because the API distinguishes a key
//! that is missing from a key that is explicitly `null`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A rule field that can be absent, explicitly null, or set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Key not present in the source document
    Absent,
    /// Key present with a `null` value
    Null,
    /// Key present with a value
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    /// Borrow the value, if set
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// True when the key was missing
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// True when the key was present but `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(v) => v.serialize(serializer),
            // Absent is skipped at the struct level; reaching here means null
            Field::Absent | Field::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only called when the key is present; missing keys use Default (Absent)
        Option::<T>::deserialize(deserializer).map(|v| v.map_or(Field::Null, Field::Value))
    }
}

/// Read a known rule field as text
///
/// Robot documents these as strings, but ports can come back as bare
/// numbers. Numbers and booleans keep their JSON text.
fn text_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Field<String>, D::Error> {
    use serde::de::{Error, Unexpected};

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Field::Null),
        Some(Value::String(s)) => Ok(Field::Value(s)),
        Some(Value::Number(n)) => Ok(Field::Value(n.to_string())),
        Some(Value::Bool(b)) => Ok(Field::Value(b.to_string())),
        Some(Value::Array(_)) => Err(D::Error::invalid_type(
            Unexpected::Seq,
            &"a string, number or boolean",
        )),
        Some(Value::Object(_)) => Err(D::Error::invalid_type(
            Unexpected::Map,
            &"a string, number or boolean",
        )),
    }
}

/// Direction of a rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Incoming traffic
    Input,
    /// Outgoing traffic
    Output,
}

impl Direction {
    /// Key used by the API for this direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// A single firewall rule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rule {
    /// "ipv4" or "ipv6"
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub ip_version: Field<String>,

    /// Human-assigned rule name
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub name: Field<String>,

    /// Destination address/CIDR
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub dst_ip: Field<String>,

    /// Source address/CIDR, the field this tool manages
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub src_ip: Field<String>,

    /// Destination port or range
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub dst_port: Field<String>,

    /// Source port or range
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub src_port: Field<String>,

    /// Protocol (tcp, udp, ...)
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub protocol: Field<String>,

    /// TCP flag match
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub tcp_flags: Field<String>,

    /// "accept" or "discard"
    #[serde(
        default,
        deserialize_with = "text_field",
        skip_serializing_if = "Field::is_absent"
    )]
    pub action: Field<String>,

    /// Fields this model does not know about, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rule {
    /// Rule name, if set
    pub fn name(&self) -> Option<&str> {
        self.name.as_value().map(String::as_str)
    }

    /// Known fields in the order the API documents them
    pub fn known_fields(&self) -> [(&'static str, &Field<String>); 9] {
        [
            ("ip_version", &self.ip_version),
            ("name", &self.name),
            ("dst_ip", &self.dst_ip),
            ("src_ip", &self.src_ip),
            ("dst_port", &self.dst_port),
            ("src_port", &self.src_port),
            ("protocol", &self.protocol),
            ("tcp_flags", &self.tcp_flags),
            ("action", &self.action),
        ]
    }
}

/// Input and output rule lists
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rules {
    /// Rules applied to incoming traffic
    #[serde(default)]
    pub input: Vec<Rule>,

    /// Rules applied to outgoing traffic
    #[serde(default)]
    pub output: Vec<Rule>,
}

impl Rules {
    /// Rules for one direction
    pub fn get(&self, direction: Direction) -> &[Rule] {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }
}

/// Complete firewall state for one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRuleSet {
    /// Main IP of the server
    pub server_ip: String,

    /// Robot server number
    pub server_number: u64,

    /// "active", "disabled" or "in process"
    pub status: String,

    /// Whether IPv6 traffic is filtered
    #[serde(default)]
    pub filter_ipv6: bool,

    /// Whether Hetzner services are whitelisted
    #[serde(default)]
    pub whitelist_hos: bool,

    /// Switch port ("main" or "kvm")
    pub port: String,

    /// Rule lists
    #[serde(default)]
    pub rules: Rules,
}

/// Top-level response body of `GET /firewall/{server-id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallEnvelope {
    /// The firewall
    pub firewall: FirewallRuleSet,
}
