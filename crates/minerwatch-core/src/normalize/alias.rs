//! Alias table and loosely-typed field access.
//!
//! Firmware variants disagree on key capitalization and naming. Each
//! canonical field lists the keys it has been seen under, in priority
//! order; the first key holding a non-null value wins. New aliases are
//! added here and nowhere else.

use serde_json::{Map, Number, Value};

use crate::error::NormalizeError;

/// Canonical payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Address,
    Name,
    BoardType,
    HashRate,
    Shares,
    Valid,
    Temperature,
    Rssi,
    FreeHeap,
    Uptime,
    Version,
    PoolInUse,
    Power,
    NetDiff,
    PoolDiff,
    LastDiff,
    BestDiff,
    Progress,
    UpdateTime,
}

/// Ordered key aliases per canonical field.
pub const ALIASES: &[(Field, &[&str])] = &[
    (Field::Address, &["ip", "IP"]),
    (Field::Name, &["name", "Name"]),
    (Field::BoardType, &["BoardType"]),
    (Field::HashRate, &["HashRate", "hashrate"]),
    (Field::Shares, &["Share", "shares"]),
    (Field::Valid, &["Valid", "valid"]),
    (Field::Temperature, &["Temp", "temp", "temperature"]),
    (Field::Rssi, &["RSSI"]),
    (Field::FreeHeap, &["FreeHeap"]),
    (Field::Uptime, &["Uptime", "uptime"]),
    (Field::Version, &["Version"]),
    (Field::PoolInUse, &["PoolInUse"]),
    (Field::Power, &["Power", "power"]),
    (Field::NetDiff, &["NetDiff"]),
    (Field::PoolDiff, &["PoolDiff"]),
    (Field::LastDiff, &["LastDiff"]),
    (Field::BestDiff, &["BestDiff"]),
    (Field::Progress, &["Progress"]),
    (Field::UpdateTime, &["UpdateTime"]),
];

impl Field {
    pub fn aliases(self) -> &'static [&'static str] {
        ALIASES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }
}

/// A raw JSON value as seen by the coercion routines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Number(&'a Number),
    Text(&'a str),
    Other(&'a Value),
}

impl<'a> FieldValue<'a> {
    fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(Value::Number(n)) => FieldValue::Number(n),
            Some(Value::String(s)) => FieldValue::Text(s),
            Some(other) => FieldValue::Other(other),
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, FieldValue::Absent)
    }

    /// Number or numeric string. Non-finite values count as unparseable.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => n.as_f64(),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }

    /// Integer or integer string. Fractional numbers are rejected.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|v| v.is_finite() && v.fract() == 0.0)
                    .map(|v| v as i64)
            }),
            FieldValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// String value; numbers are rendered in their JSON form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some((*s).to_string()),
            FieldValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A parsed status report with alias-aware accessors.
#[derive(Debug, Clone)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    /// Parse raw datagram bytes.
    ///
    /// Anything that is not `{...}` after trimming is `NotJson`, which
    /// callers drop silently.
    pub fn parse(data: &[u8]) -> Result<Self, NormalizeError> {
        let text = String::from_utf8_lossy(data);
        let trimmed = text.trim();
        if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
            return Err(NormalizeError::NotJson);
        }

        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(NormalizeError::NotAnObject),
        }
    }

    pub fn get(&self, field: Field) -> FieldValue<'_> {
        field
            .aliases()
            .iter()
            .map(|key| FieldValue::from_value(self.fields.get(*key)))
            .find(FieldValue::is_present)
            .unwrap_or(FieldValue::Absent)
    }

    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field).as_text()
    }

    /// Non-blank trimmed text.
    pub fn non_blank(&self, field: Field) -> Option<String> {
        self.text(field)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        self.get(field).as_f64()
    }

    pub fn integer(&self, field: Field) -> Option<i64> {
        self.get(field).as_i64()
    }

    /// Address embedded in the payload, if any.
    pub fn embedded_address(&self) -> Option<String> {
        self.non_blank(Field::Address)
    }
}
