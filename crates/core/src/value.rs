// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter value types for the TR-181 data model.
//!
//! Values persisted in the KV database are always textual; a
//! [`ParamType`] is applied at read/write time to interpret or format that
//! text. [`ParamValue`] is the typed in-memory form produced by a successful
//! parse.

use crate::error::UspError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The TR-181 leaf types a [`Parameter`](crate::schema::Parameter) may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    String,
    Int,
    UnsignedInt,
    Boolean,
    DateTime,
    Base64,
}

crate::simple_display! {
    ParamType {
        String => "string",
        Int => "int",
        UnsignedInt => "unsignedInt",
        Boolean => "boolean",
        DateTime => "dateTime",
        Base64 => "base64",
    }
}

/// Read/write access declared on a parameter definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl Access {
    pub fn is_writable(&self) -> bool {
        matches!(self, Access::ReadWrite)
    }
}

/// Where a parameter's value is sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    /// Value lives in the KV database; Get reads it, Set buffers+persists it.
    InDb,
    /// Value is computed by a vendor getter at read time; never persisted.
    VendorComputed,
    /// Fixed value baked into the registration; never persisted, never writable.
    Constant,
}

/// A typed parameter value, parsed from or destined for the textual DB form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParamValue {
    String(String),
    Int(i64),
    UnsignedInt(u64),
    Boolean(bool),
    /// RFC 3339 timestamp, stored verbatim.
    DateTime(String),
    /// Standard base64 (not url-safe), stored verbatim.
    Base64(String),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::String(_) => ParamType::String,
            ParamValue::Int(_) => ParamType::Int,
            ParamValue::UnsignedInt(_) => ParamType::UnsignedInt,
            ParamValue::Boolean(_) => ParamType::Boolean,
            ParamValue::DateTime(_) => ParamType::DateTime,
            ParamValue::Base64(_) => ParamType::Base64,
        }
    }

    /// Render the textual form persisted in the KV database.
    pub fn to_db_string(&self) -> String {
        match self {
            ParamValue::String(s) => s.clone(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::UnsignedInt(v) => v.to_string(),
            ParamValue::Boolean(v) => v.to_string(),
            ParamValue::DateTime(v) => v.clone(),
            ParamValue::Base64(v) => v.clone(),
        }
    }

    /// Parse a DB-stored string according to `ty`, the way `Get`/`Set`
    /// interpret a raw row: values persisted in the DB are always textual,
    /// and a type is applied at read/write time.
    pub fn parse(ty: ParamType, raw: &str) -> Result<Self, UspError> {
        Ok(match ty {
            ParamType::String => ParamValue::String(raw.to_string()),
            ParamType::Int => ParamValue::Int(
                raw.parse()
                    .map_err(|_| UspError::InvalidValue(format!("not an int: {raw}")))?,
            ),
            ParamType::UnsignedInt => ParamValue::UnsignedInt(
                raw.parse()
                    .map_err(|_| UspError::InvalidValue(format!("not an unsignedInt: {raw}")))?,
            ),
            ParamType::Boolean => ParamValue::Boolean(match raw {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(UspError::InvalidValue(format!("not a boolean: {raw}"))),
            }),
            ParamType::DateTime => {
                if raw.is_empty() {
                    return Err(UspError::InvalidValue("empty dateTime".into()));
                }
                ParamValue::DateTime(raw.to_string())
            }
            ParamType::Base64 => {
                if !is_base64(raw) {
                    return Err(UspError::InvalidValue(format!("not valid base64: {raw}")));
                }
                ParamValue::Base64(raw.to_string())
            }
        })
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

fn is_base64(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if s.len() % 4 != 0 {
        return false;
    }
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
