//! Exact storage dtypes and the raw groups they belong to.
//!
//! A [`RawDtype`] is the physical type a column was stored with when the
//! stage was fitted (`int16` and `int64` are different dtypes). A
//! [`RawGroup`] is the coarse family used for feature selection queries
//! (both of those dtypes are in the `int` group).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MetadataError;

/// Coarse raw type family of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawGroup {
    /// Signed and unsigned integers of any width.
    Int,
    /// Floating point of any width.
    Float,
    /// Strings and other opaque values.
    Object,
    /// Categorical columns. Never produced by dtype inference, only declared.
    Category,
    /// Dates and datetimes of any resolution.
    Datetime,
    /// Booleans.
    Bool,
}

impl RawGroup {
    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RawGroup::Int => "int",
            RawGroup::Float => "float",
            RawGroup::Object => "object",
            RawGroup::Category => "category",
            RawGroup::Datetime => "datetime",
            RawGroup::Bool => "bool",
        }
    }

    /// Returns true for groups whose dtypes cannot hold a missing value
    /// without widening. Only integers qualify.
    pub fn is_null_intolerant(&self) -> bool {
        matches!(self, RawGroup::Int)
    }
}

impl fmt::Display for RawGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RawGroup {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(RawGroup::Int),
            "float" => Ok(RawGroup::Float),
            "object" | "str" | "string" => Ok(RawGroup::Object),
            "category" | "categorical" => Ok(RawGroup::Category),
            "datetime" => Ok(RawGroup::Datetime),
            "bool" | "boolean" => Ok(RawGroup::Bool),
            _ => Err(MetadataError::UnknownRawGroup {
                value: s.to_string(),
            }),
        }
    }
}

/// Exact physical storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RawDtype {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "float32")]
    Float32,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "datetime[ms]")]
    DatetimeMs,
    #[serde(rename = "datetime[us]")]
    DatetimeUs,
    #[serde(rename = "datetime[ns]")]
    DatetimeNs,
}

impl RawDtype {
    /// Every supported dtype, in declaration order.
    pub const ALL: [RawDtype; 16] = [
        RawDtype::Bool,
        RawDtype::Int8,
        RawDtype::Int16,
        RawDtype::Int32,
        RawDtype::Int64,
        RawDtype::UInt8,
        RawDtype::UInt16,
        RawDtype::UInt32,
        RawDtype::UInt64,
        RawDtype::Float32,
        RawDtype::Float64,
        RawDtype::Str,
        RawDtype::Date,
        RawDtype::DatetimeMs,
        RawDtype::DatetimeUs,
        RawDtype::DatetimeNs,
    ];

    /// Returns the canonical name (`int16`, `float32`, `datetime[us]`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            RawDtype::Bool => "bool",
            RawDtype::Int8 => "int8",
            RawDtype::Int16 => "int16",
            RawDtype::Int32 => "int32",
            RawDtype::Int64 => "int64",
            RawDtype::UInt8 => "uint8",
            RawDtype::UInt16 => "uint16",
            RawDtype::UInt32 => "uint32",
            RawDtype::UInt64 => "uint64",
            RawDtype::Float32 => "float32",
            RawDtype::Float64 => "float64",
            RawDtype::Str => "str",
            RawDtype::Date => "date",
            RawDtype::DatetimeMs => "datetime[ms]",
            RawDtype::DatetimeUs => "datetime[us]",
            RawDtype::DatetimeNs => "datetime[ns]",
        }
    }

    /// Returns the raw group this dtype belongs to.
    pub fn group(&self) -> RawGroup {
        match self {
            RawDtype::Bool => RawGroup::Bool,
            RawDtype::Int8
            | RawDtype::Int16
            | RawDtype::Int32
            | RawDtype::Int64
            | RawDtype::UInt8
            | RawDtype::UInt16
            | RawDtype::UInt32
            | RawDtype::UInt64 => RawGroup::Int,
            RawDtype::Float32 | RawDtype::Float64 => RawGroup::Float,
            RawDtype::Str => RawGroup::Object,
            RawDtype::Date | RawDtype::DatetimeMs | RawDtype::DatetimeUs | RawDtype::DatetimeNs => {
                RawGroup::Datetime
            }
        }
    }
}

impl fmt::Display for RawDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RawDtype {
    type Err = MetadataError;

    /// Parses a dtype name, case-insensitively. Accepts a few common aliases
    /// (`object`, `string`, `utf8`, `boolean`, `datetime`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let dtype = match normalized.as_str() {
            "object" | "string" | "utf8" => RawDtype::Str,
            "boolean" => RawDtype::Bool,
            "datetime" => RawDtype::DatetimeUs,
            other => RawDtype::ALL
                .into_iter()
                .find(|dtype| dtype.as_str() == other)
                .ok_or_else(|| MetadataError::UnknownDtype {
                    value: s.to_string(),
                })?,
        };
        Ok(dtype)
    }
}
