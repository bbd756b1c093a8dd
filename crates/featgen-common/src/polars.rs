//! Polars dtype and missing-value helpers.
//!
//! This module maps Polars `DataType`s onto [`RawDtype`]/[`RawGroup`] and
//! back, infers a [`FeatureMetadata`] from a frame, and implements the
//! zero-fill used to repair integer features that gained missing values.

use std::collections::BTreeMap;

use ::polars::prelude::{
    AnyValue, BooleanChunked, Column, DataFrame, DataType, FillNullStrategy, Float64Chunked,
    IntoColumn, IntoSeries, NamedFrom, PolarsResult, Series, StringChunked, TimeUnit,
};
use featgen_model::{FeatureMetadata, RawDtype, RawGroup};
use thiserror::Error;

/// A column whose Polars dtype has no featgen equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column '{column}' has unsupported dtype {dtype}")]
pub struct UnsupportedDtype {
    pub column: String,
    pub dtype: String,
}

/// Maps a Polars dtype to its exact [`RawDtype`].
///
/// Returns `None` for nested, categorical and timezone-aware dtypes.
pub fn raw_dtype_of(dtype: &DataType) -> Option<RawDtype> {
    let raw = match dtype {
        DataType::Boolean => RawDtype::Bool,
        DataType::Int8 => RawDtype::Int8,
        DataType::Int16 => RawDtype::Int16,
        DataType::Int32 => RawDtype::Int32,
        DataType::Int64 => RawDtype::Int64,
        DataType::UInt8 => RawDtype::UInt8,
        DataType::UInt16 => RawDtype::UInt16,
        DataType::UInt32 => RawDtype::UInt32,
        DataType::UInt64 => RawDtype::UInt64,
        DataType::Float32 => RawDtype::Float32,
        DataType::Float64 => RawDtype::Float64,
        DataType::String => RawDtype::Str,
        DataType::Date => RawDtype::Date,
        DataType::Datetime(unit, None) => match unit {
            TimeUnit::Milliseconds => RawDtype::DatetimeMs,
            TimeUnit::Microseconds => RawDtype::DatetimeUs,
            TimeUnit::Nanoseconds => RawDtype::DatetimeNs,
        },
        _ => return None,
    };
    Some(raw)
}

/// Maps a [`RawDtype`] back to the Polars dtype used for casting.
pub fn polars_dtype(dtype: RawDtype) -> DataType {
    match dtype {
        RawDtype::Bool => DataType::Boolean,
        RawDtype::Int8 => DataType::Int8,
        RawDtype::Int16 => DataType::Int16,
        RawDtype::Int32 => DataType::Int32,
        RawDtype::Int64 => DataType::Int64,
        RawDtype::UInt8 => DataType::UInt8,
        RawDtype::UInt16 => DataType::UInt16,
        RawDtype::UInt32 => DataType::UInt32,
        RawDtype::UInt64 => DataType::UInt64,
        RawDtype::Float32 => DataType::Float32,
        RawDtype::Float64 => DataType::Float64,
        RawDtype::Str => DataType::String,
        RawDtype::Date => DataType::Date,
        RawDtype::DatetimeMs => DataType::Datetime(TimeUnit::Milliseconds, None),
        RawDtype::DatetimeUs => DataType::Datetime(TimeUnit::Microseconds, None),
        RawDtype::DatetimeNs => DataType::Datetime(TimeUnit::Nanoseconds, None),
    }
}

/// Maps a Polars dtype to its coarse [`RawGroup`].
pub fn raw_group_of(dtype: &DataType) -> Option<RawGroup> {
    raw_dtype_of(dtype).map(|raw| raw.group())
}

/// Infers a registry with the raw group of every column in `df`.
///
/// Fails on the first column whose dtype is unsupported.
pub fn infer_feature_metadata(df: &DataFrame) -> Result<FeatureMetadata, UnsupportedDtype> {
    let mut type_map_raw = BTreeMap::new();
    for column in df.get_columns() {
        let group = raw_group_of(column.dtype()).ok_or_else(|| UnsupportedDtype {
            column: column.name().to_string(),
            dtype: column.dtype().to_string(),
        })?;
        type_map_raw.insert(column.name().to_string(), group);
    }
    Ok(FeatureMetadata::from_raw_types(type_map_raw))
}

/// Counts missing values: nulls, plus NaN for float columns.
pub fn missing_count(column: &Column) -> PolarsResult<usize> {
    let nulls = column.null_count();
    if !column.dtype().is_float() {
        return Ok(nulls);
    }
    let values = column.as_materialized_series().cast(&DataType::Float64)?;
    let nans = values
        .f64()?
        .into_iter()
        .filter(|value| value.is_some_and(f64::is_nan))
        .count();
    Ok(nulls + nans)
}

/// Replaces every missing value in `column` with zero.
///
/// Float columns are returned as `Float64` (NaN counts as missing), string
/// columns get the literal `"0"`, and all-null columns become `Int64` zeros.
/// The caller is expected to cast the result to its final dtype.
pub fn fill_missing_with_zero(column: &Column) -> PolarsResult<Column> {
    let name = column.name().clone();
    let series = column.as_materialized_series();
    let filled = match series.dtype() {
        DataType::Float32 | DataType::Float64 => {
            let values = series.cast(&DataType::Float64)?;
            let filled: Float64Chunked = values
                .f64()?
                .into_iter()
                .map(|value| Some(value.filter(|v| !v.is_nan()).unwrap_or(0.0)))
                .collect();
            filled.with_name(name).into_series()
        }
        DataType::String => {
            let filled: StringChunked = series
                .str()?
                .into_iter()
                .map(|value| Some(value.unwrap_or("0")))
                .collect();
            filled.with_name(name).into_series()
        }
        DataType::Null => Series::new(name, vec![0i64; series.len()]),
        DataType::Boolean => {
            let filled: BooleanChunked = series
                .bool()?
                .into_iter()
                .map(|value| Some(value.unwrap_or(false)))
                .collect();
            filled.with_name(name).into_series()
        }
        _ => series.fill_null(FillNullStrategy::Zero)?,
    };
    Ok(filled.into_column())
}

/// Up to `limit` source values that become null when cast to `target`.
///
/// Used to describe why a strict cast failed.
pub fn uncoercible_samples(
    column: &Column,
    target: &DataType,
    limit: usize,
) -> PolarsResult<Vec<String>> {
    let source = column.as_materialized_series();
    let cast = source.cast(target)?;
    let mask = &source.is_not_null() & &cast.is_null();
    let rejected = source.filter(&mask)?;
    Ok(rejected
        .head(Some(limit))
        .rechunk()
        .iter()
        .map(any_to_string)
        .collect())
}

/// Converts a Polars `AnyValue` to a display string.
///
/// Returns an empty string for `Null` and keeps string values unquoted.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::polars::df;

    #[test]
    fn test_dtype_mapping_round_trips() {
        for dtype in RawDtype::ALL {
            assert_eq!(raw_dtype_of(&polars_dtype(dtype)), Some(dtype));
        }
    }

    #[test]
    fn test_unsupported_dtypes() {
        let nested = DataType::List(Box::new(DataType::Int64));
        assert_eq!(raw_dtype_of(&nested), None);
        assert_eq!(raw_dtype_of(&DataType::Null), None);
    }

    #[test]
    fn test_infer_feature_metadata() {
        let df = df!(
            "a" => [1i64, 2, 3],
            "b" => [1.0f32, 2.0, 3.0],
            "c" => ["x", "y", "z"],
        )
        .unwrap();
        let metadata = infer_feature_metadata(&df).unwrap();
        assert_eq!(metadata.get_feature_type_raw("a"), Some(RawGroup::Int));
        assert_eq!(metadata.get_feature_type_raw("b"), Some(RawGroup::Float));
        assert_eq!(metadata.get_feature_type_raw("c"), Some(RawGroup::Object));
    }

    #[test]
    fn test_missing_count_includes_nan() {
        let df = df!("f" => [Some(1.0f64), None, Some(f64::NAN)]).unwrap();
        assert_eq!(missing_count(df.column("f").unwrap()).unwrap(), 2);

        let df = df!("i" => [Some(1i64), None, None]).unwrap();
        assert_eq!(missing_count(df.column("i").unwrap()).unwrap(), 2);
    }

    #[test]
    fn test_fill_missing_with_zero_int() {
        let df = df!("i" => [Some(1i16), None, Some(3)]).unwrap();
        let filled = fill_missing_with_zero(df.column("i").unwrap()).unwrap();
        assert_eq!(filled.dtype(), &DataType::Int16);
        let values: Vec<Option<i16>> = filled.i16().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), Some(0), Some(3)]);
    }

    #[test]
    fn test_fill_missing_with_zero_float() {
        let df = df!("f" => [Some(1.5f64), None, Some(f64::NAN)]).unwrap();
        let filled = fill_missing_with_zero(df.column("f").unwrap()).unwrap();
        let values: Vec<Option<f64>> = filled.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.5), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_fill_missing_with_zero_string() {
        let df = df!("s" => [Some("7"), None]).unwrap();
        let filled = fill_missing_with_zero(df.column("s").unwrap()).unwrap();
        let values: Vec<Option<&str>> = filled.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("7"), Some("0")]);
    }

    #[test]
    fn test_uncoercible_samples() {
        let df = df!("s" => [Some("1"), Some("abc"), None, Some("x")]).unwrap();
        let samples =
            uncoercible_samples(df.column("s").unwrap(), &DataType::Int64, 5).unwrap();
        assert_eq!(samples, vec!["abc".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_any_to_string() {
        assert_eq!(any_to_string(AnyValue::Null), "");
        assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
        assert_eq!(any_to_string(AnyValue::String("hello")), "hello");
    }
}
