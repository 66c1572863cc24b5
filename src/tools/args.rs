//! Argument extraction shared by every tool
//!
//! Arguments come straight from model output, so types are normalized here:
//! integers may arrive as integers, integral floats, or numeric strings.

use serde_json::Value;
use thiserror::Error;

use crate::llm::ToolArguments;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("missing required argument: {0}")]
    Missing(String),

    #[error("{0} must be an integer")]
    NotInteger(String),

    #[error("{0} is out of range")]
    OutOfRange(String),

    #[error("{0} must be a string")]
    NotString(String),

    #[error("{0} must not be empty")]
    Empty(String),
}

/// Normalize a JSON value to an integer
fn to_int(key: &str, value: &Value) -> Result<i64, ArgError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.is_u64() {
                return Err(ArgError::OutOfRange(key.to_string()));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => {
                    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
                        Err(ArgError::OutOfRange(key.to_string()))
                    } else {
                        Ok(f as i64)
                    }
                }
                _ => Err(ArgError::NotInteger(key.to_string())),
            }
        }
        Value::String(s) => s.trim().parse().map_err(|_| ArgError::NotInteger(key.to_string())),
        _ => Err(ArgError::NotInteger(key.to_string())),
    }
}

/// Required integer argument
pub fn require_int(args: &ToolArguments, key: &str) -> Result<i64, ArgError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ArgError::Missing(key.to_string())),
        Some(value) => to_int(key, value),
    }
}

/// Optional integer argument; absent or null yields `None`
pub fn optional_int(args: &ToolArguments, key: &str) -> Result<Option<i64>, ArgError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => to_int(key, value).map(Some),
    }
}

/// Optional year argument, narrowed to `i32`
pub fn optional_year(args: &ToolArguments, key: &str) -> Result<Option<i32>, ArgError> {
    optional_int(args, key)?
        .map(|year| i32::try_from(year).map_err(|_| ArgError::OutOfRange(key.to_string())))
        .transpose()
}

/// Required non-empty string argument, trimmed
pub fn require_string(args: &ToolArguments, key: &str) -> Result<String, ArgError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ArgError::Missing(key.to_string())),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ArgError::Empty(key.to_string()))
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(ArgError::NotString(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ToolArguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("test args must be an object"),
        }
    }

    #[test]
    fn test_int_from_integer() {
        assert_eq!(require_int(&args(json!({"id": 27205})), "id"), Ok(27205));
        assert_eq!(require_int(&args(json!({"id": -3})), "id"), Ok(-3));
    }

    #[test]
    fn test_int_from_integral_float() {
        assert_eq!(require_int(&args(json!({"id": 42.0})), "id"), Ok(42));
    }

    #[test]
    fn test_int_rejects_fractional_float() {
        let err = require_int(&args(json!({"id": 3.14})), "id").unwrap_err();
        assert_eq!(err, ArgError::NotInteger("id".to_string()));
        assert!(err.to_string().contains("must be an integer"));
    }

    #[test]
    fn test_int_from_numeric_string() {
        assert_eq!(require_int(&args(json!({"id": "42"})), "id"), Ok(42));
        assert_eq!(require_int(&args(json!({"id": " 7 "})), "id"), Ok(7));
    }

    #[test]
    fn test_int_rejects_other_shapes() {
        for value in [json!("forty-two"), json!(true), json!([1]), json!({"n": 1})] {
            let err = require_int(&args(json!({"id": value})), "id").unwrap_err();
            assert_eq!(err, ArgError::NotInteger("id".to_string()));
        }
    }

    #[test]
    fn test_int_out_of_range() {
        let err = require_int(&args(json!({"id": u64::MAX})), "id").unwrap_err();
        assert_eq!(err, ArgError::OutOfRange("id".to_string()));
        let err = require_int(&args(json!({"id": 1e300})), "id").unwrap_err();
        assert_eq!(err, ArgError::OutOfRange("id".to_string()));
    }

    #[test]
    fn test_int_missing() {
        assert_eq!(
            require_int(&args(json!({})), "id"),
            Err(ArgError::Missing("id".to_string()))
        );
        assert_eq!(
            require_int(&args(json!({"id": null})), "id"),
            Err(ArgError::Missing("id".to_string()))
        );
    }

    #[test]
    fn test_optional_int() {
        assert_eq!(optional_int(&args(json!({})), "year"), Ok(None));
        assert_eq!(optional_int(&args(json!({"year": null})), "year"), Ok(None));
        assert_eq!(optional_int(&args(json!({"year": ""})), "year"), Ok(None));
        assert_eq!(optional_int(&args(json!({"year": "2010"})), "year"), Ok(Some(2010)));
        assert!(optional_int(&args(json!({"year": 2010.5})), "year").is_err());
    }

    #[test]
    fn test_optional_year_range() {
        assert_eq!(optional_year(&args(json!({"year": 1999})), "year"), Ok(Some(1999)));
        assert_eq!(
            optional_year(&args(json!({"year": 9_000_000_000i64})), "year"),
            Err(ArgError::OutOfRange("year".to_string()))
        );
    }

    #[test]
    fn test_require_string() {
        assert_eq!(
            require_string(&args(json!({"query": "  Alien "})), "query"),
            Ok("Alien".to_string())
        );
        assert_eq!(
            require_string(&args(json!({"query": "   "})), "query"),
            Err(ArgError::Empty("query".to_string()))
        );
        assert_eq!(
            require_string(&args(json!({"query": 12})), "query"),
            Err(ArgError::NotString("query".to_string()))
        );
        assert_eq!(
            require_string(&args(json!({})), "query"),
            Err(ArgError::Missing("query".to_string()))
        );
    }
}
