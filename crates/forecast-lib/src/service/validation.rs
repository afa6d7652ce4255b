//! Request body validation
//!
//! Turns a raw `/predict` body into a rectangular matrix of finite f32
//! values, or the first validation error encountered.

use super::PredictError;
use crate::predictor::Matrix;
use serde_json::Value;

/// Field holding the input sequences
pub const SEQUENCES_FIELD: &str = "sequences";

/// Parse and validate a `/predict` request body
pub fn parse_request(body: &[u8]) -> Result<Matrix, PredictError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PredictError::MissingData);
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| PredictError::MissingData)?;
    let object = match value {
        Value::Object(map) if !map.is_empty() => map,
        _ => return Err(PredictError::MissingData),
    };

    let sequences = object
        .get(SEQUENCES_FIELD)
        .ok_or(PredictError::MissingField)?;

    to_matrix(sequences)
}

/// Coerce a JSON value into an N x L matrix
pub fn to_matrix(value: &Value) -> Result<Matrix, PredictError> {
    let rows = match value {
        Value::Array(rows) => rows,
        scalar => {
            to_f32(scalar)?;
            return Err(PredictError::InvalidDimension { ndim: 0 });
        }
    };

    // 1-D (including empty): validate values first so non-numeric input reads as a value error
    if rows.iter().all(|row| !row.is_array()) {
        for v in rows {
            to_f32(v)?;
        }
        return Err(PredictError::InvalidDimension { ndim: 1 });
    }

    if !rows.iter().all(Value::is_array) {
        return Err(PredictError::InvalidValue(
            "sequences mix numbers and arrays".to_string(),
        ));
    }

    let width = rows.first().and_then(Value::as_array).map_or(0, Vec::len);
    let mut data = Vec::with_capacity(rows.len() * width);
    let mut nested = 0usize;

    for (i, row) in rows.iter().enumerate() {
        let row = row.as_array().map(Vec::as_slice).unwrap_or_default();
        if row.len() != width {
            return Err(PredictError::InvalidValue(format!(
                "sequence {} has {} values, expected {}",
                i,
                row.len(),
                width
            )));
        }
        for v in row {
            if v.is_array() {
                nested += 1;
            } else {
                data.push(to_f32(v)?);
            }
        }
    }

    if nested > 0 {
        return if data.is_empty() {
            Err(PredictError::InvalidDimension { ndim: 3 })
        } else {
            Err(PredictError::InvalidValue(
                "sequences mix numbers and arrays".to_string(),
            ))
        };
    }

    Matrix::from_shape_vec((rows.len(), width), data)
        .map_err(|e| PredictError::InvalidValue(e.to_string()))
}

fn to_f32(value: &Value) -> Result<f32, PredictError> {
    let Value::Number(n) = value else {
        return Err(PredictError::InvalidValue(format!(
            "could not convert {value} to float"
        )));
    };

    let x = n
        .as_f64()
        .map(|x| x as f32)
        .filter(|x| x.is_finite())
        .ok_or_else(|| PredictError::InvalidValue(format!("{n} is not a finite 32-bit float")))?;
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Matrix, PredictError> {
        parse_request(body.as_bytes())
    }

    fn error_type(body: &str) -> &'static str {
        match parse(body) {
            Ok(m) => panic!("expected error for {body}, got shape {:?}", m.dim()),
            Err(e) => e.error_type(),
        }
    }

    #[test]
    fn test_valid_matrix() {
        let m = parse(r#"{"sequences": [[0.1, 0.2, 0.3, 0.4], [1, 2, 3, 4]]}"#).unwrap();
        assert_eq!(m.dim(), (2, 4));
        assert_eq!(m[[1, 3]], 4.0);
        assert_eq!(m[[0, 0]], 0.1f32);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let m = parse(r#"{"sequences": [[1, 2]], "horizon": 24}"#).unwrap();
        assert_eq!(m.dim(), (1, 2));
    }

    #[test]
    fn test_missing_data() {
        for body in ["", "   \n", "null", "{}", "[]", "not json", "42", "\"text\""] {
            assert_eq!(error_type(body), "MissingData", "body: {body:?}");
        }
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(error_type(r#"{"sequence": [[1, 2]]}"#), "MissingField");
        assert_eq!(error_type(r#"{"data": null}"#), "MissingField");
    }

    #[test]
    fn test_ragged_rows_are_value_errors() {
        assert_eq!(error_type(r#"{"sequences": [[1, 2], [3, 4, 5]]}"#), "ValueError");
    }

    #[test]
    fn test_non_numeric_values() {
        assert_eq!(error_type(r#"{"sequences": [[1, "a"]]}"#), "ValueError");
        assert_eq!(error_type(r#"{"sequences": [[1, null]]}"#), "ValueError");
        assert_eq!(error_type(r#"{"sequences": [[true, 1]]}"#), "ValueError");
        assert_eq!(error_type(r#"{"sequences": [[{"v": 1}]]}"#), "ValueError");
        assert_eq!(error_type(r#"{"sequences": "abc"}"#), "ValueError");
        assert_eq!(error_type(r#"{"sequences": null}"#), "ValueError");
    }

    #[test]
    fn test_values_overflowing_f32_are_rejected() {
        assert_eq!(error_type(r#"{"sequences": [[1e300]]}"#), "ValueError");
    }

    #[test]
    fn test_mixed_nesting_is_value_error() {
        assert_eq!(error_type(r#"{"sequences": [[1, 2], 3]}"#), "ValueError");
        assert_eq!(error_type(r#"{"sequences": [[1, [2]]]}"#), "ValueError");
    }

    #[test]
    fn test_wrong_dimensions() {
        assert_eq!(error_type(r#"{"sequences": 5}"#), "InvalidDimension");
        assert_eq!(error_type(r#"{"sequences": []}"#), "InvalidDimension");
        assert_eq!(error_type(r#"{"sequences": [1, 2, 3]}"#), "InvalidDimension");
        assert_eq!(error_type(r#"{"sequences": [[[1], [2]]]}"#), "InvalidDimension");
        assert_eq!(error_type(r#"{"sequences": [[[]]]}"#), "InvalidDimension");
    }

    #[test]
    fn test_rows_without_values_are_two_dimensional() {
        let m = parse(r#"{"sequences": [[], []]}"#).unwrap();
        assert_eq!(m.dim(), (2, 0));
    }
}
