//! Per-element results of batch endpoints.

use crate::record::ErrorRecord;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The result of one element of a batch call.
///
/// Batch endpoints answer with an array whose element `i` corresponds to
/// request element `i`. A failed element carries `code`/`message`/`detail`
/// where the result fields would be, so the element is decoded as an
/// [`ErrorRecord`] when it has a string `code` and as `T` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The element succeeded.
    Ok(T),
    /// The element failed.
    Err(ErrorRecord),
}

impl<T> Outcome<T> {
    /// Returns true if the element succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// Returns true if the element failed.
    pub fn is_err(&self) -> bool {
        matches!(self, Outcome::Err(_))
    }

    /// Returns the success value, if any.
    pub fn ok(&self) -> Option<&T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Err(_) => None,
        }
    }

    /// Returns the error record, if any.
    pub fn err(&self) -> Option<&ErrorRecord> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err(record) => Some(record),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<T, ErrorRecord> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Err(record) => Err(record),
        }
    }

    /// Maps the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Err(record) => Outcome::Err(record),
        }
    }
}

impl<T> From<Result<T, ErrorRecord>> for Outcome<T> {
    fn from(result: Result<T, ErrorRecord>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(record) => Outcome::Err(record),
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Ok(value) => value.serialize(serializer),
            Outcome::Err(record) => record.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Outcome<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if ErrorRecord::is_error_value(&value) {
            serde_json::from_value(value)
                .map(Outcome::Err)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Outcome::Ok)
                .map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Created {
        id: String,
    }

    #[test]
    fn decodes_mixed_batch() {
        let body = json!([
            {"id": "a1", "code": null},
            {"id": null, "code": "CH003", "message": "Invalid asset definition"}
        ]);
        let outcomes: Vec<Outcome<Created>> = serde_json::from_value(body).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].ok().map(|c| c.id.as_str()), Some("a1"));
        let record = outcomes[1].err().unwrap();
        assert_eq!(record.code, "CH003");
        assert_eq!(record.message, "Invalid asset definition");
    }

    #[test]
    fn success_shape_mismatch_is_an_error() {
        let result: Result<Vec<Outcome<Created>>, _> =
            serde_json::from_value(json!([{"alias": "gold"}]));
        assert!(result.is_err());
    }

    #[test]
    fn into_result_and_map() {
        let ok: Outcome<u32> = Outcome::Ok(2);
        assert_eq!(ok.map(|v| v * 10).into_result(), Ok(20));

        let err: Outcome<u32> = Outcome::Err(ErrorRecord::new("CH006", "Not found"));
        assert!(err.is_err());
        assert_eq!(err.into_result().unwrap_err().code, "CH006");
    }
}
