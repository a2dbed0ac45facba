//! Translation between plain JSON documents and Firestore's typed value
//! encoding (`{"stringValue": "..."}`, `{"mapValue": {"fields": ...}}`, ...).

use serde_json::{Map, Number, Value, json};

use crate::domain::account::{errors::DocumentStoreError, ports::Document};

/// Encodes every field of a document
pub fn encode_fields(data: &Document) -> Result<Map<String, Value>, DocumentStoreError> {
  data
    .iter()
    .map(|(name, value)| Ok((name.clone(), encode(value)?)))
    .collect()
}

/// Encodes one JSON value as a Firestore value.
///
/// Integers must fit in an `i64`; Firestore has no wider integer type.
pub fn encode(value: &Value) -> Result<Value, DocumentStoreError> {
  Ok(match value {
    Value::Null => json!({ "nullValue": null }),
    Value::Bool(b) => json!({ "booleanValue": b }),
    Value::Number(n) => match (n.as_i64(), n.is_u64()) {
      (Some(i), _) => json!({ "integerValue": i.to_string() }),
      (None, true) => {
        return Err(DocumentStoreError::Encode(format!(
          "integer {} does not fit in 64 signed bits",
          n
        )));
      }
      (None, false) => json!({ "doubleValue": n.as_f64() }),
    },
    Value::String(s) => json!({ "stringValue": s }),
    Value::Array(items) => json!({
      "arrayValue": { "values": items.iter().map(encode).collect::<Result<Vec<_>, _>>()? }
    }),
    Value::Object(fields) => json!({
      "mapValue": { "fields": encode_fields(fields)? }
    }),
  })
}

/// Decodes the `fields` map of a Firestore document
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Document, DocumentStoreError> {
  fields
    .iter()
    .map(|(name, value)| Ok((name.clone(), decode(value)?)))
    .collect()
}

/// Decodes one Firestore value into plain JSON.
///
/// Timestamps, references and bytes come back as their string form.
pub fn decode(value: &Value) -> Result<Value, DocumentStoreError> {
  let typed = value
    .as_object()
    .and_then(|object| object.iter().next())
    .map(|(kind, payload)| (kind.as_str(), payload))
    .ok_or_else(|| DocumentStoreError::Decode(format!("not a typed value: {}", value)))?;

  match typed {
    ("nullValue", _) => Ok(Value::Null),
    ("booleanValue", Value::Bool(b)) => Ok(Value::Bool(*b)),
    ("integerValue", Value::String(s)) => s
      .parse::<i64>()
      .map(Value::from)
      .map_err(|e| DocumentStoreError::Decode(format!("integerValue {:?}: {}", s, e))),
    ("integerValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
    ("doubleValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
    ("doubleValue", other) => other
      .as_str()
      .and_then(|s| s.parse::<f64>().ok())
      .and_then(Number::from_f64)
      .map(Value::Number)
      .ok_or_else(|| DocumentStoreError::Decode(format!("doubleValue {} is not finite", other))),
    ("stringValue" | "timestampValue" | "referenceValue" | "bytesValue", Value::String(s)) => {
      Ok(Value::String(s.clone()))
    }
    ("geoPointValue", point) => Ok(point.clone()),
    ("arrayValue", array) => {
      let values = match array.get("values") {
        Some(Value::Array(values)) => values.iter().map(decode).collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
      };
      Ok(Value::Array(values))
    }
    ("mapValue", map) => {
      let fields = match map.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields)?,
        _ => Document::new(),
      };
      Ok(Value::Object(fields))
    }
    (kind, payload) => Err(DocumentStoreError::Decode(format!(
      "unsupported value {}: {}",
      kind, payload
    ))),
  }
}

/// Quotes a top-level field name for use in an update mask
pub fn field_path(name: &str) -> String {
  let mut chars = name.chars();
  let simple = chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

  if simple {
    name.to_string()
  } else {
    format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_encode_user_shaped_document() {
    let data = match json!({
      "name": "A",
      "handles": { "codeforces": "tourist" },
      "history": ["m1"],
      "favorites": [],
    }) {
      Value::Object(map) => map,
      _ => unreachable!(),
    };

    assert_eq!(
      Value::Object(encode_fields(&data).unwrap()),
      json!({
        "name": { "stringValue": "A" },
        "handles": { "mapValue": { "fields": { "codeforces": { "stringValue": "tourist" } } } },
        "history": { "arrayValue": { "values": [{ "stringValue": "m1" }] } },
        "favorites": { "arrayValue": { "values": [] } },
      })
    );
  }

  #[test]
  fn test_numbers_keep_integer_and_double_apart() {
    assert_eq!(encode(&json!(1500)).unwrap(), json!({ "integerValue": "1500" }));
    assert_eq!(encode(&json!(2.5)).unwrap(), json!({ "doubleValue": 2.5 }));
    assert_eq!(
      encode(&json!(i64::MAX)).unwrap(),
      json!({ "integerValue": i64::MAX.to_string() })
    );
    assert_eq!(decode(&json!({ "integerValue": "-3" })).unwrap(), json!(-3));
    assert_eq!(decode(&json!({ "doubleValue": 2.5 })).unwrap(), json!(2.5));
  }

  #[test]
  fn test_encode_rejects_integers_beyond_i64() {
    let too_big = json!(u64::MAX);

    assert!(matches!(encode(&too_big), Err(DocumentStoreError::Encode(_))));
    assert!(matches!(
      encode(&json!({ "history": [1, too_big] })),
      Err(DocumentStoreError::Encode(_))
    ));
  }

  #[test]
  fn test_decode_server_shapes() {
    // Firestore omits `values` / `fields` for empty arrays and maps.
    assert_eq!(decode(&json!({ "arrayValue": {} })).unwrap(), json!([]));
    assert_eq!(decode(&json!({ "mapValue": {} })).unwrap(), json!({}));
    assert_eq!(
      decode(&json!({ "timestampValue": "2024-01-01T00:00:00Z" })).unwrap(),
      json!("2024-01-01T00:00:00Z")
    );
    assert_eq!(decode(&json!({ "nullValue": null })).unwrap(), Value::Null);
  }

  #[test]
  fn test_decode_rejects_unknown_shapes() {
    assert!(matches!(
      decode(&json!("bare string")),
      Err(DocumentStoreError::Decode(_))
    ));
    assert!(matches!(
      decode(&json!({ "integerValue": "twelve" })),
      Err(DocumentStoreError::Decode(_))
    ));
    assert!(matches!(
      decode(&json!({ "doubleValue": "NaN" })),
      Err(DocumentStoreError::Decode(_))
    ));
  }

  #[test]
  fn test_field_path_quoting() {
    assert_eq!(field_path("user_id"), "user_id");
    assert_eq!(field_path("first name"), "`first name`");
    assert_eq!(field_path("9lives"), "`9lives`");
    assert_eq!(field_path("a`b"), "`a\\`b`");
  }
}
