use serde_json::Value;

use crate::error::{Error, Result};

/// Request arguments merged from the query string and a JSON object body.
///
/// Order of first appearance is kept; body values override query values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArgs {
    args: Vec<(String, Value)>,
}

impl RequestArgs {
    pub fn from_parts(query: Option<&str>, body: &[u8]) -> Result<Self> {
        let mut args = Self::default();

        if let Some(query) = query {
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                args.insert(key.into_owned(), Value::String(value.into_owned()));
            }
        }

        if !body.iter().all(u8::is_ascii_whitespace) {
            let parsed: Value = serde_json::from_slice(body).map_err(|e| Error::InvalidArgument {
                name: "body".to_string(),
                reason: e.to_string(),
            })?;
            let Value::Object(map) = parsed else {
                return Err(Error::InvalidArgument {
                    name: "body".to_string(),
                    reason: "expected a JSON object".to_string(),
                });
            };
            for (key, value) in map {
                args.insert(key, value);
            }
        }

        Ok(args)
    }

    fn insert(&mut self, key: String, value: Value) {
        match self.args.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.args.push((key, value)),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.args.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Required string argument. Numbers are accepted and stringified.
    pub fn get_str(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(Error::InvalidArgument {
                name: name.to_string(),
                reason: format!("expected a string, got {other}"),
            }),
            None => Err(Error::MissingArgument(name.to_string())),
        }
    }

    /// Optional integer argument. Numeric strings are accepted.
    pub fn get_int(&self, name: &str, default: i64) -> Result<i64> {
        let invalid = |value: &Value| Error::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected an integer, got {value}"),
        };
        match self.get(name) {
            None => Ok(default),
            Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(&Value::Number(n.clone()))),
            Some(value @ Value::String(s)) => s.trim().parse().map_err(|_| invalid(value)),
            Some(other) => Err(invalid(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_keys_without_values_are_kept_in_order() {
        let args = RequestArgs::from_parts(Some("lights&case"), b"").unwrap();
        assert_eq!(args.keys(), vec!["lights", "case"]);
        assert_eq!(args.get("case"), Some(&json!("")));
    }

    #[test]
    fn body_overrides_query() {
        let args =
            RequestArgs::from_parts(Some("strip=case&preset=1"), br#"{"preset": 4}"#).unwrap();
        assert_eq!(args.get_str("strip").unwrap(), "case");
        assert_eq!(args.get_int("preset", -1).unwrap(), 4);
        assert_eq!(args.keys(), vec!["strip", "preset"]);
    }

    #[test]
    fn blank_body_is_ignored() {
        let args = RequestArgs::from_parts(None, b"  \n").unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(RequestArgs::from_parts(None, b"[1, 2]").is_err());
        assert!(RequestArgs::from_parts(None, b"{oops").is_err());
    }

    #[test]
    fn get_int_parses_strings_and_defaults() {
        let args = RequestArgs::from_parts(Some("preset=%203"), b"").unwrap();
        assert_eq!(args.get_int("preset", -1).unwrap(), 3);
        assert_eq!(args.get_int("missing", -1).unwrap(), -1);

        let args = RequestArgs::from_parts(Some("preset=abc"), b"").unwrap();
        assert!(args.get_int("preset", -1).is_err());
    }

    #[test]
    fn get_str_reports_missing() {
        let args = RequestArgs::default();
        assert_eq!(
            args.get_str("strip"),
            Err(Error::MissingArgument("strip".to_string()))
        );
    }
}
