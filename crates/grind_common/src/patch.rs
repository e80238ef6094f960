//! Admin patches and client grind requests.
//!
//! Both are built from a loose JSON body so that field presence can drive
//! branching and type errors surface with a domain message instead of a serde
//! one. Both also serialize back to the same JSON shape for the CLI.

use crate::error::StateError;
use crate::record::Mode;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

pub const BODY_NOT_OBJECT: &str = "request body must be a JSON object";
pub const WHITELIST_INVALID: &str = "whitelist must be a sequence of domain strings";
pub const MODE_INVALID: &str = "mode must be chill or grind";
pub const GRIND_HOURS_INVALID: &str = "grind_hours must be an integer";

/// Upper bound on a grind period (100 years) so deadlines stay representable
pub const MAX_GRIND_HOURS: i64 = 24 * 365 * 100;

/// Partial admin update. `None` means the field was absent from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Only consulted when `mode` is `grind`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grind_hours: Option<i64>,
}

impl ConfigPatch {
    /// Validate a JSON body. Fails on the first malformed field, in the order
    /// whitelist, mode, grind_hours. `grind_hours` is ignored unless `mode` is
    /// `grind`.
    pub fn from_value(body: &Value) -> Result<Self, StateError> {
        let fields = as_object(body)?;

        let whitelist = match fields.get("whitelist") {
            None => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| StateError::validation(WHITELIST_INVALID))?,
            ),
            Some(_) => return Err(StateError::validation(WHITELIST_INVALID)),
        };

        let mode = match fields.get("mode") {
            None => None,
            Some(value) => Some(
                value
                    .as_str()
                    .and_then(Mode::parse)
                    .ok_or_else(|| StateError::validation(MODE_INVALID))?,
            ),
        };

        // Duration is only read for a switch into grind mode
        let grind_hours = match mode {
            Some(Mode::Grind) => parse_grind_hours(fields.get("grind_hours"))?,
            _ => None,
        };

        Ok(Self {
            whitelist,
            mode,
            grind_hours,
        })
    }

    pub fn chill() -> Self {
        Self {
            mode: Some(Mode::Chill),
            ..Self::default()
        }
    }

    pub fn grind(hours: i64) -> Self {
        Self {
            mode: Some(Mode::Grind),
            grind_hours: Some(hours),
            ..Self::default()
        }
    }

    pub fn whitelist(domains: Vec<String>) -> Self {
        Self {
            whitelist: Some(domains),
            ..Self::default()
        }
    }
}

/// Body of a client grind request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientGrindRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grind_hours: Option<i64>,
}

impl ClientGrindRequest {
    pub fn new(grind_hours: Option<i64>) -> Self {
        Self { grind_hours }
    }

    pub fn from_value(body: &Value) -> Result<Self, StateError> {
        let fields = as_object(body)?;
        Ok(Self {
            grind_hours: parse_grind_hours(fields.get("grind_hours"))?,
        })
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, StateError> {
    body.as_object()
        .ok_or_else(|| StateError::validation(BODY_NOT_OBJECT))
}

/// Coerce a `grind_hours` field.
///
/// Integers pass through, floats truncate toward zero, integer strings are
/// parsed. `null` and absence both mean "not given".
pub fn parse_grind_hours(value: Option<&Value>) -> Result<Option<i64>, StateError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(Some)
            .ok_or_else(|| StateError::validation(GRIND_HOURS_INVALID)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StateError::validation(GRIND_HOURS_INVALID)),
        Some(_) => Err(StateError::validation(GRIND_HOURS_INVALID)),
    }
}

/// End of a grind period starting at `now`. Non-positive or missing hours
/// mean an indefinite period.
pub fn grind_deadline(now: DateTime<Utc>, hours: Option<i64>) -> Option<DateTime<Utc>> {
    match hours {
        Some(hours) if hours > 0 => {
            now.checked_add_signed(Duration::hours(hours.min(MAX_GRIND_HOURS)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn validation_message(result: Result<ConfigPatch, StateError>) -> String {
        match result {
            Err(StateError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_presence_is_tracked() {
        let patch = ConfigPatch::from_value(&json!({})).unwrap();
        assert_eq!(patch, ConfigPatch::default());

        let patch = ConfigPatch::from_value(&json!({"mode": "grind"})).unwrap();
        assert_eq!(patch.mode, Some(Mode::Grind));
        assert_eq!(patch.grind_hours, None);
        assert_eq!(patch.whitelist, None);
    }

    #[test]
    fn test_full_patch() {
        let patch = ConfigPatch::from_value(&json!({
            "whitelist": ["docs.rs", "crates.io"],
            "mode": "grind",
            "grind_hours": 3
        }))
        .unwrap();

        assert_eq!(patch.whitelist, Some(vec!["docs.rs".to_string(), "crates.io".to_string()]));
        assert_eq!(patch.mode, Some(Mode::Grind));
        assert_eq!(patch.grind_hours, Some(3));
    }

    #[test]
    fn test_empty_whitelist_is_allowed() {
        let patch = ConfigPatch::from_value(&json!({"whitelist": []})).unwrap();
        assert_eq!(patch.whitelist, Some(vec![]));
    }

    #[test]
    fn test_bad_whitelist() {
        assert_eq!(
            validation_message(ConfigPatch::from_value(&json!({"whitelist": "not-a-list"}))),
            WHITELIST_INVALID
        );
        assert_eq!(
            validation_message(ConfigPatch::from_value(&json!({"whitelist": ["ok.com", 7]}))),
            WHITELIST_INVALID
        );
        assert_eq!(
            validation_message(ConfigPatch::from_value(&json!({"whitelist": null}))),
            WHITELIST_INVALID
        );
    }

    #[test]
    fn test_bad_mode() {
        assert_eq!(
            validation_message(ConfigPatch::from_value(&json!({"mode": "turbo"}))),
            MODE_INVALID
        );
        assert_eq!(
            validation_message(ConfigPatch::from_value(&json!({"mode": 1}))),
            MODE_INVALID
        );
    }

    #[test]
    fn test_grind_hours_only_read_for_grind() {
        let patch =
            ConfigPatch::from_value(&json!({"whitelist": ["a.com"], "grind_hours": "abc"})).unwrap();
        assert_eq!(patch, ConfigPatch::whitelist(vec!["a.com".to_string()]));

        let patch = ConfigPatch::from_value(&json!({"mode": "chill", "grind_hours": 5})).unwrap();
        assert_eq!(patch, ConfigPatch::chill());

        assert_eq!(
            validation_message(ConfigPatch::from_value(
                &json!({"mode": "grind", "grind_hours": "abc"})
            )),
            GRIND_HOURS_INVALID
        );
    }

    #[test]
    fn test_whitelist_checked_before_mode() {
        let body = json!({"whitelist": 5, "mode": "turbo"});
        assert_eq!(validation_message(ConfigPatch::from_value(&body)), WHITELIST_INVALID);
    }

    #[test]
    fn test_body_must_be_object() {
        assert_eq!(
            validation_message(ConfigPatch::from_value(&json!(["grind"]))),
            BODY_NOT_OBJECT
        );
        assert!(ClientGrindRequest::from_value(&json!("grind")).is_err());
    }

    #[test]
    fn test_grind_hours_coercion() {
        assert_eq!(parse_grind_hours(None).unwrap(), None);
        assert_eq!(parse_grind_hours(Some(&json!(null))).unwrap(), None);
        assert_eq!(parse_grind_hours(Some(&json!(4))).unwrap(), Some(4));
        assert_eq!(parse_grind_hours(Some(&json!(-2))).unwrap(), Some(-2));
        assert_eq!(parse_grind_hours(Some(&json!(2.9))).unwrap(), Some(2));
        assert_eq!(parse_grind_hours(Some(&json!("6"))).unwrap(), Some(6));
        assert_eq!(parse_grind_hours(Some(&json!(" 1 "))).unwrap(), Some(1));

        assert!(parse_grind_hours(Some(&json!("two"))).is_err());
        assert!(parse_grind_hours(Some(&json!("1.5"))).is_err());
        assert!(parse_grind_hours(Some(&json!(true))).is_err());
        assert!(parse_grind_hours(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_client_request() {
        let req = ClientGrindRequest::from_value(&json!({"grind_hours": "3"})).unwrap();
        assert_eq!(req.grind_hours, Some(3));

        let req = ClientGrindRequest::from_value(&json!({})).unwrap();
        assert_eq!(req.grind_hours, None);
    }

    #[test]
    fn test_grind_deadline() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            grind_deadline(now, Some(2)),
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 2, 0, 0).unwrap())
        );
        assert_eq!(grind_deadline(now, Some(0)), None);
        assert_eq!(grind_deadline(now, Some(-5)), None);
        assert_eq!(grind_deadline(now, None), None);

        let far = grind_deadline(now, Some(i64::MAX)).unwrap();
        assert_eq!(far, now + Duration::hours(MAX_GRIND_HOURS));
    }

    #[test]
    fn test_patch_serializes_without_absent_fields() {
        let value = serde_json::to_value(ConfigPatch::grind(2)).unwrap();
        assert_eq!(value, json!({"mode": "grind", "grind_hours": 2}));

        let value = serde_json::to_value(ConfigPatch::chill()).unwrap();
        assert_eq!(value, json!({"mode": "chill"}));
    }
}
