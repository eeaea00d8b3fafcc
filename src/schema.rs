//! Structural validation of the persisted progress blob.
//!
//! The stored JSON is checked field by field before it is deserialised, so a
//! corrupt or foreign blob is rejected with a path to the offending value
//! instead of half-loading. Optional fields added in later versions
//! (`streakSavers`, `completionHistory`, `activeTimers`) may be absent.

use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::clock::parse_day;
use crate::error::StoreResult;
use crate::progress::AllProgress;

static DAY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("day pattern compiles"));
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("id pattern compiles"));

/// A schema violation at `path` (slash-separated, rooted at `/`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct SchemaError {
    pub path: String,
    pub message: String,
}

type SchemaResult = Result<(), SchemaError>;

fn violation(path: &str, message: impl Into<String>) -> SchemaError {
    SchemaError {
        path: if path.is_empty() { "/".into() } else { path.to_string() },
        message: message.into(),
    }
}

/// Whether `s` is a well-formed `YYYY-MM-DD` calendar day.
pub fn is_day_string(s: &str) -> bool {
    DAY_PATTERN.is_match(s) && parse_day(s).is_some()
}

/// Whether `s` is usable as a profile, quest or reward id.
pub fn is_id_string(s: &str) -> bool {
    ID_PATTERN.is_match(s)
}

fn object<'a>(v: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    v.as_object().ok_or_else(|| violation(path, "must be an object"))
}

fn array<'a>(v: &'a Value, path: &str) -> Result<&'a Vec<Value>, SchemaError> {
    v.as_array().ok_or_else(|| violation(path, "must be an array"))
}

fn uint(v: &Value, path: &str) -> SchemaResult {
    match v.as_u64() {
        Some(_) => Ok(()),
        None => Err(violation(path, "must be a non-negative integer")),
    }
}

fn day(v: &Value, path: &str) -> SchemaResult {
    match v.as_str() {
        Some(s) if is_day_string(s) => Ok(()),
        _ => Err(violation(path, "must be a YYYY-MM-DD day string")),
    }
}

fn id(v: &Value, path: &str) -> SchemaResult {
    match v.as_str() {
        Some(s) if !s.is_empty() => Ok(()),
        _ => Err(violation(path, "must be a non-empty string")),
    }
}

fn instant(v: &Value, path: &str) -> SchemaResult {
    match v.as_str() {
        Some(s) if DateTime::parse_from_rfc3339(s).is_ok() => Ok(()),
        _ => Err(violation(path, "must be an RFC 3339 date-time")),
    }
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value, SchemaError> {
    obj.get(key)
        .ok_or_else(|| violation(path, format!("missing required field '{key}'")))
}

/// Object whose keys match `key_ok` and whose values are arrays validated item by item.
fn keyed_arrays(
    v: &Value,
    path: &str,
    key_ok: fn(&str) -> bool,
    key_desc: &str,
    item: fn(&Value, &str) -> SchemaResult,
) -> SchemaResult {
    for (key, list) in object(v, path)? {
        let key_path = format!("{path}/{key}");
        if !key_ok(key) {
            return Err(violation(&key_path, format!("key must be {key_desc}")));
        }
        for (i, entry) in array(list, &key_path)?.iter().enumerate() {
            item(entry, &format!("{key_path}/{i}"))?;
        }
    }
    Ok(())
}

fn completion_record(v: &Value, path: &str) -> SchemaResult {
    let obj = object(v, path)?;
    id(required(obj, "taskId", path)?, &format!("{path}/taskId"))?;
    match required(obj, "taskName", path)? {
        Value::String(_) => {}
        _ => return Err(violation(&format!("{path}/taskName"), "must be a string")),
    }
    day(required(obj, "completionDate", path)?, &format!("{path}/completionDate"))?;
    uint(required(obj, "xpEarned", path)?, &format!("{path}/xpEarned"))
}

fn timer_entry(v: &Value, path: &str) -> SchemaResult {
    // Older records hold the start instant directly.
    if v.is_string() {
        return instant(v, path);
    }
    let obj = object(v, path)?;
    match required(obj, "startTime", path)? {
        Value::Null => {}
        start => instant(start, &format!("{path}/startTime"))?,
    }
    if let Some(elapsed) = obj.get("elapsedBeforePause") {
        uint(elapsed, &format!("{path}/elapsedBeforePause"))?;
    }
    Ok(())
}

/// Validate one profile's progress object.
pub fn validate_progress(v: &Value, path: &str) -> SchemaResult {
    let obj = object(v, path)?;
    uint(required(obj, "xp", path)?, &format!("{path}/xp"))?;
    uint(required(obj, "streak", path)?, &format!("{path}/streak"))?;
    match required(obj, "lastCompletionDate", path)? {
        Value::Null => {}
        d => day(d, &format!("{path}/lastCompletionDate"))?,
    }
    keyed_arrays(
        required(obj, "dailyCompletions", path)?,
        &format!("{path}/dailyCompletions"),
        is_day_string,
        "a YYYY-MM-DD day string",
        id,
    )?;
    keyed_arrays(
        required(obj, "purchasedRewards", path)?,
        &format!("{path}/purchasedRewards"),
        is_id_string,
        "an id string",
        day,
    )?;
    if let Some(savers) = obj.get("streakSavers") {
        uint(savers, &format!("{path}/streakSavers"))?;
    }
    if let Some(history) = obj.get("completionHistory") {
        let history_path = format!("{path}/completionHistory");
        for (i, record) in array(history, &history_path)?.iter().enumerate() {
            completion_record(record, &format!("{history_path}/{i}"))?;
        }
    }
    if let Some(timers) = obj.get("activeTimers") {
        let timers_path = format!("{path}/activeTimers");
        for (task_id, timer) in object(timers, &timers_path)? {
            let timer_path = format!("{timers_path}/{task_id}");
            if !is_id_string(task_id) {
                return Err(violation(&timer_path, "key must be an id string"));
            }
            timer_entry(timer, &timer_path)?;
        }
    }
    Ok(())
}

/// Validate the whole `AllProgress` blob.
pub fn validate_all_progress(v: &Value) -> SchemaResult {
    for (profile_id, progress) in object(v, "")? {
        let path = format!("/{profile_id}");
        if !is_id_string(profile_id) {
            return Err(violation(&path, "profile key must be an id string"));
        }
        validate_progress(progress, &path)?;
    }
    Ok(())
}

/// Parse and validate a stored blob, migrating older shapes into the current one.
pub fn parse_all_progress(raw: &str) -> StoreResult<AllProgress> {
    let value: Value = serde_json::from_str(raw)?;
    validate_all_progress(&value)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "kid": {
                "xp": 120,
                "streak": 3,
                "lastCompletionDate": "2024-05-10",
                "dailyCompletions": { "2024-05-10": ["dishes"] },
                "purchasedRewards": { "movie_night": ["2024-05-09"] },
                "streakSavers": 0,
                "completionHistory": [
                    { "taskId": "dishes", "taskName": "Dishes", "completionDate": "2024-05-10", "xpEarned": 20 }
                ],
                "activeTimers": {
                    "read": { "startTime": "2024-05-10T08:00:00Z", "elapsedBeforePause": 0 },
                    "walk": { "startTime": null, "elapsedBeforePause": 1200 }
                }
            }
        })
    }

    fn path_of(v: &Value) -> String {
        validate_all_progress(v).unwrap_err().path
    }

    #[test]
    fn test_valid_blob_passes() {
        assert_eq!(validate_all_progress(&valid()), Ok(()));
        assert_eq!(validate_all_progress(&json!({})), Ok(()));
    }

    #[test]
    fn test_older_shape_passes() {
        let v = json!({
            "kid": {
                "xp": 0, "streak": 0, "lastCompletionDate": null,
                "dailyCompletions": {}, "purchasedRewards": {},
                "activeTimers": { "read": "2024-05-10T08:00:00.000Z" }
            }
        });
        assert_eq!(validate_all_progress(&v), Ok(()));
        let all = parse_all_progress(&v.to_string()).unwrap();
        assert!(all["kid"].completion_history.is_empty());
        assert_eq!(all["kid"].active_timers["read"].elapsed_before_pause, 0);
    }

    #[test]
    fn test_rejections_name_the_path() {
        let mut v = valid();
        v["kid"]["xp"] = json!(-5);
        assert_eq!(path_of(&v), "/kid/xp");

        let mut v = valid();
        v["kid"]["streak"] = json!(1.5);
        assert_eq!(path_of(&v), "/kid/streak");

        let mut v = valid();
        v["kid"].as_object_mut().unwrap().remove("dailyCompletions");
        let err = validate_all_progress(&v).unwrap_err();
        assert_eq!(err.path, "/kid");
        assert!(err.message.contains("dailyCompletions"));

        let mut v = valid();
        v["kid"]["dailyCompletions"] = json!({ "yesterday": ["dishes"] });
        assert_eq!(path_of(&v), "/kid/dailyCompletions/yesterday");

        let mut v = valid();
        v["kid"]["purchasedRewards"] = json!({ "movie night": ["2024-05-09"] });
        assert_eq!(path_of(&v), "/kid/purchasedRewards/movie night");

        let mut v = valid();
        v["kid"]["purchasedRewards"]["movie_night"] = json!(["2024-02-30"]);
        assert_eq!(path_of(&v), "/kid/purchasedRewards/movie_night/0");

        let mut v = valid();
        v["kid"]["completionHistory"][0].as_object_mut().unwrap().remove("xpEarned");
        assert_eq!(path_of(&v), "/kid/completionHistory/0");

        let mut v = valid();
        v["kid"]["activeTimers"]["read"]["startTime"] = json!("soon");
        assert_eq!(path_of(&v), "/kid/activeTimers/read/startTime");

        assert_eq!(path_of(&json!([])), "/");
        let kid = valid()["kid"].clone();
        assert_eq!(path_of(&json!({ "bad id": kid })), "/bad id");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_all_progress("not json").is_err());
        assert!(parse_all_progress("{\"kid\": 3}").is_err());
    }
}
