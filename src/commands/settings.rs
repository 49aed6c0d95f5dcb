use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;

/// The subset of settings the correlation and adapter layers consume.
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub jira_base_url: String,
    pub jira_token: String,
    pub gitlab_base_url: String,
    pub gitlab_token: String,
    pub gitlab_project_id: String,
    pub loose_match_threshold: usize,
    pub extra_stop_words: Vec<String>,
}

pub fn load_effective_settings(data_dir: &Path) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(data_dir)?;

    let get_str = |key: &str| {
        settings
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let loose_match_threshold = settings
        .get("looseMatchThreshold")
        .and_then(Value::as_u64)
        .unwrap_or(2)
        .clamp(1, 10) as usize;

    let extra_stop_words = settings
        .get("extraStopWords")
        .and_then(Value::as_array)
        .map(|words| {
            words
                .iter()
                .filter_map(Value::as_str)
                .map(|w| w.to_lowercase())
                .collect()
        })
        .unwrap_or_default();

    Ok(EffectiveSettings {
        jira_base_url: get_str("jiraBaseUrl"),
        jira_token: get_str("jiraToken"),
        gitlab_base_url: get_str("gitlabBaseUrl"),
        gitlab_token: get_str("gitlabToken"),
        gitlab_project_id: get_str("gitlabProjectId"),
        loose_match_threshold,
        extra_stop_words,
    })
}

pub fn load_settings_from_disk(data_dir: &Path) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| json!({}))
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

/// Merge a partial update over the stored settings, then re-run
/// migration/sanitization so bad values never land on disk.
pub fn save_settings_to_disk(data_dir: &Path, settings: Value) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

fn ensure_data_dir(data_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(data_dir).map_err(|e| format!("Failed to create data directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);

    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "jiraBaseUrl": "",
        "jiraToken": "",
        "gitlabBaseUrl": "",
        "gitlabToken": "",
        "gitlabProjectId": "",
        "looseMatchThreshold": 2,
        "extraStopWords": []
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object())
    else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "looseMatchThreshold", 1, 10, 2);

    for key in [
        "jiraBaseUrl",
        "jiraToken",
        "gitlabBaseUrl",
        "gitlabToken",
        "gitlabProjectId",
    ] {
        let value = obj
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();
        obj.insert(key.to_string(), json!(value));
    }

    // Stop words are matched lowercase; non-string entries are dropped.
    let words: Vec<String> = obj
        .get("extraStopWords")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        })
        .unwrap_or_default();
    obj.insert("extraStopWords".to_string(), json!(words));
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}
