//! Execution-mode detection and environment-provided tracker configuration.

use std::env;
use std::fs;

use serde_json::Value;

use crate::tracker::config::InitOptions;
use crate::tracker::error::{invalid_argument, TrackerResult};

const EXECUTION_MODE_ENV: &str = "PLAUSIBLE_EXECUTION_MODE";
const DEFAULTS_ENV: &str = "PLAUSIBLE_DEFAULTS";
const DEFAULTS_PATH_ENV: &str = "PLAUSIBLE_DEFAULTS_PATH";

/// Whether the host application runs as a development build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    Development,
    Production,
}

impl ExecutionMode {
    pub fn is_development(self) -> bool {
        self == ExecutionMode::Development
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(ExecutionMode::Development),
            "production" | "prod" | "release" => Some(ExecutionMode::Production),
            _ => None,
        }
    }
}

/// Returns the execution mode forced through `PLAUSIBLE_EXECUTION_MODE`, falling back to
/// `Development` for debug builds.
pub fn execution_mode() -> ExecutionMode {
    execution_mode_from_lookup(|key| env::var(key).ok())
}

fn execution_mode_from_lookup<F>(lookup: F) -> ExecutionMode
where
    F: Fn(&str) -> Option<String>,
{
    lookup(EXECUTION_MODE_ENV)
        .and_then(|raw| ExecutionMode::parse(&raw))
        .unwrap_or(if cfg!(debug_assertions) {
            ExecutionMode::Development
        } else {
            ExecutionMode::Production
        })
}

/// Builds [`InitOptions`] from the environment.
///
/// A JSON object in `PLAUSIBLE_DEFAULTS` (or in the file named by `PLAUSIBLE_DEFAULTS_PATH`) is
/// used when present. Otherwise the individual `PLAUSIBLE_DOMAIN`, `PLAUSIBLE_API_HOST`,
/// `PLAUSIBLE_USER_AGENT`, `PLAUSIBLE_DEBUG` and `PLAUSIBLE_TRACK_DURING_DEVELOPMENT` variables
/// are read. Returns `Ok(None)` when no domain is configured.
pub fn init_options_from_env() -> TrackerResult<Option<InitOptions>> {
    if let Some(raw) = defaults_json()? {
        return parse_defaults(&raw).map(Some);
    }
    init_options_from_lookup(|key| env::var(key).ok())
}

fn defaults_json() -> TrackerResult<Option<String>> {
    if let Ok(raw) = env::var(DEFAULTS_ENV) {
        return Ok(Some(raw));
    }
    match env::var(DEFAULTS_PATH_ENV) {
        Ok(path) => read_defaults_file(&path).map(Some),
        Err(_) => Ok(None),
    }
}

fn read_defaults_file(path: &str) -> TrackerResult<String> {
    fs::read_to_string(path).map_err(|err| {
        invalid_argument(format!("unable to read {DEFAULTS_PATH_ENV} '{path}': {err}"))
    })
}

fn parse_defaults(raw: &str) -> TrackerResult<InitOptions> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| invalid_argument(format!("{DEFAULTS_ENV} is not valid JSON: {err}")))?;
    if !value.is_object() {
        return Err(invalid_argument(format!(
            "{DEFAULTS_ENV} must be a JSON object"
        )));
    }
    serde_json::from_value(value)
        .map_err(|err| invalid_argument(format!("invalid {DEFAULTS_ENV}: {err}")))
}

fn init_options_from_lookup<F>(lookup: F) -> TrackerResult<Option<InitOptions>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(domain) = lookup("PLAUSIBLE_DOMAIN").filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    let mut options = InitOptions::new(domain);
    options.api_host = lookup("PLAUSIBLE_API_HOST");
    options.user_agent = lookup("PLAUSIBLE_USER_AGENT");
    options.debug = lookup("PLAUSIBLE_DEBUG")
        .map(|raw| parse_flag("PLAUSIBLE_DEBUG", &raw))
        .transpose()?;
    options.track_during_development = lookup("PLAUSIBLE_TRACK_DURING_DEVELOPMENT")
        .map(|raw| parse_flag("PLAUSIBLE_TRACK_DURING_DEVELOPMENT", &raw))
        .transpose()?;
    Ok(Some(options))
}

fn parse_flag(key: &str, raw: &str) -> TrackerResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(invalid_argument(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::error::TrackerErrorCode;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parses_execution_modes() {
        assert_eq!(ExecutionMode::parse("DEV"), Some(ExecutionMode::Development));
        assert_eq!(ExecutionMode::parse("production"), Some(ExecutionMode::Production));
        assert_eq!(ExecutionMode::parse("staging"), None);
    }

    #[test]
    fn reads_individual_variables() {
        let options = init_options_from_lookup(lookup(&[
            ("PLAUSIBLE_DOMAIN", "example.com"),
            ("PLAUSIBLE_API_HOST", "https://stats.example.com"),
            ("PLAUSIBLE_DEBUG", "true"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(options.domain, "example.com");
        assert_eq!(options.api_host.as_deref(), Some("https://stats.example.com"));
        assert_eq!(options.debug, Some(true));
        assert_eq!(options.track_during_development, None);
    }

    #[test]
    fn missing_domain_yields_none() {
        assert!(init_options_from_lookup(lookup(&[("PLAUSIBLE_DEBUG", "1")]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn rejects_bad_flags() {
        let err = init_options_from_lookup(lookup(&[
            ("PLAUSIBLE_DOMAIN", "example.com"),
            ("PLAUSIBLE_TRACK_DURING_DEVELOPMENT", "maybe"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PLAUSIBLE_TRACK_DURING_DEVELOPMENT"));
    }

    #[test]
    fn parses_defaults_json() {
        let options =
            parse_defaults(r#"{"domain":"example.com","debug":true,"userAgent":"ua"}"#).unwrap();
        assert_eq!(options.domain, "example.com");
        assert_eq!(options.debug, Some(true));
        assert_eq!(options.user_agent.as_deref(), Some("ua"));

        assert!(parse_defaults("[1,2]").is_err());
        assert!(parse_defaults("{").is_err());
    }

    #[test]
    fn execution_mode_variable_overrides_build_profile() {
        assert_eq!(
            execution_mode_from_lookup(lookup(&[(EXECUTION_MODE_ENV, "production")])),
            ExecutionMode::Production
        );
        assert_eq!(
            execution_mode_from_lookup(lookup(&[(EXECUTION_MODE_ENV, " Dev ")])),
            ExecutionMode::Development
        );
    }

    #[test]
    fn execution_mode_defaults_to_build_profile() {
        let expected = if cfg!(debug_assertions) {
            ExecutionMode::Development
        } else {
            ExecutionMode::Production
        };
        assert_eq!(execution_mode_from_lookup(lookup(&[])), expected);
        assert_eq!(
            execution_mode_from_lookup(lookup(&[(EXECUTION_MODE_ENV, "staging")])),
            expected
        );
    }

    #[test]
    fn unreadable_defaults_file_names_the_path() {
        let path = env::temp_dir().join("plausible-tracker-missing-defaults.json");
        let path = path.to_string_lossy().into_owned();
        let err = read_defaults_file(&path).unwrap_err();
        assert_eq!(err.code, TrackerErrorCode::InvalidArgument);
        assert!(err.to_string().contains(&path));
        assert!(err.to_string().contains(DEFAULTS_PATH_ENV));
    }

    #[test]
    fn defaults_file_is_read() {
        let path = env::temp_dir().join("plausible-tracker-defaults-test.json");
        fs::write(&path, r#"{"domain":"file.example.com"}"#).unwrap();
        let raw = read_defaults_file(&path.to_string_lossy()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(parse_defaults(&raw).unwrap().domain, "file.example.com");
    }
}
