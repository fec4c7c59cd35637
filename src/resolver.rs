use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::env;
use std::path::Path;

use crate::{
    HealthRecord, HealthSnapshot, HealthStatus, Profile, ProfileFamily, format_time_ago, lookup,
    read_optional,
};

const UNMATCHED_PREFIX_CHARS: usize = 4;

/// Key-value view of the environment the activation state is read from.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivationState {
    pub credential: Option<String>,
    pub endpoint: Option<String>,
    pub folder_marker: Option<String>,
}

impl ActivationState {
    pub fn capture(family: ProfileFamily, env: &dyn EnvSource, codex_config: &Path) -> Self {
        let non_empty = |key: &str| env.var(key).filter(|value| !value.is_empty());
        ActivationState {
            credential: non_empty(family.credential_env()),
            endpoint: non_empty(family.endpoint_env()),
            folder_marker: if family.uses_folder_marker() {
                read_folder_marker(codex_config)
            } else {
                None
            },
        }
    }

    fn credential_pair(&self) -> Option<(&str, &str)> {
        Some((self.credential.as_deref()?, self.endpoint.as_deref()?))
    }
}

/// Provider name Codex is currently pointed at, from its `config.toml`.
pub fn read_folder_marker(path: &Path) -> Option<String> {
    parse_folder_marker(&read_optional(path)?)
}

/// The `model_provider = "<name>"` value, or else the `<name>` of the first
/// `[model_providers.<name>]` table.
pub fn parse_folder_marker(contents: &str) -> Option<String> {
    if let Some(value) = contents
        .lines()
        .find_map(|line| parse_config_value(line, "model_provider"))
    {
        return Some(value);
    }
    contents.lines().find_map(provider_table_name)
}

fn provider_table_name(line: &str) -> Option<String> {
    let header = strip_inline_comment(line.trim())
        .strip_prefix('[')?
        .strip_suffix(']')?
        .trim();
    let name = header.strip_prefix("model_providers.")?.trim();
    let name = name.trim_matches('"').trim_matches('\'').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[doc(hidden)]
pub fn parse_config_value(line: &str, key: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (config_key, raw_value) = line.split_once('=')?;
    if config_key.trim() != key {
        return None;
    }
    let value = strip_inline_comment(raw_value).trim();
    if value.is_empty() {
        return None;
    }
    let value = value.trim_matches('"').trim_matches('\'').trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

fn strip_inline_comment(value: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;
    for (idx, ch) in value.char_indices() {
        match ch {
            '"' if !in_single && !escape => in_double = !in_double,
            '\'' if !in_double => in_single = !in_single,
            '#' if !in_single && !in_double => return value[..idx].trim_end(),
            _ => {}
        }
        escape = in_double && ch == '\\' && !escape;
        if ch != '\\' {
            escape = false;
        }
    }
    value.trim_end()
}

/// Index of the active profile, if any.
///
/// A Codex folder marker is tried first against `codex_folder`. Otherwise the
/// credential pair must match exactly; with duplicates the lowest index wins.
pub fn resolve_active(profiles: &[Profile], state: &ActivationState) -> Option<usize> {
    if let Some(marker) = state.folder_marker.as_deref() {
        let found = profiles
            .iter()
            .position(|profile| profile.codex_folder.as_deref() == Some(marker));
        if found.is_some() {
            tracing::debug!(marker, index = ?found, "active profile matched by folder");
            return found;
        }
    }
    let (credential, endpoint) = state.credential_pair()?;
    let found = profiles.iter().position(|profile| {
        profile.credential.as_deref() == Some(credential)
            && profile.endpoint.as_deref() == Some(endpoint)
    });
    tracing::debug!(index = ?found, "active profile matched by credentials");
    found
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActiveProfile {
    Matched(usize),
    /// Nothing is set in the environment.
    Unconfigured,
    /// Something is set but no stored profile matches it.
    Unmatched { hint: String },
}

pub fn describe_active(profiles: &[Profile], state: &ActivationState) -> ActiveProfile {
    if let Some(index) = resolve_active(profiles, state) {
        return ActiveProfile::Matched(index);
    }
    if let Some((credential, _)) = state.credential_pair() {
        let prefix: String = credential.chars().take(UNMATCHED_PREFIX_CHARS).collect();
        return ActiveProfile::Unmatched {
            hint: format!("{prefix}..."),
        };
    }
    match state.folder_marker.as_deref() {
        Some(marker) => ActiveProfile::Unmatched {
            hint: marker.to_string(),
        },
        None => ActiveProfile::Unconfigured,
    }
}

/// A profile together with what the health snapshot says about it.
#[derive(Clone, Debug)]
pub struct AnnotatedProfile<'a> {
    pub index: usize,
    pub profile: &'a Profile,
    pub status: HealthStatus,
    pub last_check: Option<&'a str>,
    pub time_ago: String,
    pub record: Option<&'a HealthRecord>,
}

pub fn annotate<'a>(
    index: usize,
    profile: &'a Profile,
    snapshot: &'a HealthSnapshot,
    now: DateTime<Utc>,
) -> AnnotatedProfile<'a> {
    let health = profile
        .channel_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(|id| lookup(snapshot, id));
    let (status, last_check, record) = match health {
        Some(health) => (health.status, health.last_check, health.record),
        None => (HealthStatus::Unknown, None, None),
    };
    AnnotatedProfile {
        index,
        profile,
        status,
        last_check,
        time_ago: format_time_ago(last_check, now),
        record,
    }
}
