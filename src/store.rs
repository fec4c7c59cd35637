use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use serde_with::{NoneAsEmptyString, serde_as};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Paths, lock_config, read_optional, write_atomic};

const CONFIGS_KEY: &str = "configs";
const CREDENTIAL_KEY: &str = "credential";
const ENDPOINT_KEY: &str = "endpoint";

/// Which provider a profile collection belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProfileFamily {
    #[default]
    Claude,
    Codex,
}

impl ProfileFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileFamily::Claude => "claude",
            ProfileFamily::Codex => "codex",
        }
    }

    pub fn credential_env(self) -> &'static str {
        match self {
            ProfileFamily::Claude => "ANTHROPIC_AUTH_TOKEN",
            ProfileFamily::Codex => "OPENAI_API_KEY",
        }
    }

    pub fn endpoint_env(self) -> &'static str {
        match self {
            ProfileFamily::Claude => "ANTHROPIC_BASE_URL",
            ProfileFamily::Codex => "OPENAI_BASE_URL",
        }
    }

    pub fn env_keys(self) -> [&'static str; 2] {
        [self.credential_env(), self.endpoint_env()]
    }

    fn credential_field(self) -> &'static str {
        match self {
            ProfileFamily::Claude => "token",
            ProfileFamily::Codex => "api_key",
        }
    }

    fn endpoint_field(self) -> &'static str {
        match self {
            ProfileFamily::Claude => "url",
            ProfileFamily::Codex => "base_url",
        }
    }

    /// Codex activation may come from a provider folder instead of env vars.
    pub fn uses_folder_marker(self) -> bool {
        matches!(self, ProfileFamily::Codex)
    }

    pub fn store_path(self, paths: &Paths) -> &Path {
        match self {
            ProfileFamily::Claude => &paths.claude_store,
            ProfileFamily::Codex => &paths.codex_store,
        }
    }

    fn decode(self, entry: &Value) -> Profile {
        let Value::Object(map) = entry else {
            tracing::warn!(family = self.as_str(), "profile entry is not an object");
            return Profile::default();
        };
        let mut map = map.clone();
        rename_key(&mut map, self.credential_field(), CREDENTIAL_KEY);
        rename_key(&mut map, self.endpoint_field(), ENDPOINT_KEY);
        match serde_json::from_value::<Profile>(Value::Object(map)) {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(family = self.as_str(), error = %err, "malformed profile entry");
                Profile::default()
            }
        }
    }

    fn encode(self, profile: &Profile) -> Result<Value, StoreError> {
        let mut value =
            serde_json::to_value(profile).map_err(|err| StoreError::Serialize(err.to_string()))?;
        if let Value::Object(map) = &mut value {
            rename_key(map, CREDENTIAL_KEY, self.credential_field());
            rename_key(map, ENDPOINT_KEY, self.endpoint_field());
        }
        Ok(value)
    }
}

impl fmt::Display for ProfileFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        map.insert(to.to_string(), value);
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(serialize_with = "text_or_empty")]
    pub input: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(serialize_with = "text_or_empty")]
    pub output: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub description: Option<String>,
}

/// One stored credential profile. Unknown fields of the stored record ride
/// along in `extra` so a rewrite never drops them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(serialize_with = "text_or_empty")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(serialize_with = "text_or_empty")]
    pub credential: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(serialize_with = "text_or_empty")]
    pub endpoint: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codex_folder: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn input_price(&self) -> Option<&str> {
        self.pricing.as_ref().and_then(|p| p.input.as_deref())
    }

    pub fn output_price(&self) -> Option<&str> {
        self.pricing.as_ref().and_then(|p| p.output.as_deref())
    }
}

/// Accepts strings and numbers. Empty text, `null` and the literal `"null"`
/// all come back as `None`.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected text, found {other}"
            )));
        }
    };
    Ok(text.filter(|text| {
        let trimmed = text.trim();
        !trimmed.is_empty() && trimmed != "null"
    }))
}

fn text_or_empty<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Error: No profile at index {index} ({})", index_range(.len))]
    NotFound { index: usize, len: usize },
    #[error("Error: {} is not a valid profile document. Fix or remove it first.", .path.display())]
    Malformed { path: PathBuf },
    #[error("Error: Could not serialize profiles: {0}")]
    Serialize(String),
    #[error("{0}")]
    Io(String),
}

fn index_range(len: &usize) -> String {
    match *len {
        0 => "the store is empty".to_string(),
        1 => "only index 0 exists".to_string(),
        len => format!("valid range 0-{}", len - 1),
    }
}

impl From<StoreError> for String {
    fn from(err: StoreError) -> Self {
        err.to_string()
    }
}

/// The on-disk document. Top-level keys other than `configs` are preserved.
struct StoreDocument {
    root: Map<String, Value>,
    configs: Vec<Value>,
}

enum DocumentRead {
    Missing,
    Parsed(StoreDocument),
    Malformed,
}

fn parse_document(contents: &str) -> DocumentRead {
    if contents.trim().is_empty() {
        return DocumentRead::Missing;
    }
    let mut root = match serde_json::from_str::<Value>(contents) {
        Ok(Value::Object(root)) => root,
        Ok(_) | Err(_) => return DocumentRead::Malformed,
    };
    let configs = match root.remove(CONFIGS_KEY) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => return DocumentRead::Malformed,
    };
    DocumentRead::Parsed(StoreDocument { root, configs })
}

/// Persistent collection of profiles for one family.
pub struct ProfileStore {
    family: ProfileFamily,
    path: PathBuf,
    lock_path: PathBuf,
}

impl ProfileStore {
    pub fn new(paths: &Paths, family: ProfileFamily) -> Self {
        ProfileStore {
            family,
            path: family.store_path(paths).to_path_buf(),
            lock_path: paths.lock.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> DocumentRead {
        match read_optional(&self.path) {
            Some(contents) => parse_document(&contents),
            None => DocumentRead::Missing,
        }
    }

    /// All profiles in store order. Never fails: unreadable documents read as empty.
    pub fn list(&self) -> Vec<Profile> {
        match self.read() {
            DocumentRead::Parsed(doc) => doc
                .configs
                .iter()
                .map(|entry| self.family.decode(entry))
                .collect(),
            DocumentRead::Missing => Vec::new(),
            DocumentRead::Malformed => {
                tracing::warn!(path = %self.path.display(), "profile document is malformed");
                Vec::new()
            }
        }
    }

    pub fn get(&self, index: usize) -> Result<Profile, StoreError> {
        let profiles = self.list();
        let len = profiles.len();
        profiles
            .into_iter()
            .nth(index)
            .ok_or(StoreError::NotFound { index, len })
    }

    pub fn append(&self, profile: &Profile) -> Result<usize, StoreError> {
        let entry = self.family.encode(profile)?;
        self.mutate(|configs| {
            configs.push(entry);
            Ok(configs.len() - 1)
        })
    }

    pub fn replace(&self, index: usize, profile: &Profile) -> Result<(), StoreError> {
        let entry = self.family.encode(profile)?;
        self.mutate(|configs| {
            let len = configs.len();
            let slot = configs
                .get_mut(index)
                .ok_or(StoreError::NotFound { index, len })?;
            *slot = entry;
            Ok(())
        })
    }

    pub fn remove(&self, index: usize) -> Result<Profile, StoreError> {
        let family = self.family;
        self.mutate(|configs| {
            if index >= configs.len() {
                return Err(StoreError::NotFound {
                    index,
                    len: configs.len(),
                });
            }
            let removed = configs.remove(index);
            Ok(family.decode(&removed))
        })
    }

    /// Creates an empty document when none exists. Returns whether it wrote one.
    pub fn init(&self) -> Result<bool, StoreError> {
        let _lock = lock_config(&self.lock_path).map_err(StoreError::Io)?;
        if self.path.exists() {
            return Ok(false);
        }
        let doc = StoreDocument {
            root: Map::new(),
            configs: Vec::new(),
        };
        self.write(doc)?;
        Ok(true)
    }

    fn mutate<T, F>(&self, apply: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Value>) -> Result<T, StoreError>,
    {
        let _lock = lock_config(&self.lock_path).map_err(StoreError::Io)?;
        let mut doc = match self.read() {
            DocumentRead::Parsed(doc) => doc,
            DocumentRead::Missing => StoreDocument {
                root: Map::new(),
                configs: Vec::new(),
            },
            DocumentRead::Malformed => {
                return Err(StoreError::Malformed {
                    path: self.path.clone(),
                });
            }
        };
        let out = apply(&mut doc.configs)?;
        self.write(doc)?;
        Ok(out)
    }

    fn write(&self, doc: StoreDocument) -> Result<(), StoreError> {
        let StoreDocument { mut root, configs } = doc;
        let count = configs.len();
        root.insert(CONFIGS_KEY.to_string(), Value::Array(configs));
        let mut json = serde_json::to_string_pretty(&Value::Object(root))
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes()).map_err(StoreError::Io)?;
        tracing::debug!(path = %self.path.display(), count, "wrote profile store");
        Ok(())
    }
}
