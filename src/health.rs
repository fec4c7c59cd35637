use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::{lock_config, write_atomic};

pub const DEFAULT_HEALTH_URL: &str = "https://check.linux.do/api/v1/status";
const USER_AGENT: &str = "ai-env";
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_POLL_CONCURRENCY: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Error,
    Timeout,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ok" | "operational" => HealthStatus::Ok,
            "error" | "failed" => HealthStatus::Error,
            "timeout" => HealthStatus::Timeout,
            _ => HealthStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Error => "error",
            HealthStatus::Timeout => "timeout",
            HealthStatus::Unknown => "unknown",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            HealthStatus::Ok => "O",
            HealthStatus::Error => "X",
            HealthStatus::Timeout => "!",
            HealthStatus::Unknown => "?",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One service as reported by a status document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HealthRecord {
    pub service_id: String,
    pub status: HealthStatus,
    pub raw_status: String,
    pub last_check: Option<String>,
    pub model: Option<String>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub latency_ms: Option<f64>,
    pub timeline: Vec<HealthStatus>,
}

impl HealthRecord {
    pub fn label(&self) -> &str {
        self.model
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.service_id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default)]
pub struct HealthSnapshot {
    pub services: BTreeMap<String, HealthRecord>,
    pub failures: Vec<PollFailure>,
}

impl HealthSnapshot {
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Folds one document's records in. Later documents win per service id.
    pub fn merge(&mut self, records: Vec<HealthRecord>) {
        for record in records {
            self.services.insert(record.service_id.clone(), record);
        }
    }
}

/// Result of looking a channel up in a snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServiceHealth<'a> {
    pub status: HealthStatus,
    pub last_check: Option<&'a str>,
    pub record: Option<&'a HealthRecord>,
}

pub fn lookup<'a>(snapshot: &'a HealthSnapshot, service_id: &str) -> ServiceHealth<'a> {
    match snapshot.services.get(service_id) {
        Some(record) => ServiceHealth {
            status: record.status,
            last_check: record.last_check.as_deref(),
            record: Some(record),
        },
        None => ServiceHealth {
            status: HealthStatus::Unknown,
            last_check: None,
            record: None,
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HealthFetchError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("unreachable: {0}")]
    Transport(String),
    #[error("invalid status document: {0}")]
    Parse(String),
}

/// Anything that can hand back a status document for a URL.
pub trait StatusSource: Sync {
    fn fetch(&self, url: &str) -> Result<Value, HealthFetchError>;
}

pub struct HttpStatusSource {
    agent: ureq::Agent,
}

impl HttpStatusSource {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build();
        HttpStatusSource {
            agent: config.into(),
        }
    }
}

impl Default for HttpStatusSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSource for HttpStatusSource {
    fn fetch(&self, url: &str) -> Result<Value, HealthFetchError> {
        let response = match self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) => return Err(HealthFetchError::Status(code)),
            Err(err) => return Err(HealthFetchError::Transport(err.to_string())),
        };
        response
            .into_body()
            .read_json::<Value>()
            .map_err(|err| HealthFetchError::Parse(err.to_string()))
    }
}

/// The URL used when no health URLs are configured.
pub fn default_health_url() -> String {
    std::env::var("HEALTH_STATUS_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_HEALTH_URL.to_string())
}

pub fn effective_urls(configured: &[String]) -> Vec<String> {
    if configured.is_empty() {
        vec![default_health_url()]
    } else {
        configured.to_vec()
    }
}

/// Polls every URL and merges the results in the given order.
///
/// Fetches overlap in batches of at most four, but the merge is sequential, so
/// for a service reported by several URLs the last URL in `urls` decides.
/// Failed URLs contribute nothing and are listed in `failures`.
pub fn fetch_all<S>(source: &S, urls: &[String]) -> HealthSnapshot
where
    S: StatusSource + ?Sized,
{
    let poll = |url: &String| (url.clone(), poll_one(source, url));
    let mut results = Vec::with_capacity(urls.len());
    for chunk in urls.chunks(MAX_POLL_CONCURRENCY) {
        let mut chunk_results: Vec<_> = chunk.par_iter().map(poll).collect();
        results.append(&mut chunk_results);
    }

    let mut snapshot = HealthSnapshot::default();
    for (url, result) in results {
        match result {
            Ok(records) => snapshot.merge(records),
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "health poll failed");
                snapshot.failures.push(PollFailure {
                    url,
                    reason: err.to_string(),
                });
            }
        }
    }
    snapshot
}

fn poll_one<S>(source: &S, url: &str) -> Result<Vec<HealthRecord>, HealthFetchError>
where
    S: StatusSource + ?Sized,
{
    let document = source.fetch(url)?;
    if !document.is_object() {
        return Err(HealthFetchError::Parse("expected a JSON object".to_string()));
    }
    let records = parse_health_document(&document);
    tracing::debug!(url, services = records.len(), "health poll finished");
    Ok(records)
}

/// Reads either the `services` map shape or, when that is absent, the
/// `providers` list shape. Entries that are not objects are skipped.
pub fn parse_health_document(document: &Value) -> Vec<HealthRecord> {
    if let Some(services) = document.get("services").and_then(Value::as_object) {
        return services
            .iter()
            .filter_map(|(id, entry)| {
                let entry = entry.as_object()?;
                Some(build_record(
                    id.clone(),
                    entry,
                    entry.get("status"),
                    entry.get("lastCheck"),
                    entry.get("latencyMs"),
                ))
            })
            .collect();
    }
    let Some(providers) = document.get("providers").and_then(Value::as_array) else {
        return Vec::new();
    };
    providers
        .iter()
        .filter_map(|item| {
            let item = item.as_object()?;
            let id = text_field(item.get("id")).or_else(|| text_field(item.get("name")))?;
            let latest = item.get("latest").and_then(Value::as_object);
            let field = |key: &str| latest.and_then(|latest| latest.get(key));
            Some(build_record(
                id,
                item,
                field("status"),
                field("checkedAt"),
                field("latencyMs"),
            ))
        })
        .collect()
}

fn build_record(
    service_id: String,
    entry: &Map<String, Value>,
    status: Option<&Value>,
    last_check: Option<&Value>,
    latency: Option<&Value>,
) -> HealthRecord {
    let raw_status = text_field(status).unwrap_or_else(|| "unknown".to_string());
    HealthRecord {
        service_id,
        status: HealthStatus::from_raw(&raw_status),
        raw_status,
        last_check: text_field(last_check),
        model: text_field(entry.get("model")),
        name: text_field(entry.get("name")),
        group: text_field(entry.get("group")),
        latency_ms: latency.and_then(|value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }),
        timeline: parse_timeline(entry.get("timeline")),
    }
}

fn parse_timeline(value: Option<&Value>) -> Vec<HealthStatus> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let status = match item {
                Value::Object(point) => text_field(point.get("status")),
                Value::String(text) => Some(text.clone()),
                _ => None,
            }?;
            Some(HealthStatus::from_raw(&status))
        })
        .collect()
}

fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if text.is_empty() || text == "null" {
        None
    } else {
        Some(text)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HealthUrlDocument {
    #[serde(default)]
    health_check_urls: Vec<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn read_url_document(path: &Path) -> anyhow::Result<Option<HealthUrlDocument>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    let document = serde_json::from_str::<HealthUrlDocument>(&contents)?;
    Ok(Some(document))
}

/// Configured health URLs, in order. Unreadable documents count as empty.
pub fn read_health_urls(path: &Path) -> Vec<String> {
    match read_url_document(path) {
        Ok(Some(document)) => document
            .health_check_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect(),
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring health URL document");
            Vec::new()
        }
    }
}

/// Rewrites the URL list, keeping any other keys of the document. A malformed
/// document is left untouched and reported as an error.
pub fn write_health_urls(path: &Path, lock_path: &Path, urls: &[String]) -> anyhow::Result<()> {
    let _lock = lock_config(lock_path).map_err(|err| anyhow::anyhow!(err))?;
    let mut document = read_url_document(path)
        .context("existing document is not valid JSON. Fix or remove it first")?
        .unwrap_or_default();
    document.health_check_urls = urls.to_vec();
    let contents = serde_json::to_string_pretty(&document)?;
    write_atomic(path, format!("{contents}\n").as_bytes()).map_err(|err| anyhow::anyhow!(err))
}

/// Creates an empty URL document if none exists. Returns whether it wrote one.
pub fn init_health_urls(path: &Path, lock_path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_health_urls(path, lock_path, &[])?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ENV_MUTEX, http_ok_response, set_env_guard, spawn_server};
    use serde_json::json;
    use std::collections::HashMap;

    struct StubSource {
        documents: HashMap<String, Value>,
    }

    impl StubSource {
        fn new(entries: &[(&str, Value)]) -> Self {
            StubSource {
                documents: entries
                    .iter()
                    .map(|(url, doc)| (url.to_string(), doc.clone()))
                    .collect(),
            }
        }
    }

    impl StatusSource for StubSource {
        fn fetch(&self, url: &str) -> Result<Value, HealthFetchError> {
            self.documents
                .get(url)
                .cloned()
                .ok_or_else(|| HealthFetchError::Transport("refused".to_string()))
        }
    }

    fn service(status: &str) -> Value {
        json!({"services": {"7": {"status": status, "lastCheck": "2025-01-01T00:00:00Z"}}})
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(HealthStatus::from_raw("operational"), HealthStatus::Ok);
        assert_eq!(HealthStatus::from_raw("OK"), HealthStatus::Ok);
        assert_eq!(HealthStatus::from_raw("failed"), HealthStatus::Error);
        assert_eq!(HealthStatus::from_raw("timeout"), HealthStatus::Timeout);
        assert_eq!(HealthStatus::from_raw("degraded"), HealthStatus::Unknown);
        assert_eq!(HealthStatus::Timeout.icon(), "!");
    }

    #[test]
    fn merge_is_order_sensitive() {
        let source = StubSource::new(&[("a", service("ok")), ("b", service("error"))]);
        let snapshot = fetch_all(&source, &urls(&["a", "b"]));
        assert_eq!(lookup(&snapshot, "7").status, HealthStatus::Error);
        let snapshot = fetch_all(&source, &urls(&["b", "a"]));
        assert_eq!(lookup(&snapshot, "7").status, HealthStatus::Ok);
    }

    #[test]
    fn order_holds_across_batches() {
        let mut entries: Vec<(String, Value)> = (0..9)
            .map(|idx| (format!("u{idx}"), service("timeout")))
            .collect();
        entries.push(("last".to_string(), service("ok")));
        let source = StubSource {
            documents: entries.iter().cloned().collect(),
        };
        let mut list: Vec<String> = entries.iter().map(|(url, _)| url.clone()).collect();
        let snapshot = fetch_all(&source, &list);
        assert_eq!(lookup(&snapshot, "7").status, HealthStatus::Ok);
        list.rotate_right(1);
        let snapshot = fetch_all(&source, &list);
        assert_eq!(lookup(&snapshot, "7").status, HealthStatus::Timeout);
    }

    #[test]
    fn failures_are_recorded_not_fatal() {
        let source = StubSource::new(&[("good", service("ok")), ("array", json!([1, 2]))]);
        let snapshot = fetch_all(&source, &urls(&["down", "good", "array"]));
        assert_eq!(snapshot.services.len(), 1);
        let failed: Vec<&str> = snapshot.failures.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(failed, vec!["down", "array"]);
    }

    #[test]
    fn all_failures_give_empty_snapshot() {
        let source = StubSource::new(&[]);
        let snapshot = fetch_all(&source, &urls(&["x", "y"]));
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.failures.len(), 2);
    }

    #[test]
    fn lookup_unknown_id() {
        let snapshot = HealthSnapshot::default();
        let found = lookup(&snapshot, "missing");
        assert_eq!(found.status, HealthStatus::Unknown);
        assert!(found.last_check.is_none());
        assert!(found.record.is_none());
    }

    #[test]
    fn parses_services_shape() {
        let doc = json!({"services": {
            "12": {
                "status": "operational",
                "lastCheck": "2025-01-01T00:00:00Z",
                "model": "claude-sonnet",
                "group": "vip",
                "latencyMs": 321,
                "timeline": [{"status": "ok"}, {"status": "error"}, "timeout"]
            },
            "bad": "not an object",
            "13": {"lastCheck": null}
        }});
        let records = parse_health_document(&doc);
        assert_eq!(records.len(), 2);
        let first = records.iter().find(|r| r.service_id == "12").unwrap();
        assert_eq!(first.status, HealthStatus::Ok);
        assert_eq!(first.raw_status, "operational");
        assert_eq!(first.latency_ms, Some(321.0));
        assert_eq!(first.label(), "claude-sonnet");
        assert_eq!(
            first.timeline,
            vec![HealthStatus::Ok, HealthStatus::Error, HealthStatus::Timeout]
        );
        let second = records.iter().find(|r| r.service_id == "13").unwrap();
        assert_eq!(second.status, HealthStatus::Unknown);
        assert!(second.last_check.is_none());
    }

    #[test]
    fn parses_providers_shape() {
        let doc = json!({"providers": [
            {"id": 5, "name": "relay", "latest": {"status": "error", "checkedAt": "2025-01-01T00:00:00Z", "latencyMs": "88"}},
            {"name": "named-only", "latest": {"status": "ok"}},
            {"latest": {"status": "ok"}}
        ]});
        let records = parse_health_document(&doc);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].service_id, "5");
        assert_eq!(records[0].status, HealthStatus::Error);
        assert_eq!(records[0].latency_ms, Some(88.0));
        assert_eq!(records[0].last_check.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(records[1].service_id, "named-only");
    }

    #[test]
    fn services_shape_wins_over_providers() {
        let doc = json!({
            "services": {"1": {"status": "ok"}},
            "providers": [{"id": "2", "latest": {"status": "ok"}}]
        });
        let records = parse_health_document(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].service_id, "1");
    }

    #[test]
    fn http_source_reads_documents() {
        let body = r#"{"services":{"3":{"status":"ok"}}}"#;
        let url = spawn_server(http_ok_response(body, "application/json"));
        let snapshot = fetch_all(&HttpStatusSource::new(), &[url]);
        assert_eq!(lookup(&snapshot, "3").status, HealthStatus::Ok);
        assert!(snapshot.failures.is_empty());
    }

    #[test]
    fn http_source_reports_status_codes() {
        let url = spawn_server(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n".to_string(),
        );
        let err = HttpStatusSource::new().fetch(&url).unwrap_err();
        assert!(matches!(err, HealthFetchError::Status(503)));
    }

    #[test]
    fn default_url_honours_env() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|err| err.into_inner());
        {
            let _env = set_env_guard("HEALTH_STATUS_URL", Some("http://127.0.0.1:9/status"));
            assert_eq!(effective_urls(&[]), vec!["http://127.0.0.1:9/status"]);
        }
        {
            let _env = set_env_guard("HEALTH_STATUS_URL", None);
            assert_eq!(effective_urls(&[]), vec![DEFAULT_HEALTH_URL]);
        }
        assert_eq!(effective_urls(&urls(&["x"])), vec!["x"]);
    }

    #[test]
    fn url_document_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("health_check_configs.json");
        let lock = dir.path().join("ai-env.lock");
        assert!(read_health_urls(&path).is_empty());
        assert!(init_health_urls(&path, &lock).unwrap());
        assert!(!init_health_urls(&path, &lock).unwrap());

        fs::write(
            &path,
            r#"{"health_check_urls": [" https://a ", ""], "note": "keep"}"#,
        )
        .unwrap();
        assert_eq!(read_health_urls(&path), vec!["https://a"]);
        write_health_urls(&path, &lock, &urls(&["https://a", "https://b"])).unwrap();
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["note"], "keep");
        assert_eq!(read_health_urls(&path), vec!["https://a", "https://b"]);

        fs::write(&path, "{oops").unwrap();
        assert!(read_health_urls(&path).is_empty());
    }

    #[test]
    fn write_refuses_malformed_url_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("health_check_configs.json");
        let lock = dir.path().join("ai-env.lock");
        fs::write(&path, "{\"health_check_urls\": [\"https://a\"").unwrap();

        let err = write_health_urls(&path, &lock, &urls(&["https://b"])).unwrap_err();
        assert!(err.to_string().contains("Fix or remove it first"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\"health_check_urls\": [\"https://a\""
        );
        assert!(!init_health_urls(&path, &lock).unwrap());
    }
}
