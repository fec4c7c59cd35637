use ai_env::{
    ActivationState, ActiveProfile, Currency, HealthSnapshot, HealthStatus, Pricing, Profile,
    annotate, describe_active, format_time_ago, format_total, lookup, parse_config_value,
    parse_folder_marker, parse_health_document, parse_price, profile_total, rank, resolve_active,
};
use chrono::{TimeZone, Utc};

fn relay(name: &str, input: Option<&str>, output: Option<&str>) -> Profile {
    Profile {
        name: Some(name.to_string()),
        credential: Some(format!("sk-{name}")),
        endpoint: Some(format!("https://{name}.example")),
        pricing: Some(Pricing {
            input: input.map(str::to_string),
            output: output.map(str::to_string),
            description: None,
        }),
        ..Profile::default()
    }
}

#[test]
fn parses_config_value_with_inline_comment() {
    let line = r#"model_provider = "relay" # switched by hand"#;
    let value = parse_config_value(line, "model_provider");
    assert_eq!(value.as_deref(), Some("relay"));
}

#[test]
fn preserves_hash_inside_quotes() {
    let line = r#"base_url = "https://example.com/#/foo" # tail"#;
    let value = parse_config_value(line, "base_url");
    assert_eq!(value.as_deref(), Some("https://example.com/#/foo"));
}

#[test]
fn ignores_other_keys_and_empty_values() {
    assert!(parse_config_value("other = \"value\"", "model_provider").is_none());
    assert!(parse_config_value("model_provider = '' # comment", "model_provider").is_none());
}

#[test]
fn folder_marker_falls_back_to_provider_table() {
    let contents = "model = \"o3\"\n\n[model_providers.relay]\nbase_url = \"https://r\"\n";
    assert_eq!(parse_folder_marker(contents).as_deref(), Some("relay"));
}

#[test]
fn usd_prices_rank_after_cheaper_cny() {
    let usd = parse_price(Some("$2/1M"));
    assert_eq!(usd.currency, Currency::Usd);
    assert_eq!(usd.normalized_cny, 14.0);

    let profiles = vec![
        relay("dollar", Some("$2"), None),
        relay("yuan", Some("¥1"), Some("¥2")),
        relay("free", None, Some("n/a")),
    ];
    let ranked = rank(profiles);
    let names: Vec<&str> = ranked.iter().map(Profile::display_name).collect();
    assert_eq!(names, ["free", "yuan", "dollar"]);
    assert_eq!(format_total(profile_total(&ranked[1])), "¥3.00");
}

#[test]
fn yuan_relay_ranks_before_dollar_relay_per_million_tokens() {
    let profiles = vec![
        relay("dollar", Some("$1/1M tokens"), Some("$1/1M tokens")),
        relay("yuan", Some("¥1.5/1M tokens"), Some("¥1.5/1M tokens")),
    ];
    assert_eq!(profile_total(&profiles[0]), 14.0);
    assert_eq!(profile_total(&profiles[1]), 3.0);

    let ranked = rank(profiles);
    let names: Vec<&str> = ranked.iter().map(Profile::display_name).collect();
    assert_eq!(names, ["yuan", "dollar"]);
    assert_eq!(format_total(profile_total(&ranked[0])), "¥3.00");
    assert_eq!(format_total(profile_total(&ranked[1])), "¥14.00");
}

#[test]
fn rank_is_stable_for_equal_totals() {
    let profiles = vec![
        (0, relay("a", Some("¥5"), None)),
        (1, relay("b", Some("5"), None)),
        (2, relay("c", Some("¥1"), None)),
    ];
    let order: Vec<usize> = rank(profiles).into_iter().map(|(idx, _)| idx).collect();
    assert_eq!(order, [2, 0, 1]);
}

#[test]
fn active_profile_resolution() {
    let profiles = vec![relay("a", None, None), relay("b", None, None), relay("b", None, None)];
    let state = ActivationState {
        credential: Some("sk-b".to_string()),
        endpoint: Some("https://b.example".to_string()),
        folder_marker: None,
    };
    assert_eq!(resolve_active(&profiles, &state), Some(1));

    let unmatched = ActivationState {
        credential: Some("sk-zzzz".to_string()),
        endpoint: Some("https://b.example".to_string()),
        folder_marker: None,
    };
    assert_eq!(
        describe_active(&profiles, &unmatched),
        ActiveProfile::Unmatched {
            hint: "sk-z...".to_string()
        }
    );
    assert_eq!(
        describe_active(&profiles, &ActivationState::default()),
        ActiveProfile::Unconfigured
    );
}

#[test]
fn health_documents_merge_and_annotate() {
    let first = serde_json::json!({
        "services": {
            "7": {"status": "ok", "lastCheck": "2025-01-01T00:00:00Z", "model": "sonnet"},
            "8": {"status": "degraded"}
        }
    });
    let second = serde_json::json!({
        "providers": [
            {"id": "7", "latest": {"status": "timeout", "checkedAt": "2025-01-01T00:00:00Z", "latencyMs": "88"}}
        ]
    });
    let mut snapshot = HealthSnapshot::default();
    snapshot.merge(parse_health_document(&first));
    snapshot.merge(parse_health_document(&second));

    assert_eq!(lookup(&snapshot, "7").status, HealthStatus::Timeout);
    assert_eq!(lookup(&snapshot, "8").status, HealthStatus::Unknown);
    assert_eq!(lookup(&snapshot, "9").status, HealthStatus::Unknown);

    let mut profile = relay("a", None, None);
    profile.channel_id = Some("7".to_string());
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap();
    let annotated = annotate(0, &profile, &snapshot, now);
    assert_eq!(annotated.status, HealthStatus::Timeout);
    assert_eq!(annotated.time_ago, "2 hours ago");
    assert_eq!(annotated.record.and_then(|record| record.latency_ms), Some(88.0));
}

#[test]
fn time_ago_labels() {
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    assert_eq!(format_time_ago(None, now), "");
    assert_eq!(format_time_ago(Some("2025-01-01T23:59:30Z"), now), "just now");
    assert_eq!(format_time_ago(Some("2025-01-01 23:15:00"), now), "45 minutes ago");
    assert_eq!(format_time_ago(Some("2024-12-30T00:00:00Z"), now), "3 days ago");
}
