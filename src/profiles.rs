use chrono::Utc;
use inquire::{Confirm, Select};
use std::fmt;
use std::fs;
use std::io::{self, IsTerminal as _};

use crate::{
    CANCELLED_MESSAGE, HEALTH_CHECKED_AGO, HEALTH_LATENCY, HEALTH_NO_SERVICES,
    HEALTH_WARN_POLL_FAILED, INIT_MSG_CREATED, INIT_MSG_EXISTS, PROFILE_ERR_DELETE_CONFIRM_REQUIRED,
    PROFILE_ERR_FIELD_EMPTY, PROFILE_ERR_FOLDER_FILE_MISSING, PROFILE_ERR_FOLDER_INVALID,
    PROFILE_ERR_FOLDER_MISSING, PROFILE_ERR_NAME_AMBIGUOUS, PROFILE_ERR_NAME_EMPTY,
    PROFILE_ERR_NAME_NO_MATCH, PROFILE_ERR_PROMPT_CONTEXT, PROFILE_ERR_PROMPT_DELETE,
    PROFILE_ERR_TTY_REQUIRED, PROFILE_HINT_EVAL, PROFILE_HINT_SOURCE, PROFILE_MSG_ADDED,
    PROFILE_MSG_CLEARED, PROFILE_MSG_CLEARED_PERMANENT, PROFILE_MSG_EXPORTED,
    PROFILE_MSG_FOLDER_SWITCHED, PROFILE_MSG_NO_SEARCH_MATCH, PROFILE_MSG_REMOVED,
    PROFILE_MSG_UPDATED, PROFILE_MSG_WROTE_PERMANENT, PROFILE_PRICE, PROFILE_PROMPT_REMOVE,
    PROFILE_SELECT_HELP, PROFILE_SELECT_TITLE, PROFILE_UNNAMED, STATUS_ACTIVE, STATUS_DETAIL_CHANNEL,
    STATUS_DETAIL_ENDPOINT, STATUS_DETAIL_GROUP, STATUS_DETAIL_HEALTH, STATUS_DETAIL_HISTORY,
    STATUS_DETAIL_NONE, STATUS_UNCONFIGURED, STATUS_UNMATCHED, URLS_DEFAULT_IN_USE,
    URLS_ERR_EMPTY, URLS_ERR_NOT_FOUND, URLS_MSG_ADDED, URLS_MSG_EXISTS, URLS_MSG_REMOVED,
    COMMON_ERR_CREATE_DIR, COMMON_ERR_RESOLVE_HOME, COMMON_ERR_WRITE_URLS,
};
use crate::{
    ActivationState, ActiveProfile, AnnotatedProfile, HealthRecord, HealthSnapshot,
    HttpStatusSource, Paths, Pricing, ProcessEnv, Profile, ProfileFamily, ProfileStore, Style,
    annotate, build_export_lines, build_unset_lines, command_name, copy_atomic,
    default_health_url, describe_active, determine_shell_config, effective_urls, fetch_all,
    format_action, format_cmd, format_current_marker, format_detail, format_entry_header,
    format_group, format_hint, format_history, format_list_hint, format_no_profiles,
    format_status_badge, format_total, format_time_ago, format_warning, init_health_urls,
    inquire_select_render_config, is_inquire_cancel, print_output_block, profile_total, rank,
    read_health_urls, remove_permanent, resolve_active, resolve_home_dir, write_health_urls,
    write_permanent,
};

const CODEX_FOLDER_FILES: [&str; 2] = ["config.toml", "auth.json"];

/// What every command needs: where things live, which family, how to render.
pub struct CommandCtx<'a> {
    pub paths: &'a Paths,
    pub family: ProfileFamily,
    pub style: Style,
}

impl CommandCtx<'_> {
    fn store(&self) -> ProfileStore {
        ProfileStore::new(self.paths, self.family)
    }

    fn activation(&self) -> ActivationState {
        ActivationState::capture(self.family, &ProcessEnv, &self.paths.codex_config)
    }
}

/// Field values from `add` / `edit`. `None` leaves a field alone; an empty
/// string clears an optional field.
#[derive(Clone, Debug, Default)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub credential: Option<String>,
    pub endpoint: Option<String>,
    pub channel_id: Option<String>,
    pub group: Option<String>,
    pub codex_folder: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub description: Option<String>,
}

impl ProfileFields {
    fn apply(self, profile: &mut Profile) -> Result<(), String> {
        for (flag, value, target) in [
            ("name", self.name, &mut profile.name),
            ("key", self.credential, &mut profile.credential),
            ("url", self.endpoint, &mut profile.endpoint),
        ] {
            if let Some(value) = value {
                let value = value.trim();
                if value.is_empty() {
                    return Err(crate::msg1(PROFILE_ERR_FIELD_EMPTY, flag));
                }
                *target = Some(value.to_string());
            }
        }
        for (value, target) in [
            (self.channel_id, &mut profile.channel_id),
            (self.group, &mut profile.group),
            (self.codex_folder, &mut profile.codex_folder),
        ] {
            if let Some(value) = value {
                *target = non_empty(value);
            }
        }
        if self.input.is_some() || self.output.is_some() || self.description.is_some() {
            let pricing = profile.pricing.get_or_insert_with(Pricing::default);
            for (value, target) in [
                (self.input, &mut pricing.input),
                (self.output, &mut pricing.output),
                (self.description, &mut pricing.description),
            ] {
                if let Some(value) = value {
                    *target = non_empty(value);
                }
            }
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn list_profiles(
    ctx: &CommandCtx,
    search: Option<&str>,
    by_price: bool,
    no_health: bool,
) -> Result<(), String> {
    let style = ctx.style;
    let profiles = ctx.store().list();
    if profiles.is_empty() {
        print_output_block(&format_no_profiles(ctx.family, style), style);
        return Ok(());
    }
    let active = resolve_active(&profiles, &ctx.activation());
    let snapshot = if no_health {
        HealthSnapshot::default()
    } else {
        poll_health(ctx)
    };
    let now = Utc::now();
    let needle = search.map(|text| text.trim().to_lowercase());
    let mut entries: Vec<AnnotatedProfile> = profiles
        .iter()
        .enumerate()
        .filter(|(_, profile)| matches_search(profile, needle.as_deref()))
        .map(|(index, profile)| annotate(index, profile, &snapshot, now))
        .collect();
    if entries.is_empty() {
        let message = crate::msg1(PROFILE_MSG_NO_SEARCH_MATCH, search.unwrap_or_default());
        print_output_block(&message, style);
        return Ok(());
    }
    if by_price {
        entries = rank(entries);
    }
    let lines = render_entries(&entries, active, !no_health, style.color_out);
    print_output_block(&lines.join("\n"), style);
    Ok(())
}

fn matches_search(profile: &Profile, needle: Option<&str>) -> bool {
    let Some(needle) = needle.filter(|needle| !needle.is_empty()) else {
        return true;
    };
    [
        profile.name.as_deref(),
        profile.group.as_deref(),
        profile.channel_id.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

fn profile_title(index: usize, profile: &Profile) -> String {
    let name = profile.name.as_deref().unwrap_or(PROFILE_UNNAMED);
    format!("[{index}] {name}")
}

fn render_entries(
    entries: &[AnnotatedProfile],
    active: Option<usize>,
    show_health: bool,
    use_color: bool,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        let mut header = String::new();
        if show_health {
            header.push_str(&format_status_badge(entry.status, use_color));
            header.push(' ');
        }
        let title = profile_title(entry.index, entry.profile);
        header.push_str(&format_entry_header(&title, use_color));
        header.push_str(&format_group(entry.profile.group.as_deref(), use_color));
        if active == Some(entry.index) {
            header.push(' ');
            header.push_str(&format_current_marker(use_color));
        }
        lines.push(header);

        let mut details = Vec::new();
        if entry.profile.pricing.is_some() {
            let total = format_total(profile_total(entry.profile));
            details.push(crate::msg1(PROFILE_PRICE, total));
        }
        if show_health && !entry.time_ago.is_empty() {
            details.push(crate::msg1(HEALTH_CHECKED_AGO, &entry.time_ago));
        }
        if let Some(latency) = entry.record.and_then(|record| record.latency_ms) {
            details.push(crate::msg1(HEALTH_LATENCY, latency.round()));
        }
        if !details.is_empty() {
            let detail = format!("    {}", details.join(" · "));
            lines.push(format_detail(&detail, use_color));
        }
    }
    lines
}

pub fn status_profile(ctx: &CommandCtx, no_health: bool) -> Result<(), String> {
    let style = ctx.style;
    let use_color = style.color_out;
    let profiles = ctx.store().list();
    let index = match describe_active(&profiles, &ctx.activation()) {
        ActiveProfile::Matched(index) => index,
        ActiveProfile::Unconfigured => {
            let message = crate::msg1(STATUS_UNCONFIGURED, ctx.family);
            print_output_block(&message, style);
            return Ok(());
        }
        ActiveProfile::Unmatched { hint } => {
            let message = crate::msg2(STATUS_UNMATCHED, ctx.family, hint);
            let message = format!("{message}{}", format_list_hint(style));
            print_output_block(&message, style);
            return Ok(());
        }
    };
    let profile = &profiles[index];
    let snapshot = if no_health {
        HealthSnapshot::default()
    } else {
        poll_health(ctx)
    };
    let entry = annotate(index, profile, &snapshot, Utc::now());

    let title = crate::msg2(STATUS_ACTIVE, ctx.family, profile_title(index, profile));
    let mut lines = vec![format_entry_header(&title, use_color)];
    lines.push(crate::msg1(
        STATUS_DETAIL_ENDPOINT,
        profile.endpoint.as_deref().unwrap_or_default(),
    ));
    lines.push(crate::msg1(
        STATUS_DETAIL_GROUP,
        profile.group.as_deref().unwrap_or(STATUS_DETAIL_NONE),
    ));
    lines.push(crate::msg1(
        STATUS_DETAIL_CHANNEL,
        profile.channel_id.as_deref().unwrap_or(STATUS_DETAIL_NONE),
    ));
    if profile.pricing.is_some() {
        lines.push(crate::msg1(PROFILE_PRICE, format_total(profile_total(profile))));
    }
    if !no_health {
        let badge = format_status_badge(entry.status, use_color);
        let raw = entry
            .record
            .map(|record| record.raw_status.as_str())
            .unwrap_or(entry.status.as_str());
        let mut health = crate::msg2(STATUS_DETAIL_HEALTH, badge, raw);
        if !entry.time_ago.is_empty() {
            health.push_str(&format!(" ({})", entry.time_ago));
        }
        lines.push(health);
        if let Some(record) = entry.record
            && !record.timeline.is_empty()
        {
            let bar = format_history(&record.timeline, use_color);
            lines.push(crate::msg1(STATUS_DETAIL_HISTORY, bar));
        }
    }
    print_output_block(&lines.join("\n"), style);
    Ok(())
}

pub fn use_profile(
    ctx: &CommandCtx,
    index: Option<usize>,
    name: Option<String>,
    permanent: bool,
) -> Result<(), String> {
    let style = ctx.style;
    let profiles = ctx.store().list();
    if profiles.is_empty() {
        return Err(format_no_profiles(ctx.family, style));
    }
    let index = pick_profile(ctx, &profiles, index, name.as_deref(), "use")?;
    let profile = &profiles[index];
    let title = profile_title(index, profile);

    if ctx.family.uses_folder_marker()
        && let Some(folder) = profile.codex_folder.as_deref()
    {
        copy_codex_folder(ctx.paths, folder)?;
        let message = crate::msg3(
            PROFILE_MSG_FOLDER_SWITCHED,
            title,
            folder,
            ctx.paths.codex_home.display(),
        );
        eprintln!("{}", format_action(&message, style.color_err));
        return Ok(());
    }

    let vars = [
        (
            ctx.family.credential_env(),
            profile.credential.as_deref().unwrap_or_default(),
        ),
        (
            ctx.family.endpoint_env(),
            profile.endpoint.as_deref().unwrap_or_default(),
        ),
    ];
    if permanent {
        let rc = shell_rc_path()?;
        write_permanent(&rc, &ctx.paths.lock, &vars)?;
        let message = crate::msg2(PROFILE_MSG_WROTE_PERMANENT, title, rc.display());
        let source = format_cmd(&format!("source {}", rc.display()), style.color_out);
        let hint = format_hint(&PROFILE_HINT_SOURCE.replace("{source}", &source), style);
        print_output_block(&format!("{}{hint}", format_action(&message, style.color_out)), style);
        return Ok(());
    }

    // stdout carries only what `eval` should run; everything else goes to stderr.
    println!("{}", build_export_lines(&vars)?);
    let message = crate::msg1(PROFILE_MSG_EXPORTED, title);
    eprintln!("{}", format_action(&message, style.color_err));
    let eval = format!(
        "eval \"$({} --type {} use --index {index})\"",
        command_name(),
        ctx.family
    );
    let eval = format_cmd(&eval, style.color_err);
    eprintln!("{}", PROFILE_HINT_EVAL.replace("{eval}", &eval));
    Ok(())
}

pub fn clear_profile(ctx: &CommandCtx, permanent: bool) -> Result<(), String> {
    let style = ctx.style;
    let keys = ctx.family.env_keys();
    if permanent {
        let rc = shell_rc_path()?;
        remove_permanent(&rc, &ctx.paths.lock, &keys)?;
        let message = crate::msg2(PROFILE_MSG_CLEARED_PERMANENT, ctx.family, rc.display());
        print_output_block(&format_action(&message, style.color_out), style);
        return Ok(());
    }
    println!("{}", build_unset_lines(&keys));
    let message = crate::msg1(PROFILE_MSG_CLEARED, ctx.family);
    eprintln!("{}", format_action(&message, style.color_err));
    Ok(())
}

pub fn add_profile(ctx: &CommandCtx, fields: ProfileFields) -> Result<(), String> {
    let mut profile = Profile::default();
    fields.apply(&mut profile)?;
    for (flag, value) in [
        ("name", &profile.name),
        ("key", &profile.credential),
        ("url", &profile.endpoint),
    ] {
        if value.is_none() {
            return Err(crate::msg1(PROFILE_ERR_FIELD_EMPTY, flag));
        }
    }
    let index = ctx.store().append(&profile)?;
    let message = crate::msg1(PROFILE_MSG_ADDED, profile_title(index, &profile));
    print_output_block(&format_action(&message, ctx.style.color_out), ctx.style);
    Ok(())
}

pub fn edit_profile(ctx: &CommandCtx, index: usize, fields: ProfileFields) -> Result<(), String> {
    let store = ctx.store();
    let mut profile = store.get(index)?;
    fields.apply(&mut profile)?;
    store.replace(index, &profile)?;
    let message = crate::msg1(PROFILE_MSG_UPDATED, profile_title(index, &profile));
    print_output_block(&format_action(&message, ctx.style.color_out), ctx.style);
    Ok(())
}

pub fn remove_profile(ctx: &CommandCtx, index: Option<usize>, yes: bool) -> Result<(), String> {
    let style = ctx.style;
    let store = ctx.store();
    let profiles = store.list();
    if profiles.is_empty() {
        print_output_block(&format_no_profiles(ctx.family, style), style);
        return Ok(());
    }
    let index = pick_profile(ctx, &profiles, index, None, "remove")?;
    let title = profile_title(index, &profiles[index]);
    if !yes && !confirm_remove(&title, style)? {
        return Err(CANCELLED_MESSAGE.to_string());
    }
    let removed = store.remove(index)?;
    let message = crate::msg1(PROFILE_MSG_REMOVED, profile_title(index, &removed));
    print_output_block(&format_action(&message, style.color_out), style);
    Ok(())
}

pub fn init_config(ctx: &CommandCtx) -> Result<(), String> {
    let style = ctx.style;
    let mut lines = Vec::new();
    for family in [ProfileFamily::Claude, ProfileFamily::Codex] {
        let store = ProfileStore::new(ctx.paths, family);
        let template = if store.init()? {
            INIT_MSG_CREATED
        } else {
            INIT_MSG_EXISTS
        };
        lines.push(crate::msg1(template, store.path().display()));
    }
    let created = init_health_urls(&ctx.paths.health_urls, &ctx.paths.lock)
        .map_err(|err| crate::msg2(COMMON_ERR_WRITE_URLS, ctx.paths.health_urls.display(), err))?;
    let template = if created {
        INIT_MSG_CREATED
    } else {
        INIT_MSG_EXISTS
    };
    lines.push(crate::msg1(template, ctx.paths.health_urls.display()));
    let lines: Vec<String> = lines
        .iter()
        .map(|line| format_action(line, style.color_out))
        .collect();
    print_output_block(&lines.join("\n"), style);
    Ok(())
}

pub fn health_report(ctx: &CommandCtx) -> Result<(), String> {
    let style = ctx.style;
    let snapshot = poll_health(ctx);
    if snapshot.is_empty() {
        print_output_block(HEALTH_NO_SERVICES, style);
        return Ok(());
    }
    let now = Utc::now();
    let lines: Vec<String> = snapshot
        .services
        .values()
        .map(|record| health_line(record, now, style.color_out))
        .collect();
    print_output_block(&lines.join("\n"), style);
    Ok(())
}

fn health_line(record: &HealthRecord, now: chrono::DateTime<Utc>, use_color: bool) -> String {
    let mut line = format!(
        "{} {} {}",
        format_status_badge(record.status, use_color),
        format_entry_header(&record.service_id, use_color),
        record.label(),
    );
    line.push_str(&format!(" {}", record.raw_status));
    let ago = format_time_ago(record.last_check.as_deref(), now);
    let mut details = Vec::new();
    if !ago.is_empty() {
        details.push(crate::msg1(HEALTH_CHECKED_AGO, ago));
    }
    if let Some(latency) = record.latency_ms {
        details.push(crate::msg1(HEALTH_LATENCY, latency.round()));
    }
    if !details.is_empty() {
        line.push_str(&format_detail(&format!(" · {}", details.join(" · ")), use_color));
    }
    line
}

pub fn list_urls(ctx: &CommandCtx) -> Result<(), String> {
    let urls = read_health_urls(&ctx.paths.health_urls);
    let message = if urls.is_empty() {
        crate::msg1(URLS_DEFAULT_IN_USE, default_health_url())
    } else {
        urls.iter()
            .enumerate()
            .map(|(idx, url)| format!("[{idx}] {url}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    print_output_block(&message, ctx.style);
    Ok(())
}

pub fn add_url(ctx: &CommandCtx, url: &str) -> Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(URLS_ERR_EMPTY.to_string());
    }
    let mut urls = read_health_urls(&ctx.paths.health_urls);
    if urls.iter().any(|existing| existing == url) {
        print_output_block(&crate::msg1(URLS_MSG_EXISTS, url), ctx.style);
        return Ok(());
    }
    urls.push(url.to_string());
    save_urls(ctx, &urls)?;
    let message = format_action(&crate::msg1(URLS_MSG_ADDED, url), ctx.style.color_out);
    print_output_block(&message, ctx.style);
    Ok(())
}

pub fn remove_url(ctx: &CommandCtx, url: &str) -> Result<(), String> {
    let url = url.trim();
    let mut urls = read_health_urls(&ctx.paths.health_urls);
    let before = urls.len();
    urls.retain(|existing| existing != url);
    if urls.len() == before {
        return Err(crate::msg1(URLS_ERR_NOT_FOUND, url));
    }
    save_urls(ctx, &urls)?;
    let message = format_action(&crate::msg1(URLS_MSG_REMOVED, url), ctx.style.color_out);
    print_output_block(&message, ctx.style);
    Ok(())
}

fn save_urls(ctx: &CommandCtx, urls: &[String]) -> Result<(), String> {
    write_health_urls(&ctx.paths.health_urls, &ctx.paths.lock, urls)
        .map_err(|err| crate::msg2(COMMON_ERR_WRITE_URLS, ctx.paths.health_urls.display(), err))
}

/// Polls the configured health URLs, warning on stderr about any that failed.
fn poll_health(ctx: &CommandCtx) -> HealthSnapshot {
    let urls = effective_urls(&read_health_urls(&ctx.paths.health_urls));
    let snapshot = fetch_all(&HttpStatusSource::new(), &urls);
    for failure in &snapshot.failures {
        let message = crate::msg2(HEALTH_WARN_POLL_FAILED, &failure.url, &failure.reason);
        eprintln!("{}", format_warning(&message, ctx.style.color_err));
    }
    snapshot
}

fn shell_rc_path() -> Result<std::path::PathBuf, String> {
    let home = resolve_home_dir().ok_or_else(|| COMMON_ERR_RESOLVE_HOME.to_string())?;
    Ok(determine_shell_config(&home))
}

/// Copies a stored Codex provider folder over the live Codex home.
fn copy_codex_folder(paths: &Paths, folder: &str) -> Result<(), String> {
    if folder.is_empty()
        || folder.contains(['/', '\\'])
        || folder == ".."
        || folder == "."
    {
        return Err(crate::msg1(PROFILE_ERR_FOLDER_INVALID, folder));
    }
    let source = paths.codex_folders.join(folder);
    if !source.is_dir() {
        return Err(crate::msg1(PROFILE_ERR_FOLDER_MISSING, source.display()));
    }
    for file in CODEX_FOLDER_FILES {
        if !source.join(file).is_file() {
            return Err(crate::msg1(
                PROFILE_ERR_FOLDER_FILE_MISSING,
                source.join(file).display(),
            ));
        }
    }
    fs::create_dir_all(&paths.codex_home)
        .map_err(|err| crate::msg2(COMMON_ERR_CREATE_DIR, paths.codex_home.display(), err))?;
    for file in CODEX_FOLDER_FILES {
        copy_atomic(&source.join(file), &paths.codex_home.join(file))?;
    }
    tracing::debug!(folder, target = %paths.codex_home.display(), "copied codex folder");
    Ok(())
}

fn pick_profile(
    ctx: &CommandCtx,
    profiles: &[Profile],
    index: Option<usize>,
    name: Option<&str>,
    action: &str,
) -> Result<usize, String> {
    if let Some(index) = index {
        if index >= profiles.len() {
            return Err(crate::StoreError::NotFound {
                index,
                len: profiles.len(),
            }
            .to_string());
        }
        return Ok(index);
    }
    if let Some(name) = name {
        return select_by_name(profiles, name, ctx.style);
    }
    require_tty(action)?;
    select_profile(profiles, ctx.style)
}

/// Case-insensitive substring match on the profile name. Exactly one match
/// is required.
fn select_by_name(profiles: &[Profile], name: &str, style: Style) -> Result<usize, String> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Err(PROFILE_ERR_NAME_EMPTY.to_string());
    }
    let matches: Vec<usize> = profiles
        .iter()
        .enumerate()
        .filter(|(_, profile)| profile.display_name().to_lowercase().contains(&needle))
        .map(|(index, _)| index)
        .collect();
    match matches.as_slice() {
        [] => Err(crate::msg2(
            PROFILE_ERR_NAME_NO_MATCH,
            name.trim(),
            format_list_hint(style),
        )),
        [index] => Ok(*index),
        many => {
            let options = many
                .iter()
                .map(|index| profile_title(*index, &profiles[*index]))
                .collect::<Vec<_>>()
                .join(", ");
            Err(crate::msg2(PROFILE_ERR_NAME_AMBIGUOUS, name.trim(), options))
        }
    }
}

pub(crate) fn require_tty(action: &str) -> Result<(), String> {
    require_tty_with(io::stdin().is_terminal(), action)
}

fn require_tty_with(is_tty: bool, action: &str) -> Result<(), String> {
    if is_tty {
        Ok(())
    } else {
        Err(crate::msg3(
            PROFILE_ERR_TTY_REQUIRED,
            action,
            command_name(),
            action,
        ))
    }
}

#[derive(Clone)]
struct Candidate {
    index: usize,
    display: String,
    use_color: bool,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format_entry_header(&self.display, self.use_color);
        write!(f, "{header}")
    }
}

fn select_profile(profiles: &[Profile], style: Style) -> Result<usize, String> {
    let options: Vec<Candidate> = profiles
        .iter()
        .enumerate()
        .map(|(index, profile)| Candidate {
            index,
            display: format!(
                "{}{}",
                profile_title(index, profile),
                format_group(profile.group.as_deref(), false)
            ),
            use_color: style.color_err,
        })
        .collect();
    let prompt = Select::new(PROFILE_SELECT_TITLE, options)
        .with_help_message(PROFILE_SELECT_HELP)
        .with_render_config(inquire_select_render_config(style.color_err))
        .prompt();
    handle_inquire_result(prompt, "selection").map(|candidate| candidate.index)
}

fn confirm_remove(title: &str, style: Style) -> Result<bool, String> {
    let is_tty = io::stdin().is_terminal();
    if !is_tty {
        return Err(PROFILE_ERR_DELETE_CONFIRM_REQUIRED.to_string());
    }
    let selection = Confirm::new(&crate::msg1(PROFILE_PROMPT_REMOVE, title))
        .with_default(false)
        .with_render_config(inquire_select_render_config(style.color_err))
        .prompt();
    confirm_remove_with(is_tty, selection)
}

fn confirm_remove_with(
    is_tty: bool,
    selection: Result<bool, inquire::error::InquireError>,
) -> Result<bool, String> {
    if !is_tty {
        return Err(PROFILE_ERR_DELETE_CONFIRM_REQUIRED.to_string());
    }
    match selection {
        Ok(value) => Ok(value),
        Err(err) if is_inquire_cancel(&err) => Err(CANCELLED_MESSAGE.to_string()),
        Err(err) => Err(crate::msg1(PROFILE_ERR_PROMPT_DELETE, err)),
    }
}

fn handle_inquire_result<T>(
    result: Result<T, inquire::error::InquireError>,
    context: &str,
) -> Result<T, String> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if is_inquire_cancel(&err) => Err(CANCELLED_MESSAGE.to_string()),
        Err(err) => Err(crate::msg2(PROFILE_ERR_PROMPT_CONTEXT, context, err)),
    }
}
