pub const CANCELLED_MESSAGE: &str = "Cancelled.";

pub const PROFILE_MSG_ADDED: &str = "Added profile {}";
pub const PROFILE_MSG_UPDATED: &str = "Updated profile {}";
pub const PROFILE_MSG_REMOVED: &str = "Removed profile {}";
pub const PROFILE_MSG_EXPORTED: &str = "Exported profile {} for this shell";
pub const PROFILE_MSG_WROTE_PERMANENT: &str = "Wrote profile {} to {}";
pub const PROFILE_MSG_CLEARED: &str = "Cleared {} variables for this shell";
pub const PROFILE_MSG_CLEARED_PERMANENT: &str = "Removed {} variables from {}";
pub const PROFILE_MSG_FOLDER_SWITCHED: &str = "Switched to profile {}: copied folder '{}' into {}";
pub const PROFILE_MSG_NO_SEARCH_MATCH: &str = "No profiles match '{}'.";
pub const PROFILE_HINT_EVAL: &str = "Run {eval} to apply it to the current shell.";
pub const PROFILE_HINT_SOURCE: &str = "Run {source} or open a new shell to apply it.";
pub const PROFILE_PRICE: &str = "price {}";
pub const PROFILE_UNNAMED: &str = "(unnamed)";

pub const PROFILE_ERR_FIELD_EMPTY: &str = "Error: --{} cannot be empty.";
pub const PROFILE_ERR_NAME_EMPTY: &str = "Error: Name cannot be empty.";
pub const PROFILE_ERR_NAME_NO_MATCH: &str = "Error: No profile name contains '{}'. {}";
pub const PROFILE_ERR_NAME_AMBIGUOUS: &str =
    "Error: '{}' matches several profiles: {}\nPass --index or a longer name.";
pub const PROFILE_ERR_FOLDER_INVALID: &str = "Error: Invalid codex folder name '{}'";
pub const PROFILE_ERR_FOLDER_MISSING: &str = "Error: Codex folder {} does not exist";
pub const PROFILE_ERR_FOLDER_FILE_MISSING: &str = "Error: Codex folder file {} is missing";
pub const PROFILE_ERR_TTY_REQUIRED: &str =
    "Error: {} selection requires a TTY. Run `{} {} --index N` instead.";
pub const PROFILE_ERR_DELETE_CONFIRM_REQUIRED: &str =
    "Error: Removal requires confirmation. Re-run with `--yes` to skip the prompt.";
pub const PROFILE_ERR_PROMPT_DELETE: &str = "Error: Could not prompt for removal: {}";
pub const PROFILE_ERR_PROMPT_CONTEXT: &str = "Error: Could not prompt for {}: {}";

pub const PROFILE_PROMPT_REMOVE: &str = "Remove profile {}? This cannot be undone.";
pub const PROFILE_SELECT_TITLE: &str = "Select a profile";
pub const PROFILE_SELECT_HELP: &str = "Type to search • Use ↑/↓ to select • ENTER to confirm";

pub const STATUS_ACTIVE: &str = "Active {} profile: {}";
pub const STATUS_UNCONFIGURED: &str = "No {} profile is active in this shell.";
pub const STATUS_UNMATCHED: &str = "The active {} settings ({}) do not match any stored profile.";
pub const STATUS_DETAIL_ENDPOINT: &str = "URL:     {}";
pub const STATUS_DETAIL_GROUP: &str = "Group:   {}";
pub const STATUS_DETAIL_CHANNEL: &str = "Channel: {}";
pub const STATUS_DETAIL_HEALTH: &str = "Health:  {} {}";
pub const STATUS_DETAIL_HISTORY: &str = "History: {}";
pub const STATUS_DETAIL_NONE: &str = "-";

pub const HEALTH_CHECKED_AGO: &str = "checked {}";
pub const HEALTH_LATENCY: &str = "{} ms";
pub const HEALTH_NO_SERVICES: &str = "No services reported a status.";
pub const HEALTH_WARN_POLL_FAILED: &str = "Could not poll {}: {}";

pub const URLS_DEFAULT_IN_USE: &str = "No health URLs configured. Using the default: {}";
pub const URLS_MSG_ADDED: &str = "Added health URL {}";
pub const URLS_MSG_REMOVED: &str = "Removed health URL {}";
pub const URLS_MSG_EXISTS: &str = "Health URL {} is already configured.";
pub const URLS_ERR_EMPTY: &str = "Error: URL cannot be empty.";
pub const URLS_ERR_NOT_FOUND: &str = "Error: Health URL {} is not configured.";

pub const INIT_MSG_CREATED: &str = "Created {}";
pub const INIT_MSG_EXISTS: &str = "Already exists: {}";

pub const SHELL_ERR_QUOTE: &str = "Error: Cannot quote value of {} for the shell: {}";
pub const SHELL_ERR_READ_RC: &str = "Error: Cannot read shell config {}";

pub const UI_WARNING_PREFIX: &str = "Warning: ";
pub const UI_INFO_PREFIX: &str = "Info: {}";
pub const UI_NO_PROFILES: &str = "No {} profiles. {}";
pub const UI_HINT_ADD_PROFILE: &str = "Run {add} to add one.";
pub const UI_HINT_LIST_PROFILES: &str = "Run {list} to see stored profiles.";
pub const UI_ERROR_PREFIX: &str = "Error:";

pub const COMMON_ERR_RESOLVE_HOME: &str = "Error: Could not resolve home directory";
pub const COMMON_ERR_EXISTS_NOT_DIR: &str = "Error: {} exists and is not a directory";
pub const COMMON_ERR_CREATE_CONFIG_DIR: &str = "Error: Cannot create config directory {}: {}";
pub const COMMON_ERR_SET_PERMISSIONS: &str = "Error: Cannot set permissions on {}: {}";
pub const COMMON_ERR_WRITE_LOCK_FILE: &str = "Error: Cannot write config lock file {}: {}";
pub const COMMON_ERR_RESOLVE_PARENT: &str = "Error: Cannot resolve parent directory for {}";
pub const COMMON_ERR_CREATE_DIR: &str = "Error: Cannot create directory {}: {}";
pub const COMMON_ERR_INVALID_FILE_NAME: &str = "Error: Invalid file name {}";
pub const COMMON_ERR_GET_TIME: &str = "Error: Failed to get time: {}";
pub const COMMON_ERR_CREATE_TEMP: &str = "Error: Failed to create temp file for {}: {}";
pub const COMMON_ERR_WRITE_TEMP: &str = "Error: Failed to write temp file for {}: {}";
pub const COMMON_ERR_SET_TEMP_PERMISSIONS: &str =
    "Error: Failed to set temp file permissions for {}: {}";
pub const COMMON_ERR_REPLACE_FILE: &str = "Error: Failed to replace {}: {}";
pub const COMMON_ERR_READ_METADATA: &str = "Error: Failed to read metadata for {}: {}";
pub const COMMON_ERR_READ_FILE: &str = "Error: Failed to read {}: {}";
pub const COMMON_ERR_EXISTS_NOT_FILE: &str = "Error: {} exists and is not a file";
pub const COMMON_ERR_WRITE_URLS: &str = "Error: Cannot write health URLs to {}: {}";
pub const COMMON_ERR_LOCK_OPEN: &str = "Error: Could not open config lock: {}";
pub const COMMON_ERR_LOCK_ACQUIRE: &str =
    "Error: Could not acquire config lock. Ensure no other {} is running and retry.";
pub const COMMON_ERR_LOCK_HELD: &str = "Error: Could not lock config files: {}";

pub fn msg1(template: &str, a: impl std::fmt::Display) -> String {
    template.replacen("{}", &a.to_string(), 1)
}

pub fn msg2(template: &str, a: impl std::fmt::Display, b: impl std::fmt::Display) -> String {
    let out = template.replacen("{}", &a.to_string(), 1);
    out.replacen("{}", &b.to_string(), 1)
}

pub fn msg3(
    template: &str,
    a: impl std::fmt::Display,
    b: impl std::fmt::Display,
    c: impl std::fmt::Display,
) -> String {
    let out = template.replacen("{}", &a.to_string(), 1);
    let out = out.replacen("{}", &b.to_string(), 1);
    out.replacen("{}", &c.to_string(), 1)
}
