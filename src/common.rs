use directories::BaseDirs;
use fslock::LockFile;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(test)]
use std::cell::Cell;
#[cfg(test)]
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    COMMON_ERR_CREATE_CONFIG_DIR, COMMON_ERR_CREATE_DIR, COMMON_ERR_CREATE_TEMP,
    COMMON_ERR_EXISTS_NOT_DIR, COMMON_ERR_EXISTS_NOT_FILE, COMMON_ERR_GET_TIME,
    COMMON_ERR_INVALID_FILE_NAME, COMMON_ERR_LOCK_ACQUIRE, COMMON_ERR_LOCK_HELD,
    COMMON_ERR_LOCK_OPEN, COMMON_ERR_READ_FILE, COMMON_ERR_READ_METADATA,
    COMMON_ERR_REPLACE_FILE, COMMON_ERR_RESOLVE_HOME, COMMON_ERR_RESOLVE_PARENT,
    COMMON_ERR_SET_PERMISSIONS, COMMON_ERR_SET_TEMP_PERMISSIONS, COMMON_ERR_WRITE_LOCK_FILE,
    COMMON_ERR_WRITE_TEMP,
};

const CONFIG_DIR_NAME: &str = ".ai-env";
const CODEX_DIR_NAME: &str = ".codex";
#[cfg(not(test))]
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(200);

pub struct Paths {
    pub config: PathBuf,
    pub claude_store: PathBuf,
    pub codex_store: PathBuf,
    pub health_urls: PathBuf,
    pub codex_folders: PathBuf,
    pub codex_home: PathBuf,
    pub codex_config: PathBuf,
    pub lock: PathBuf,
}

pub fn command_name() -> &'static str {
    static COMMAND_NAME: OnceLock<String> = OnceLock::new();
    COMMAND_NAME
        .get_or_init(|| {
            let env_value = env::var("AI_ENV_COMMAND").ok();
            compute_command_name_from(env_value, env::args_os())
        })
        .as_str()
}

fn compute_command_name_from<I>(env_value: Option<String>, mut args: I) -> String
where
    I: Iterator<Item = std::ffi::OsString>,
{
    if let Some(value) = env_value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    args.next()
        .and_then(|arg| {
            Path::new(&arg)
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| package_command_name().to_string())
}

pub fn package_command_name() -> &'static str {
    "ai-env"
}

#[cfg(unix)]
const FAIL_SET_PERMISSIONS: usize = 1;
const FAIL_WRITE_OPEN: usize = 2;
const FAIL_WRITE_WRITE: usize = 3;
const FAIL_WRITE_PERMS: usize = 4;
const FAIL_WRITE_SYNC: usize = 5;
const FAIL_WRITE_RENAME: usize = 6;
#[cfg(test)]
const FAIL_LOCK_ERR: usize = 7;
#[cfg(test)]
const FAIL_LOCK_BUSY: usize = 8;

#[cfg(test)]
thread_local! {
    static FAILPOINT: Cell<usize> = const { Cell::new(0) };
}
#[cfg(test)]
static FAILPOINT_LOCK: Mutex<()> = Mutex::new(());

#[cfg(test)]
fn maybe_fail(step: usize) -> std::io::Result<()> {
    if FAILPOINT.with(|failpoint| failpoint.get()) == step {
        return Err(std::io::Error::other("failpoint"));
    }
    Ok(())
}

#[cfg(not(test))]
fn maybe_fail(_step: usize) -> std::io::Result<()> {
    Ok(())
}

pub fn resolve_paths() -> Result<Paths, String> {
    let config_override = env::var_os("AI_ENV_HOME").map(PathBuf::from);
    let codex_override = env::var_os("CODEX_HOME").map(PathBuf::from);
    let user_home = resolve_home_dir();
    let config = non_empty_path(config_override)
        .or_else(|| user_home.as_ref().map(|home| home.join(CONFIG_DIR_NAME)))
        .ok_or_else(|| COMMON_ERR_RESOLVE_HOME.to_string())?;
    let codex_home = non_empty_path(codex_override)
        .or_else(|| user_home.as_ref().map(|home| home.join(CODEX_DIR_NAME)))
        .ok_or_else(|| COMMON_ERR_RESOLVE_HOME.to_string())?;
    Ok(paths_for(config, codex_home))
}

pub(crate) fn paths_for(config: PathBuf, codex_home: PathBuf) -> Paths {
    Paths {
        claude_store: config.join("claude_configs.json"),
        codex_store: config.join("codex_configs.json"),
        health_urls: config.join("health_check_configs.json"),
        codex_folders: config.join("codex"),
        lock: config.join("ai-env.lock"),
        codex_config: codex_home.join("config.toml"),
        codex_home,
        config,
    }
}

pub(crate) fn resolve_home_dir() -> Option<PathBuf> {
    let base_home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    let home = env::var_os("HOME").map(PathBuf::from);
    let userprofile = env::var_os("USERPROFILE").map(PathBuf::from);
    let homedrive = env::var_os("HOMEDRIVE").map(PathBuf::from);
    let homepath = env::var_os("HOMEPATH").map(PathBuf::from);
    resolve_home_dir_with(base_home, home, userprofile, homedrive, homepath)
}

fn resolve_home_dir_with(
    base_home: Option<PathBuf>,
    home: Option<PathBuf>,
    userprofile: Option<PathBuf>,
    homedrive: Option<PathBuf>,
    homepath: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = non_empty_path(home) {
        return Some(path);
    }
    if let Some(path) = base_home {
        return Some(path);
    }
    if let Some(path) = non_empty_path(userprofile) {
        return Some(path);
    }
    match (homedrive, homepath) {
        (Some(drive), Some(path)) => {
            let mut out = drive;
            out.push(path);
            if out.as_os_str().is_empty() {
                None
            } else {
                Some(out)
            }
        }
        _ => None,
    }
}

fn non_empty_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|path| !path.as_os_str().is_empty())
}

pub fn ensure_paths(paths: &Paths) -> Result<(), String> {
    if paths.config.exists() && !paths.config.is_dir() {
        return Err(crate::msg1(COMMON_ERR_EXISTS_NOT_DIR, paths.config.display()));
    }

    fs::create_dir_all(&paths.config).map_err(|err| {
        crate::msg2(COMMON_ERR_CREATE_CONFIG_DIR, paths.config.display(), err)
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o700);
        if let Err(err) = set_config_permissions(&paths.config, perms) {
            return Err(crate::msg2(
                COMMON_ERR_SET_PERMISSIONS,
                paths.config.display(),
                err,
            ));
        }
    }

    ensure_file_or_absent(&paths.claude_store)?;
    ensure_file_or_absent(&paths.codex_store)?;
    ensure_file_or_absent(&paths.health_urls)?;
    ensure_file_or_absent(&paths.lock)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.lock)
        .map_err(|err| crate::msg2(COMMON_ERR_WRITE_LOCK_FILE, paths.lock.display(), err))?;

    Ok(())
}

pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), String> {
    let permissions = fs::metadata(path).ok().map(|meta| meta.permissions());
    write_atomic_with_permissions(path, contents, permissions)
}

#[cfg(test)]
pub fn write_atomic_with_mode(path: &Path, contents: &[u8], mode: u32) -> Result<(), String> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = fs::Permissions::from_mode(mode);
        write_atomic_with_permissions(path, contents, Some(permissions))
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
        write_atomic_with_permissions(path, contents, None)
    }
}

fn write_atomic_with_permissions(
    path: &Path,
    contents: &[u8],
    permissions: Option<fs::Permissions>,
) -> Result<(), String> {
    let parent = path
        .parent()
        .ok_or_else(|| crate::msg1(COMMON_ERR_RESOLVE_PARENT, path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .map_err(|err| crate::msg2(COMMON_ERR_CREATE_DIR, parent.display(), err))?;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| crate::msg1(COMMON_ERR_INVALID_FILE_NAME, path.display()))?;
    let pid = std::process::id();
    let mut attempt = 0u32;
    loop {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| crate::msg1(COMMON_ERR_GET_TIME, err))?
            .as_nanos();
        let tmp_name = format!(".{file_name}.tmp-{pid}-{nanos}-{attempt}");
        let tmp_path = parent.join(tmp_name);
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        if let Some(permissions) = permissions.as_ref() {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(permissions.mode());
        }
        let mut tmp_file = match options.open(&tmp_path).and_then(|file| {
            maybe_fail(FAIL_WRITE_OPEN)?;
            Ok(file)
        }) {
            Ok(file) => file,
            Err(err) => {
                attempt += 1;
                if attempt < 5 {
                    continue;
                }
                return Err(crate::msg2(COMMON_ERR_CREATE_TEMP, path.display(), err));
            }
        };

        if let Err(err) = maybe_fail(FAIL_WRITE_WRITE).and_then(|_| tmp_file.write_all(contents)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(crate::msg2(COMMON_ERR_WRITE_TEMP, path.display(), err));
        }

        if let Some(permissions) = permissions
            && let Err(err) =
                maybe_fail(FAIL_WRITE_PERMS).and_then(|_| fs::set_permissions(&tmp_path, permissions))
        {
            let _ = fs::remove_file(&tmp_path);
            return Err(crate::msg2(
                COMMON_ERR_SET_TEMP_PERMISSIONS,
                path.display(),
                err,
            ));
        }

        if let Err(err) = maybe_fail(FAIL_WRITE_SYNC).and_then(|_| tmp_file.sync_all()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(crate::msg2(COMMON_ERR_WRITE_TEMP, path.display(), err));
        }

        let rename_result = maybe_fail(FAIL_WRITE_RENAME).and_then(|_| fs::rename(&tmp_path, path));
        match rename_result {
            Ok(()) => return Ok(()),
            Err(err) => {
                #[cfg(windows)]
                {
                    if path.exists() {
                        let _ = fs::remove_file(path);
                    }
                    if fs::rename(&tmp_path, path).is_ok() {
                        return Ok(());
                    }
                }
                let _ = fs::remove_file(&tmp_path);
                return Err(crate::msg2(COMMON_ERR_REPLACE_FILE, path.display(), err));
            }
        }
    }
}

pub fn copy_atomic(source: &Path, dest: &Path) -> Result<(), String> {
    let permissions = fs::metadata(source)
        .map_err(|err| crate::msg2(COMMON_ERR_READ_METADATA, source.display(), err))?
        .permissions();
    let contents =
        fs::read(source).map_err(|err| crate::msg2(COMMON_ERR_READ_FILE, source.display(), err))?;
    write_atomic_with_permissions(dest, &contents, Some(permissions))
}

/// Reads a file that may legitimately be missing. Missing and unreadable
/// files both come back as `None`; callers substitute their own default.
pub(crate) fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %err, "could not read file");
            }
            None
        }
    }
}

fn ensure_file_or_absent(path: &Path) -> Result<(), String> {
    if path.exists() && !path.is_file() {
        return Err(crate::msg1(COMMON_ERR_EXISTS_NOT_FILE, path.display()));
    }
    Ok(())
}

#[cfg(unix)]
fn set_config_permissions(path: &Path, perms: fs::Permissions) -> std::io::Result<()> {
    maybe_fail(FAIL_SET_PERMISSIONS)?;
    fs::set_permissions(path, perms)
}

#[derive(Debug)]
pub struct StoreLock {
    _lock: LockFile,
}

/// Takes the advisory lock guarding store and rc-file rewrites. Released on drop.
pub fn lock_config(lock_path: &Path) -> Result<StoreLock, String> {
    let start = Instant::now();
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| crate::msg2(COMMON_ERR_CREATE_DIR, parent.display(), err))?;
    }
    let mut lock =
        LockFile::open(lock_path).map_err(|err| crate::msg1(COMMON_ERR_LOCK_OPEN, err))?;
    loop {
        match try_lock(&mut lock) {
            Ok(true) => break,
            Ok(false) => {
                if start.elapsed() > lock_timeout() {
                    return Err(crate::msg1(COMMON_ERR_LOCK_ACQUIRE, command_name()));
                }
                thread::sleep(LOCK_RETRY_DELAY);
            }
            Err(err) => {
                return Err(crate::msg1(COMMON_ERR_LOCK_HELD, err));
            }
        }
    }
    Ok(StoreLock { _lock: lock })
}

#[cfg(not(test))]
fn lock_timeout() -> Duration {
    LOCK_TIMEOUT
}

#[cfg(not(test))]
fn try_lock(lock: &mut LockFile) -> Result<bool, fslock::Error> {
    lock.try_lock()
}

#[cfg(test)]
fn lock_timeout() -> Duration {
    Duration::from_millis(50)
}

#[cfg(test)]
fn try_lock(lock: &mut LockFile) -> Result<bool, fslock::Error> {
    match FAILPOINT.with(|failpoint| failpoint.get()) {
        FAIL_LOCK_ERR => Err(std::io::Error::other("fail")),
        FAIL_LOCK_BUSY => Ok(false),
        _ => lock.try_lock(),
    }
}
