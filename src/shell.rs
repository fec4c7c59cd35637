use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{SHELL_ERR_QUOTE, SHELL_ERR_READ_RC, lock_config, read_optional, write_atomic};

/// The rc file permanent exports go to: `~/.zshrc` for zsh users, else
/// `~/.bash_profile`.
pub fn determine_shell_config(home: &Path) -> PathBuf {
    let shell = env::var("SHELL").ok();
    let zsh_on_path = which::which("zsh").is_ok();
    determine_shell_config_with(home, shell.as_deref(), zsh_on_path)
}

fn determine_shell_config_with(home: &Path, shell: Option<&str>, zsh_on_path: bool) -> PathBuf {
    let uses_zsh = shell.is_some_and(|shell| shell.contains("zsh")) || zsh_on_path;
    if uses_zsh {
        home.join(".zshrc")
    } else {
        home.join(".bash_profile")
    }
}

/// `export` lines for `eval` in the current shell.
pub fn build_export_lines(vars: &[(&str, &str)]) -> Result<String, String> {
    let mut lines = Vec::with_capacity(vars.len());
    for (key, value) in vars {
        let quoted =
            shlex::try_quote(value).map_err(|err| crate::msg2(SHELL_ERR_QUOTE, key, err))?;
        lines.push(format!("export {key}={quoted}"));
    }
    Ok(lines.join("\n"))
}

pub fn build_unset_lines(keys: &[&str]) -> String {
    keys.iter()
        .map(|key| format!("unset {key}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces any existing assignments of `vars` in the rc file with fresh
/// `export` lines at the end.
pub fn write_permanent(rc_path: &Path, lock_path: &Path, vars: &[(&str, &str)]) -> Result<(), String> {
    let _lock = lock_config(lock_path)?;
    let rc_path = &resolve_rc(rc_path);
    let keys: Vec<&str> = vars.iter().map(|(key, _)| *key).collect();
    let mut lines = kept_lines(rc_path, &keys)?;
    if lines.last().is_some_and(|line| !line.trim().is_empty()) {
        lines.push(String::new());
    }
    for (key, value) in vars {
        lines.push(format!("export {key}=\"{}\"", escape_double_quoted(value)));
    }
    let contents = format!("{}\n", lines.join("\n"));
    write_atomic(rc_path, contents.as_bytes())?;
    tracing::debug!(path = %rc_path.display(), keys = ?keys, "wrote shell exports");
    Ok(())
}

/// Drops every assignment of `keys` from the rc file.
pub fn remove_permanent(rc_path: &Path, lock_path: &Path, keys: &[&str]) -> Result<(), String> {
    let _lock = lock_config(lock_path)?;
    let rc_path = &resolve_rc(rc_path);
    let lines = kept_lines(rc_path, keys)?;
    let mut contents = lines.join("\n");
    if !lines.is_empty() {
        contents.push('\n');
    }
    write_atomic(rc_path, contents.as_bytes())?;
    tracing::debug!(path = %rc_path.display(), keys = ?keys, "removed shell exports");
    Ok(())
}

/// Symlinked rc files (dotfile managers) are edited at their target so the
/// atomic rename does not replace the link.
fn resolve_rc(rc_path: &Path) -> PathBuf {
    let is_link = fs::symlink_metadata(rc_path).is_ok_and(|meta| meta.file_type().is_symlink());
    if !is_link {
        return rc_path.to_path_buf();
    }
    match fs::canonicalize(rc_path) {
        Ok(target) => target,
        Err(err) => match fs::read_link(rc_path) {
            Ok(target) => {
                tracing::debug!(path = %rc_path.display(), error = %err, "rc link target missing");
                rc_path
                    .parent()
                    .map(|parent| parent.join(&target))
                    .unwrap_or(target)
            }
            Err(_) => rc_path.to_path_buf(),
        },
    }
}

fn kept_lines(rc_path: &Path, keys: &[&str]) -> Result<Vec<String>, String> {
    let contents = if rc_path.exists() {
        read_optional(rc_path).ok_or_else(|| crate::msg1(SHELL_ERR_READ_RC, rc_path.display()))?
    } else {
        String::new()
    };
    Ok(contents
        .lines()
        .filter(|line| !assigns_any(line, keys))
        .map(str::to_string)
        .collect())
}

fn assigns_any(line: &str, keys: &[&str]) -> bool {
    let stripped = line.trim();
    let assignment = stripped.strip_prefix("export ").unwrap_or(stripped).trim_start();
    keys.iter().any(|key| {
        assignment
            .strip_prefix(key)
            .is_some_and(|rest| rest.starts_with('='))
    })
}

fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const KEYS: [&str; 2] = ["ANTHROPIC_AUTH_TOKEN", "ANTHROPIC_BASE_URL"];

    #[test]
    fn shell_config_choice() {
        let home = Path::new("/home/me");
        assert_eq!(
            determine_shell_config_with(home, Some("/bin/zsh"), false),
            home.join(".zshrc")
        );
        assert_eq!(
            determine_shell_config_with(home, Some("/bin/bash"), true),
            home.join(".zshrc")
        );
        assert_eq!(
            determine_shell_config_with(home, None, false),
            home.join(".bash_profile")
        );
    }

    #[test]
    fn export_lines_are_quoted() {
        let lines = build_export_lines(&[("A", "plain"), ("B", "has space'quote")]).unwrap();
        let mut split = lines.lines();
        assert_eq!(split.next(), Some("export A=plain"));
        let second = split.next().unwrap();
        assert!(second.starts_with("export B="));
        assert_eq!(
            shlex::split(second.trim_start_matches("export B=")),
            Some(vec!["has space'quote".to_string()])
        );
        assert!(build_export_lines(&[("C", "nul\0byte")]).is_err());
    }

    #[test]
    fn unset_lines() {
        assert_eq!(
            build_unset_lines(&KEYS),
            "unset ANTHROPIC_AUTH_TOKEN\nunset ANTHROPIC_BASE_URL"
        );
    }

    #[test]
    fn write_permanent_replaces_old_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join(".zshrc");
        let lock = dir.path().join("ai-env.lock");
        fs::write(
            &rc,
            "alias ll='ls -l'\nexport ANTHROPIC_AUTH_TOKEN=\"old\"\nANTHROPIC_BASE_URL=old\nexport ANTHROPIC_AUTH_TOKEN_EXTRA=1\n",
        )
        .unwrap();
        write_permanent(
            &rc,
            &lock,
            &[("ANTHROPIC_AUTH_TOKEN", "new\"$x"), ("ANTHROPIC_BASE_URL", "https://u")],
        )
        .unwrap();
        let contents = fs::read_to_string(&rc).unwrap();
        assert_eq!(
            contents,
            "alias ll='ls -l'\nexport ANTHROPIC_AUTH_TOKEN_EXTRA=1\n\nexport ANTHROPIC_AUTH_TOKEN=\"new\\\"\\$x\"\nexport ANTHROPIC_BASE_URL=\"https://u\"\n"
        );
    }

    #[test]
    fn write_permanent_creates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join(".bash_profile");
        let lock = dir.path().join("ai-env.lock");
        write_permanent(&rc, &lock, &[("OPENAI_API_KEY", "k")]).unwrap();
        assert_eq!(fs::read_to_string(&rc).unwrap(), "export OPENAI_API_KEY=\"k\"\n");
    }

    #[test]
    fn remove_permanent_only_removes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join(".zshrc");
        let lock = dir.path().join("ai-env.lock");
        fs::write(&rc, "export ANTHROPIC_BASE_URL=\"u\"\nexport PATH=/bin\n").unwrap();
        remove_permanent(&rc, &lock, &KEYS).unwrap();
        assert_eq!(fs::read_to_string(&rc).unwrap(), "export PATH=/bin\n");

        fs::write(&rc, "ANTHROPIC_AUTH_TOKEN=x\n").unwrap();
        remove_permanent(&rc, &lock, &KEYS).unwrap();
        assert_eq!(fs::read_to_string(&rc).unwrap(), "");
    }

    #[cfg(unix)]
    #[test]
    fn permanent_edits_follow_symlinked_rc() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("dotfiles_zshrc");
        let rc = dir.path().join(".zshrc");
        let lock = dir.path().join("ai-env.lock");
        fs::write(&target, "alias ll='ls -l'\n").unwrap();
        std::os::unix::fs::symlink(&target, &rc).unwrap();

        write_permanent(&rc, &lock, &[("ANTHROPIC_AUTH_TOKEN", "k")]).unwrap();
        assert!(fs::symlink_metadata(&rc).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "alias ll='ls -l'\n\nexport ANTHROPIC_AUTH_TOKEN=\"k\"\n"
        );

        remove_permanent(&rc, &lock, &KEYS).unwrap();
        assert!(fs::symlink_metadata(&rc).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), "alias ll='ls -l'\n\n");
    }
}
