use clap::{FromArgMatches, error::ErrorKind};

use crate::cli::{Cli, Commands, UrlsCommand, command_with_examples};

pub fn run_cli() {
    let args: Vec<std::ffi::OsString> = std::env::args_os().collect();
    if let Err(message) = run_cli_with_args(args) {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run_cli_with_args(args: Vec<std::ffi::OsString>) -> Result<(), String> {
    if args.len() == 1 {
        let name = package_command_name();
        println!("{name} {}", env!("CARGO_PKG_VERSION"));
        println!();
        let mut cmd = command_with_examples();
        let _ = cmd.print_help();
        println!();
        return Ok(());
    }
    let cmd = command_with_examples();
    let matches = match cmd.clone().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) => {
            if err.kind() == ErrorKind::DisplayHelp {
                let name = package_command_name();
                println!("{name} {}", env!("CARGO_PKG_VERSION"));
                println!();
                let _ = err.print();
                println!();
                return Ok(());
            }
            if err.kind() == ErrorKind::DisplayVersion {
                let _ = err.print();
                return Ok(());
            }
            return Err(err.to_string());
        }
    };
    let cli = Cli::from_arg_matches(&matches).map_err(|err| err.to_string())?;
    let style = Style::detect(cli.plain);
    telemetry::init_logging(style.color_err);
    if let Err(message) = run(cli, style) {
        if message == CANCELLED_MESSAGE {
            print_output_block(&format_cancel(style.color_out), style);
            return Ok(());
        }
        return Err(format_error(&message, style.color_err));
    }
    Ok(())
}

fn run(cli: Cli, style: Style) -> Result<(), String> {
    let paths = resolve_paths()?;
    ensure_paths(&paths)?;
    tracing::debug!(config = %paths.config.display(), family = %cli.family, "resolved paths");

    let ctx = CommandCtx {
        paths: &paths,
        family: cli.family,
        style,
    };
    match cli.command {
        Commands::List {
            search,
            by_price,
            no_health,
        } => list_profiles(&ctx, search.as_deref(), by_price, no_health),
        Commands::Status { no_health } => status_profile(&ctx, no_health),
        Commands::Use {
            index,
            name,
            permanent,
        } => use_profile(&ctx, index, name, permanent),
        Commands::Clear { permanent } => clear_profile(&ctx, permanent),
        Commands::Add {
            name,
            key,
            url,
            extra,
        } => add_profile(&ctx, extra.into_fields(Some(name), Some(key), Some(url))),
        Commands::Edit {
            index,
            name,
            key,
            url,
            extra,
        } => edit_profile(&ctx, index, extra.into_fields(name, key, url)),
        Commands::Remove { index, yes } => remove_profile(&ctx, index, yes),
        Commands::Init => init_config(&ctx),
        Commands::Health => health_report(&ctx),
        Commands::Urls { command } => match command {
            UrlsCommand::List => list_urls(&ctx),
            UrlsCommand::Add { url } => add_url(&ctx, &url),
            UrlsCommand::Remove { url } => remove_url(&ctx, &url),
        },
    }
}

mod cli;
mod common;
mod health;
mod messages;
mod pricing;
mod profiles;
mod ranking;
mod relative_time;
mod resolver;
mod shell;
mod store;
mod telemetry;
#[cfg(test)]
mod test_utils;
mod ui;

pub(crate) use common::*;
pub(crate) use health::*;
pub(crate) use messages::*;
pub(crate) use profiles::*;
pub(crate) use resolver::*;
pub(crate) use shell::*;
pub(crate) use store::*;
pub(crate) use ui::*;

pub use health::{
    HealthRecord, HealthSnapshot, HealthStatus, ServiceHealth, lookup, parse_health_document,
};
pub use pricing::{Currency, PriceQuote, USD_TO_CNY_RATE, format_total, parse_price, profile_total};
pub use ranking::{Priced, rank};
pub use relative_time::format_time_ago;
pub use resolver::{
    ActivationState, ActiveProfile, AnnotatedProfile, annotate, describe_active,
    parse_config_value, parse_folder_marker, resolve_active,
};
pub use store::{Pricing, Profile, ProfileFamily};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ENV_MUTEX, set_env_guard};
    use std::ffi::OsString;

    #[test]
    fn run_cli_with_args_help() {
        let args = vec![OsString::from("ai-env")];
        run_cli_with_args(args).unwrap();
    }

    #[test]
    fn run_cli_with_args_display_help() {
        let args = vec![OsString::from("ai-env"), OsString::from("--help")];
        run_cli_with_args(args).unwrap();
    }

    #[test]
    fn run_cli_with_args_errors() {
        let args = vec![OsString::from("ai-env"), OsString::from("nope")];
        let err = run_cli_with_args(args).unwrap_err();
        assert!(err.contains("error"));
    }

    #[test]
    fn run_add_then_list() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|err| err.into_inner());
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join(".ai-env");
        let codex = dir.path().join(".codex");
        let _home = set_env_guard("AI_ENV_HOME", Some(&config.to_string_lossy()));
        let _codex = set_env_guard("CODEX_HOME", Some(&codex.to_string_lossy()));
        let add = Cli {
            plain: true,
            family: ProfileFamily::Claude,
            command: Commands::Add {
                name: "relay".to_string(),
                key: "sk-1".to_string(),
                url: "https://relay.example".to_string(),
                extra: cli::ExtraFields::default(),
            },
        };
        run(add, Style::plain()).unwrap();
        assert!(config.join("claude_configs.json").is_file());

        let list = Cli {
            plain: true,
            family: ProfileFamily::Claude,
            command: Commands::List {
                search: None,
                by_price: true,
                no_health: true,
            },
        };
        run(list, Style::plain()).unwrap();
    }
}
