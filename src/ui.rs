use colored::Colorize;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use supports_color::Stream;

use crate::{
    CANCELLED_MESSAGE, UI_ERROR_PREFIX, UI_HINT_ADD_PROFILE, UI_HINT_LIST_PROFILES,
    UI_INFO_PREFIX, UI_NO_PROFILES, UI_WARNING_PREFIX,
};
use crate::{HealthStatus, ProfileFamily, command_name};

const HISTORY_WIDTH: usize = 20;

/// Output styling for one invocation. Built once from `--plain` and the
/// terminal, then handed to whatever renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Style {
    pub plain: bool,
    pub color_out: bool,
    pub color_err: bool,
}

impl Style {
    pub fn detect(plain: bool) -> Self {
        if plain {
            return Style::plain();
        }
        Style {
            plain: false,
            color_out: supports_color(Stream::Stdout),
            color_err: supports_color(Stream::Stderr),
        }
    }

    pub fn plain() -> Self {
        Style {
            plain: true,
            color_out: false,
            color_err: false,
        }
    }
}

fn supports_color(stream: Stream) -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    supports_color::on(stream).is_some()
}

pub fn style_text<F>(text: &str, use_color: bool, style: F) -> String
where
    F: FnOnce(colored::ColoredString) -> colored::ColoredString,
{
    if use_color {
        style(text.normal()).to_string()
    } else {
        text.to_string()
    }
}

pub fn format_cmd(command: &str, use_color: bool) -> String {
    let text = format!("`{command}`");
    style_text(&text, use_color, |text| text.yellow().bold())
}

pub fn format_action(message: &str, use_color: bool) -> String {
    let text = format!("✅ {message}");
    style_text(&text, use_color, |text| text.green().bold())
}

pub fn format_warning(message: &str, use_color: bool) -> String {
    let prefix = UI_WARNING_PREFIX;
    let mut lines = message.lines();
    let first = lines.next().unwrap_or_default();
    let mut text = format!("{prefix}{first}");
    let indent = " ".repeat(prefix.len());
    for line in lines {
        text.push('\n');
        text.push_str(&indent);
        text.push_str(line);
    }
    style_text(&text, use_color, |text| text.yellow().dimmed().italic())
}

pub fn format_cancel(use_color: bool) -> String {
    style_text(CANCELLED_MESSAGE, use_color, |text| text.dimmed().italic())
}

pub fn format_hint(message: &str, style: Style) -> String {
    if style.plain {
        crate::msg1(UI_INFO_PREFIX, message)
    } else {
        let message = format!("\n\n{message}");
        style_text(&message, style.color_out, |text| text.italic())
    }
}

pub fn format_no_profiles(family: ProfileFamily, style: Style) -> String {
    let add = format_command("add", style.color_out);
    let hint = format_hint(&UI_HINT_ADD_PROFILE.replace("{add}", &add), style);
    crate::msg2(UI_NO_PROFILES, family, hint)
}

pub fn format_list_hint(style: Style) -> String {
    let list = format_command("list", style.color_err);
    format_hint(&UI_HINT_LIST_PROFILES.replace("{list}", &list), style)
}

pub fn format_error(message: &str, use_color: bool) -> String {
    let message = message
        .strip_prefix(&format!("{UI_ERROR_PREFIX} "))
        .unwrap_or(message);
    let prefix = if use_color {
        UI_ERROR_PREFIX.red().bold().to_string()
    } else {
        UI_ERROR_PREFIX.to_string()
    };
    let mut lines = message.lines();
    let first = lines.next().unwrap_or_default();
    let mut text = format!("{prefix} {first}");
    for line in lines {
        text.push('\n');
        text.push_str(&style_text(line, use_color, |text| text.dimmed().italic()));
    }
    text
}

pub fn format_entry_header(display: &str, use_color: bool) -> String {
    if use_color {
        display.bold().to_string()
    } else {
        display.to_string()
    }
}

/// `[O]`, `[X]`, `[!]` or `[?]`, colored by severity.
pub fn format_status_badge(status: HealthStatus, use_color: bool) -> String {
    let text = format!("[{}]", status.icon());
    paint_status(&text, status, use_color)
}

pub fn format_current_marker(use_color: bool) -> String {
    style_text("[current]", use_color, |text| text.green().bold())
}

pub fn format_group(group: Option<&str>, use_color: bool) -> String {
    match group {
        Some(group) if use_color => format!(" {group} ").black().on_white().dimmed().to_string(),
        Some(group) => format!(" ({group})"),
        None => String::new(),
    }
}

/// The most recent statuses, oldest on the left, one `|` per check.
pub fn format_history(timeline: &[HealthStatus], use_color: bool) -> String {
    let start = timeline.len().saturating_sub(HISTORY_WIDTH);
    timeline[start..]
        .iter()
        .map(|status| {
            if use_color {
                paint_status("|", *status, true)
            } else {
                status.icon().to_string()
            }
        })
        .collect()
}

fn paint_status(text: &str, status: HealthStatus, use_color: bool) -> String {
    style_text(text, use_color, |text| match status {
        HealthStatus::Ok => text.green().bold(),
        HealthStatus::Error => text.red().bold(),
        HealthStatus::Timeout => text.yellow().bold(),
        HealthStatus::Unknown => text.dimmed(),
    })
}

pub fn format_detail(text: &str, use_color: bool) -> String {
    style_text(text, use_color, |text| text.dimmed())
}

pub fn inquire_select_render_config(use_color: bool) -> RenderConfig<'static> {
    let mut config = if use_color {
        let mut config = RenderConfig::default_colored();
        config.help_message = StyleSheet::new().with_fg(Color::DarkGrey);
        config
    } else {
        RenderConfig::empty()
    };
    config.prompt_prefix = Styled::new("");
    config.answered_prompt_prefix = Styled::new("");
    config
}

pub fn is_inquire_cancel(err: &inquire::error::InquireError) -> bool {
    matches!(
        err,
        inquire::error::InquireError::OperationCanceled
            | inquire::error::InquireError::OperationInterrupted
    )
}

const OUTPUT_INDENT: &str = " ";

pub fn print_output_block(message: &str, style: Style) {
    let message = if style.plain {
        message.to_string()
    } else {
        indent_output(message)
    };
    println!("\n{message}\n");
}

fn indent_output(message: &str) -> String {
    message
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{OUTPUT_INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_command(cmd: &str, use_color: bool) -> String {
    let name = command_name();
    let full = if cmd.is_empty() {
        name.to_string()
    } else {
        format!("{name} {cmd}")
    };
    format_cmd(&full, use_color)
}
