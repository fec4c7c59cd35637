use clap::{Args, Command, CommandFactory, Parser, Subcommand};

use crate::{ProfileFamily, ProfileFields, command_name};

#[derive(Parser)]
#[command(author, version, about, color = clap::ColorChoice::Never)]
pub struct Cli {
    /// Disable styling and separators
    #[arg(long, global = true)]
    pub plain: bool,
    /// Which tool's profiles to work with
    #[arg(long = "type", value_enum, global = true, default_value_t = ProfileFamily::Claude)]
    pub family: ProfileFamily,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored profiles with their health
    List {
        /// Only show profiles whose name, group or channel contains this text
        #[arg(long, value_name = "text")]
        search: Option<String>,
        /// Sort by total price, cheapest first
        #[arg(long)]
        by_price: bool,
        /// Skip polling the health service
        #[arg(long)]
        no_health: bool,
    },
    /// Show which profile the current environment points at
    Status {
        /// Skip polling the health service
        #[arg(long)]
        no_health: bool,
    },
    /// Activate a profile (prints `export` lines unless --permanent)
    Use {
        /// Use the profile at this index
        #[arg(long, conflicts_with = "name")]
        index: Option<usize>,
        /// Use the only profile whose name contains this text
        #[arg(long, value_name = "text")]
        name: Option<String>,
        /// Write the exports to your shell config instead
        #[arg(long)]
        permanent: bool,
    },
    /// Deactivate the current profile (prints `unset` lines unless --permanent)
    Clear {
        /// Remove the exports from your shell config instead
        #[arg(long)]
        permanent: bool,
    },
    /// Add a profile
    Add {
        #[arg(long)]
        name: String,
        /// Credential (token or API key)
        #[arg(long)]
        key: String,
        /// Endpoint base URL
        #[arg(long)]
        url: String,
        #[command(flatten)]
        extra: ExtraFields,
    },
    /// Change fields of a stored profile
    Edit {
        #[arg(long)]
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        extra: ExtraFields,
    },
    /// Remove a stored profile
    Remove {
        /// Remove the profile at this index
        #[arg(long)]
        index: Option<usize>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Create empty config files
    Init,
    /// Show every service the health endpoints report
    Health,
    /// Manage health status URLs
    Urls {
        #[command(subcommand)]
        command: UrlsCommand,
    },
}

/// Optional profile fields shared by `add` and `edit`. An empty value clears
/// the field.
#[derive(Args, Clone, Debug, Default)]
pub struct ExtraFields {
    /// Health service id for this relay
    #[arg(long)]
    pub channel_id: Option<String>,
    #[arg(long)]
    pub group: Option<String>,
    /// Codex provider folder under the config dir (codex only)
    #[arg(long)]
    pub folder: Option<String>,
    /// Input price, e.g. "¥2" or "$0.5"
    #[arg(long)]
    pub input: Option<String>,
    /// Output price
    #[arg(long)]
    pub output: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

impl ExtraFields {
    pub fn into_fields(
        self,
        name: Option<String>,
        credential: Option<String>,
        endpoint: Option<String>,
    ) -> ProfileFields {
        ProfileFields {
            name,
            credential,
            endpoint,
            channel_id: self.channel_id,
            group: self.group,
            codex_folder: self.folder,
            input: self.input,
            output: self.output,
            description: self.description,
        }
    }
}

#[derive(Subcommand)]
pub enum UrlsCommand {
    /// List configured health URLs
    List,
    /// Add a health URL
    Add { url: String },
    /// Remove a health URL
    Remove { url: String },
}

pub fn command_with_examples() -> Command {
    let name = command_name();
    let mut cmd = Cli::command();
    cmd.set_bin_name(name);
    cmd = cmd.after_help(examples_root(name));
    cmd
}

fn examples_root(name: &str) -> String {
    format!(
        "Examples:\n  {name} list --by-price\n  eval \"$({name} use --name relay)\"\n  {name} --type codex use --index 1 --permanent\n  {name} add --name relay --key sk-xxx --url https://relay.example\n  {name} urls add https://status.example/api/status"
    )
}
