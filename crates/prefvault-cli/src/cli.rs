use clap::{Args, Parser, Subcommand, ValueEnum};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "prefvault",
    about = "Encrypted preferences with keys held in the OS keychain",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; defaults to listing entries when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version and exit.
    Version,
    /// Round-trip an encrypted probe entry through the vault and store.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Read an entry.
    Get(GetArgs),
    /// Write an entry.
    Set(SetArgs),
    /// Delete an entry of any kind.
    Remove { name: String },
    /// List stored entry names and kinds.
    List,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GetArgs {
    pub name: String,
    #[arg(long, value_enum, default_value_t = KindArg::Text)]
    pub kind: KindArg,
    /// Read the value as stored, without decrypting.
    #[arg(long)]
    pub no_crypt: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SetArgs {
    pub name: String,
    /// One value, or several for `--kind list`.
    #[arg(required = true, num_args = 1..)]
    pub values: Vec<String>,
    #[arg(long, value_enum, default_value_t = KindArg::Text)]
    pub kind: KindArg,
    /// Store the value verbatim, without encrypting.
    #[arg(long)]
    pub no_crypt: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Text,
    List,
    Bool,
    Int,
    Double,
}
