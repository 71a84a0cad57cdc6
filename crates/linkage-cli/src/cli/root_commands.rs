use clap::{Args, Subcommand};

use crate::cli::subcommands::{LinkCommands, SuggestCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the .linkage directory and a starter config.
    Init(InitArgs),
    /// Entity links of an intake.
    Link {
        #[command(subcommand)]
        action: LinkCommands,
    },
    /// Query the link audit trail.
    Audit(AuditArgs),
    /// AI link suggestions.
    Suggest {
        #[command(subcommand)]
        action: SuggestCommands,
    },
    /// Print the JSON schema of a record type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<String>,
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub intake: Option<String>,
    #[arg(long)]
    pub link: Option<String>,
    /// created, updated, deleted, restored, reordered, promoted, demoted
    #[arg(long)]
    pub action: Option<String>,
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// entity-link, audit-entry, batch-outcome, link-suggestion, linked-intake-page
    pub name: String,
}
