use clap::Subcommand;

/// Link commands. Entities are written `type:id`, e.g. `dossier:d-42`.
#[derive(Clone, Debug, Subcommand)]
pub enum LinkCommands {
    /// Link one or more entities to an intake.
    Add {
        intake: String,
        #[arg(required = true)]
        entities: Vec<String>,
        /// Entity that should become the primary link
        #[arg(long)]
        primary: Option<String>,
        /// Replace the current primary instead of deferring
        #[arg(long)]
        force: bool,
        /// Preferred link type for non-primary links
        #[arg(long)]
        link_type: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List the links of an intake in display order.
    List {
        intake: String,
        /// Include soft-deleted links
        #[arg(long)]
        deleted: bool,
    },
    /// Replace or clear the notes of a link.
    Notes {
        intake: String,
        link: String,
        #[arg(long, conflicts_with = "clear", required_unless_present = "clear")]
        notes: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Soft-delete a link.
    Delete { intake: String, link: String },
    /// Restore a soft-deleted link.
    Restore { intake: String, link: String },
    /// Move a link onto the position of another.
    Move {
        intake: String,
        link: String,
        /// Link whose position is taken
        target: String,
    },
    /// Intakes linked to an entity.
    Intakes {
        entity: String,
        #[arg(long)]
        link_type: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
}
