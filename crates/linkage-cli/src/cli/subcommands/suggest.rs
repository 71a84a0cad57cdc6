use clap::Subcommand;

/// AI suggestion commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SuggestCommands {
    /// Ask the suggestion service for link candidates.
    Generate {
        intake: String,
        /// Entity types to consider (comma separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
        /// When the service is unavailable, wait for retry-after and retry
        #[arg(long)]
        wait: bool,
    },
    /// Link a suggested entity and report the acceptance.
    Accept {
        intake: String,
        #[arg(long)]
        suggestion: String,
        /// Suggested entity as type:id
        #[arg(long)]
        entity: String,
        #[arg(long, default_value = "related")]
        link_type: String,
        #[arg(long)]
        confidence: Option<f64>,
    },
}
