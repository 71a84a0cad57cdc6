use linkage_core::entities::{AuditEntry, EntityLink, LinkSuggestion};
use linkage_core::responses::{BatchOutcome, LinkedIntakePage};
use schemars::{Schema, schema_for};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

const NAMES: &[&str] = &[
    "entity-link",
    "audit-entry",
    "batch-outcome",
    "link-suggestion",
    "linked-intake-page",
];

/// Handle `lkg schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schema_by_name(&args.name)?;
    output(&schema, flags.format)
}

fn schema_by_name(name: &str) -> anyhow::Result<Schema> {
    let schema = match name.replace('_', "-").as_str() {
        "entity-link" => schema_for!(EntityLink),
        "audit-entry" => schema_for!(AuditEntry),
        "batch-outcome" => schema_for!(BatchOutcome),
        "link-suggestion" => schema_for!(LinkSuggestion),
        "linked-intake-page" => schema_for!(LinkedIntakePage),
        _ => anyhow::bail!("unknown schema '{name}', expected one of: {}", NAMES.join(", ")),
    };
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::{NAMES, schema_by_name};

    #[test]
    fn every_listed_name_resolves() {
        for name in NAMES {
            let schema = schema_by_name(name).expect("schema should exist");
            assert!(schema.as_value().is_object(), "{name}");
        }
    }

    #[test]
    fn entity_link_schema_names_version_field() {
        let schema = schema_by_name("entity_link").expect("schema should exist");
        let json = serde_json::to_string(&schema).expect("schema should serialize");
        assert!(json.contains("_version"));
    }

    #[test]
    fn unknown_name_lists_choices() {
        let err = schema_by_name("intake").expect_err("should fail");
        assert!(err.to_string().contains("entity-link"));
    }
}
