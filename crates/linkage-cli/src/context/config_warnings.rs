use linkage_config::LinkageConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &LinkageConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &LinkageConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.auth.is_configured() && has_single_underscore(&env_keys, "LINKAGE_AUTH") {
        warnings.push(
            "Auth config appears default while LINKAGE_AUTH* env vars exist. Use double underscores (example: LINKAGE_AUTH__TOKEN)."
                .to_string(),
        );
    }

    if !config.suggestions.is_configured() && has_single_underscore(&env_keys, "LINKAGE_SUGGESTIONS") {
        warnings.push(
            "Suggestions config appears default while LINKAGE_SUGGESTIONS* env vars exist. Use double underscores (example: LINKAGE_SUGGESTIONS__BASE_URL)."
                .to_string(),
        );
    }

    warnings
}

fn has_single_underscore(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| {
        key.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('_') && !rest.starts_with("__"))
    })
}
