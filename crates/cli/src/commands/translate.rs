use ethpulse_core::{
    config::AppConfig,
    nl2sql::{SessionCredential, TranslationRequest, Translator},
};

use super::utils::{print_info, CliError, CliResult};

/// Translates `text` with the configured translator and prints the SQL.
///
/// `api_key` plays the role of a session credential for `provider`.
pub async fn translate(
    config: &AppConfig,
    text: &str,
    provider: Option<&str>,
    model: Option<&str>,
    api_key: Option<&str>,
) -> CliResult<()> {
    let translator = Translator::new(config.nl2sql.clone(), config.query.max_limit)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let credential = provider
        .zip(api_key)
        .map(|(provider, api_key)| SessionCredential { provider, api_key });
    let translation = translator
        .translate(TranslationRequest { text, provider, model, credential })
        .await;

    print_info(&format!("method: {}", translation.method));
    println!("{}", translation.sql_query);
    Ok(())
}
