// Common test utilities and helpers

use std::sync::Arc;

use crate::AppState;
use crate::config::LanguageConfig;
use crate::filter::{GenerateArgs, LANGUAGE_PARAM, Params};
use crate::utils::StaticLocaleProvider;

/// Provider for the shop scenario: en, de, fr with en as default
pub fn create_test_provider() -> Arc<StaticLocaleProvider> {
    Arc::new(StaticLocaleProvider::new(["en", "de", "fr"], "en"))
}

/// Language settings with default-language segments switched off
pub fn suppress_default_config() -> LanguageConfig {
    LanguageConfig {
        available: Some(vec!["en".to_string(), "de".to_string(), "fr".to_string()]),
        default_locale: Some("en".to_string()),
        include_default_language: false,
        ..Default::default()
    }
}

/// App state with the language filter installed in front of the shop routes
pub fn create_test_state(config: LanguageConfig) -> (AppState, Arc<StaticLocaleProvider>) {
    let provider = create_test_provider();
    let state = AppState::new(&config, provider.clone()).expect("Failed to create app state");
    (state, provider)
}

/// Generation arguments carrying only a `language` option
pub fn with_language(language: &str) -> GenerateArgs {
    GenerateArgs::new().with_options(Params::new().with(LANGUAGE_PARAM, language))
}
