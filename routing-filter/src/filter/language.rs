//! Language segment filter
//!
//! Recognition strips a leading `/<language>` segment from the path and
//! exposes it as `params["language"]`:
//!
//! ```text
//! incoming path: /de/products
//! filtered path: /products
//! params:        language = "de"
//! ```
//!
//! Generation consumes the `language` option (falling back to the current
//! locale when it is absent) and prepends it to the generated URL, unless it
//! is the default language and default-language segments are switched off.

use regex::Regex;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::params::{GenerateArgs, LANGUAGE_PARAM, ParamValue, Params, RequestEnv};
use super::segment::{extract_segment, prepend_segment};
use super::{GenerateNext, RecognizeNext, RouteFilter};
use crate::config::{LanguageConfig, MatchingMode};
use crate::utils::i18n::{LocaleProvider, is_well_formed_language_code, normalize_language_code};
use crate::utils::RoutingError;

/// Compiled set of language codes the filter accepts
#[derive(Debug, Clone)]
pub struct LanguageSet {
    codes: Vec<String>,
    matching: MatchingMode,
    patterns: Option<Patterns>,
}

#[derive(Debug, Clone)]
struct Patterns {
    /// `^/(alternatives)(?:/|$)`, applied to request paths
    segment: Regex,
    /// `^(?:alternatives)$`, applied to candidate codes on generation
    code: Regex,
}

impl LanguageSet {
    /// Normalize `codes` and compile the path and code matchers.
    ///
    /// Fails on an empty list or on a code that is not a language tag.
    pub fn compile<I, S>(codes: I, matching: MatchingMode) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for code in codes {
            let code = normalize_language_code(code.as_ref());
            if !is_well_formed_language_code(&code) {
                return Err(RoutingError::InvalidLanguage(code));
            }
            if !normalized.contains(&code) {
                normalized.push(code);
            }
        }

        if normalized.is_empty() {
            return Err(RoutingError::EmptyLanguageSet);
        }

        let alternatives = normalized
            .iter()
            .map(|code| code_pattern(code, matching))
            .collect::<Vec<_>>()
            .join("|");

        let patterns = Patterns {
            segment: Regex::new(&format!(r"^/({})(?:/|$)", alternatives))?,
            code: Regex::new(&format!(r"^(?:{})$", alternatives))?,
        };

        Ok(Self { codes: normalized, matching, patterns: Some(patterns) })
    }

    /// A set that matches nothing
    pub fn empty(matching: MatchingMode) -> Self {
        Self { codes: Vec::new(), matching, patterns: None }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn matching(&self) -> MatchingMode {
        self.matching
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether a normalized code is accepted under the set's matching mode
    pub fn contains(&self, code: &str) -> bool {
        self.patterns.as_ref().is_some_and(|p| p.code.is_match(code))
    }

    /// Remove a leading language segment from `path`, returning the code
    pub fn extract(&self, path: &mut String) -> Option<String> {
        let patterns = self.patterns.as_ref()?;
        extract_segment(&patterns.segment, path)
    }
}

// Relaxed matching lets a region-qualified code stand for any region of the
// same language, and lets a bare code carry a region suffix.
fn code_pattern(code: &str, matching: MatchingMode) -> String {
    match matching {
        MatchingMode::Strict => regex::escape(code),
        MatchingMode::Relaxed => match code.rsplit_once('-') {
            Some((base, region))
                if region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase()) =>
            {
                format!("{}-[A-Z]{{2}}", regex::escape(base))
            },
            _ => format!("{}(?:-[A-Z]{{2}})?", regex::escape(code)),
        },
    }
}

#[derive(Debug, Default)]
struct LanguageState {
    /// Explicit override; `None` pulls the list from the locale provider
    configured: Option<Vec<String>>,
    compiled: Option<Arc<LanguageSet>>,
    generation: u64,
}

/// Route filter adding and removing the `/<language>` path segment
pub struct LanguageFilter {
    config: LanguageConfig,
    provider: Arc<dyn LocaleProvider>,
    state: RwLock<LanguageState>,
}

impl LanguageFilter {
    pub const NAME: &'static str = "language";

    pub fn new(config: LanguageConfig, provider: Arc<dyn LocaleProvider>) -> Self {
        let state = LanguageState { configured: config.available.clone(), ..Default::default() };
        Self { config, provider, state: RwLock::new(state) }
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    /// Current language set, compiled on first use after any invalidation
    pub fn languages(&self) -> Arc<LanguageSet> {
        let (configured, generation) = match self.state.read() {
            Ok(state) => {
                if let Some(compiled) = &state.compiled {
                    return Arc::clone(compiled);
                }
                (state.configured.clone(), state.generation)
            },
            Err(_) => (self.config.available.clone(), 0),
        };

        let set = Arc::new(self.compile_languages(configured));

        if let Ok(mut state) = self.state.write()
            && state.generation == generation
            && state.compiled.is_none()
        {
            state.compiled = Some(Arc::clone(&set));
        }

        set
    }

    /// Replace the accepted languages.
    ///
    /// The new set is compiled before it is swapped in, so readers see either
    /// the previous set or the new one.
    pub fn set_languages<I, S>(&self, codes: I) -> Result<(), RoutingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = LanguageSet::compile(codes, self.config.matching)?;
        tracing::info!("Language set replaced: {:?}", set.codes());

        if let Ok(mut state) = self.state.write() {
            state.configured = Some(set.codes().to_vec());
            state.compiled = Some(Arc::new(set));
            state.generation += 1;
        }
        Ok(())
    }

    /// Drop any override and go back to the configured or provider languages
    pub fn reset_languages(&self) {
        if let Ok(mut state) = self.state.write() {
            state.configured = self.config.available.clone();
            state.compiled = None;
            state.generation += 1;
        }
    }

    /// Forget the compiled set so the next use recompiles it
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.state.write() {
            state.compiled = None;
            state.generation += 1;
        }
    }

    pub fn is_valid_language(&self, code: &str) -> bool {
        self.languages().contains(code)
    }

    /// Normalized default language code
    pub fn default_language(&self) -> String {
        let locale = match &self.config.default_locale {
            Some(locale) => locale.clone(),
            None => self.provider.default_locale(),
        };
        normalize_language_code(&locale)
    }

    pub fn is_default_language(&self, code: &str) -> bool {
        code == self.default_language()
    }

    fn prepend_language(&self, code: &str) -> bool {
        self.config.include_default_language || !self.is_default_language(code)
    }

    fn compile_languages(&self, configured: Option<Vec<String>>) -> LanguageSet {
        let matching = self.config.matching;
        let codes = configured.unwrap_or_else(|| self.provider.available_locales());

        let codes: Vec<String> = codes
            .iter()
            .map(|code| normalize_language_code(code))
            .filter(|code| {
                let ok = is_well_formed_language_code(code);
                if !ok {
                    tracing::warn!("Ignoring malformed language code '{}'", code);
                }
                ok
            })
            .collect();

        if codes.is_empty() {
            tracing::warn!("No languages available, language segments are disabled");
            return LanguageSet::empty(matching);
        }

        match LanguageSet::compile(&codes, matching) {
            Ok(set) => {
                tracing::debug!("Compiled language set {:?} ({:?})", set.codes(), matching);
                set
            },
            Err(err) => {
                tracing::warn!("Failed to compile language set {:?}: {}", codes, err);
                LanguageSet::empty(matching)
            },
        }
    }

    /// Language requested by a generation call, before validation.
    /// Only a missing key falls back to the current locale; `false` or an
    /// empty string explicitly ask for no language.
    fn requested_language(&self, options: &Params) -> Option<String> {
        match options.get(LANGUAGE_PARAM) {
            None => Some(self.provider.current_locale()),
            Some(ParamValue::Str(code)) if !code.trim().is_empty() => Some(code.clone()),
            Some(_) => None,
        }
    }
}

impl RouteFilter for LanguageFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn around_recognize(&self, path: &mut String, env: &RequestEnv, next: RecognizeNext<'_>) -> Params {
        let language = self.languages().extract(path);
        if let Some(language) = &language {
            tracing::debug!("Recognized language '{}', remaining path '{}'", language, path);
        }

        let mut params = next(path, env);
        if let Some(language) = language {
            params.insert(LANGUAGE_PARAM, language);
        }
        params
    }

    fn around_generate(&self, args: &mut GenerateArgs, next: GenerateNext<'_>) -> String {
        let mut options = args.extract_options();

        let language = self
            .requested_language(&options)
            .map(|code| normalize_language_code(&code))
            .filter(|code| {
                let valid = self.is_valid_language(code);
                if !valid {
                    tracing::debug!("Dropping unavailable language '{}'", code);
                }
                valid
            });

        if self.config.strip_language_param {
            options.remove(LANGUAGE_PARAM);
        }
        args.push_options(options);

        let mut url = next(args);

        if let Some(language) = language
            && self.prepend_language(&language)
        {
            prepend_segment(&mut url, &language);
        }
        url
    }
}

impl fmt::Debug for LanguageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageFilter").field("config", &self.config).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::i18n::StaticLocaleProvider;

    fn filter_with(config: LanguageConfig) -> LanguageFilter {
        let provider = Arc::new(StaticLocaleProvider::new(["en", "de", "fr"], "en"));
        LanguageFilter::new(config, provider)
    }

    fn recognize(filter: &LanguageFilter, path: &str) -> (String, Params) {
        let mut path = path.to_string();
        let params = filter.around_recognize(
            &mut path,
            &RequestEnv::default(),
            Box::new(|path: &mut String, _: &RequestEnv| Params::new().with("seen", path.clone())),
        );
        (path, params)
    }

    fn generate(filter: &LanguageFilter, options: Option<Params>) -> (String, Option<Params>) {
        let mut args = GenerateArgs::new();
        if let Some(options) = options {
            args = args.with_options(options);
        }
        let mut forwarded = None;
        let url = filter.around_generate(
            &mut args,
            Box::new(|args: &mut GenerateArgs| {
                forwarded = args.options().cloned();
                "/products".to_string()
            }),
        );
        (url, forwarded)
    }

    #[test]
    fn test_compile_normalizes_and_dedupes() {
        let set = LanguageSet::compile(["EN", "de_at", "en"], MatchingMode::Strict).unwrap();
        assert_eq!(set.codes(), ["en", "de-AT"]);
        assert!(set.contains("de-AT"));
        assert!(!set.contains("de"));
    }

    #[test]
    fn test_compile_rejects_bad_input() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            LanguageSet::compile(empty, MatchingMode::Strict),
            Err(RoutingError::EmptyLanguageSet)
        ));
        assert!(matches!(
            LanguageSet::compile(["en", "e/n"], MatchingMode::Strict),
            Err(RoutingError::InvalidLanguage(_))
        ));
    }

    #[test]
    fn test_relaxed_matching_accepts_regions() {
        let set = LanguageSet::compile(["en", "pt-BR"], MatchingMode::Relaxed).unwrap();
        assert!(set.contains("en"));
        assert!(set.contains("en-RU"));
        assert!(set.contains("pt-PT"));
        assert!(!set.contains("pt"));
        assert!(!set.contains("en-ru"));

        let mut path = "/en-RU/products".to_string();
        assert_eq!(set.extract(&mut path), Some("en-RU".to_string()));
        assert_eq!(path, "/products");
    }

    #[test]
    fn test_strict_matching_rejects_regions() {
        let set = LanguageSet::compile(["en", "pt-BR"], MatchingMode::Strict).unwrap();
        assert!(!set.contains("en-RU"));
        assert!(!set.contains("pt-PT"));

        let mut path = "/en-RU/products".to_string();
        assert_eq!(set.extract(&mut path), None);
        assert_eq!(path, "/en-RU/products");
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = LanguageSet::empty(MatchingMode::Relaxed);
        let mut path = "/en/products".to_string();
        assert_eq!(set.extract(&mut path), None);
        assert!(!set.contains("en"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_recognize_sets_language() {
        let filter = filter_with(LanguageConfig::default());
        let (path, params) = recognize(&filter, "/de/products");
        assert_eq!(path, "/products");
        assert_eq!(params.get_str("seen"), Some("/products"));
        assert_eq!(params.language(), Some("de"));
    }

    #[test]
    fn test_recognize_passes_unmatched_path_through() {
        let filter = filter_with(LanguageConfig::default());
        let (path, params) = recognize(&filter, "/es/products");
        assert_eq!(path, "/es/products");
        assert_eq!(params.language(), None);
    }

    #[test]
    fn test_generate_strips_language_option() {
        let filter = filter_with(LanguageConfig::default());
        let options = Params::new().with(LANGUAGE_PARAM, "de").with("page", 2_i64);
        let (url, forwarded) = generate(&filter, Some(options));
        assert_eq!(url, "/de/products");

        let forwarded = forwarded.unwrap();
        assert!(!forwarded.contains_key(LANGUAGE_PARAM));
        assert!(forwarded.contains_key("page"));
    }

    #[test]
    fn test_generate_keeps_language_option_when_configured() {
        let config = LanguageConfig { strip_language_param: false, ..Default::default() };
        let filter = filter_with(config);
        let (url, forwarded) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, "fr")));
        assert_eq!(url, "/fr/products");
        assert_eq!(forwarded.unwrap().language(), Some("fr"));
    }

    #[test]
    fn test_generate_normalizes_language_case() {
        let filter = filter_with(LanguageConfig::default());
        let (url, _) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, "DE")));
        assert_eq!(url, "/de/products");
    }

    #[test]
    fn test_explicit_false_is_not_defaulted() {
        let filter = filter_with(LanguageConfig::default());
        let (url, _) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, false)));
        assert_eq!(url, "/products");

        let (url, _) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, "")));
        assert_eq!(url, "/products");

        let (url, _) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, true)));
        assert_eq!(url, "/products");

        let (url, _) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, 1_i64)));
        assert_eq!(url, "/products");
    }

    #[test]
    fn test_explicit_values_ignore_current_locale() {
        let provider = Arc::new(StaticLocaleProvider::new(["en", "de", "fr"], "en"));
        provider.set_current_locale("de");
        let filter = LanguageFilter::new(LanguageConfig::default(), provider);

        for value in [ParamValue::Bool(true), ParamValue::Bool(false), ParamValue::Int(2)] {
            let (url, forwarded) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, value)));
            assert_eq!(url, "/products");
            assert!(forwarded.is_some_and(|options| !options.contains_key(LANGUAGE_PARAM)));
        }
    }

    #[test]
    fn test_missing_language_uses_current_locale() {
        let provider = Arc::new(StaticLocaleProvider::new(["en", "de", "fr"], "en"));
        provider.set_current_locale("fr");
        let filter = LanguageFilter::new(LanguageConfig::default(), provider);

        let (url, _) = generate(&filter, None);
        assert_eq!(url, "/fr/products");
    }

    #[test]
    fn test_set_languages_swaps_pattern() {
        let filter = filter_with(LanguageConfig::default());
        let before = filter.languages();
        assert_eq!(before.codes(), ["en", "de", "fr"]);

        filter.set_languages(["it", "nl"]).unwrap();
        assert_eq!(filter.languages().codes(), ["it", "nl"]);
        // Readers holding the old set keep a consistent view
        assert_eq!(before.codes(), ["en", "de", "fr"]);

        let (path, params) = recognize(&filter, "/de/products");
        assert_eq!(path, "/de/products");
        assert_eq!(params.language(), None);

        filter.reset_languages();
        assert_eq!(filter.languages().codes(), ["en", "de", "fr"]);
    }

    #[test]
    fn test_invalidate_picks_up_provider_changes() {
        let provider = Arc::new(StaticLocaleProvider::new(["en", "de"], "en"));
        let filter = LanguageFilter::new(LanguageConfig::default(), provider.clone());
        assert_eq!(filter.languages().codes(), ["en", "de"]);

        provider.set_available_locales(["it"]);
        assert_eq!(filter.languages().codes(), ["en", "de"]);
        assert!(filter.is_valid_language("de"));

        filter.invalidate();
        assert_eq!(filter.languages().codes(), ["it"]);
        assert!(!filter.is_valid_language("de"));

        let (path, params) = recognize(&filter, "/it/products");
        assert_eq!(path, "/products");
        assert_eq!(params.language(), Some("it"));
    }

    #[test]
    fn test_set_languages_rejects_invalid_and_keeps_old_set() {
        let filter = filter_with(LanguageConfig::default());
        assert!(filter.set_languages(["en", "not a code"]).is_err());
        assert_eq!(filter.languages().codes(), ["en", "de", "fr"]);
    }

    #[test]
    fn test_configured_languages_override_provider() {
        let config = LanguageConfig {
            available: Some(vec!["en".to_string(), "nl".to_string()]),
            ..Default::default()
        };
        let filter = filter_with(config);
        assert!(filter.is_valid_language("nl"));
        assert!(!filter.is_valid_language("de"));
    }

    #[test]
    fn test_default_locale_override() {
        let config = LanguageConfig {
            default_locale: Some("DE".to_string()),
            include_default_language: false,
            ..Default::default()
        };
        let filter = filter_with(config);
        assert_eq!(filter.default_language(), "de");

        let (url, _) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, "de")));
        assert_eq!(url, "/products");
        let (url, _) = generate(&filter, Some(Params::new().with(LANGUAGE_PARAM, "en")));
        assert_eq!(url, "/en/products");
    }
}
