//! Internationalization utilities
//!
//! Language-code normalization, the `LocaleProvider` seam the language filter
//! pulls its locales through, and request-scoped storage for the current locale.

use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::sync::RwLock;

pub const DEFAULT_LOCALE: &str = "en";

static LANGUAGE_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2,3}(?:-[A-Za-z0-9]{2,8})*$").expect("language code pattern is valid")
});

// Request-scoped locale, set by the HTTP middleware for the lifetime of a request
tokio::task_local! {
    static CURRENT_LOCALE: String;
}

/// Source of locale information for the language filter.
///
/// The filter only ever reads through this trait, so it stays independent of
/// whichever i18n system the host application runs.
pub trait LocaleProvider: Send + Sync {
    /// Locale active for the current request or thread
    fn current_locale(&self) -> String;

    /// Locale the application treats as primary
    fn default_locale(&self) -> String;

    /// Every locale the application ships
    fn available_locales(&self) -> Vec<String>;
}

/// Provider backed by `rust-i18n` and the locale files compiled into this crate
#[derive(Debug, Clone)]
pub struct RustI18nProvider {
    default_locale: String,
}

impl RustI18nProvider {
    pub fn new() -> Self {
        Self { default_locale: DEFAULT_LOCALE.to_string() }
    }

    pub fn with_default_locale(locale: impl Into<String>) -> Self {
        Self { default_locale: locale.into() }
    }
}

impl Default for RustI18nProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocaleProvider for RustI18nProvider {
    fn current_locale(&self) -> String {
        request_locale().unwrap_or_else(|| rust_i18n::locale().to_string())
    }

    fn default_locale(&self) -> String {
        self.default_locale.clone()
    }

    fn available_locales(&self) -> Vec<String> {
        rust_i18n::available_locales!().into_iter().map(|l| l.to_string()).collect()
    }
}

/// Provider with a fixed locale list and a settable current locale
#[derive(Debug)]
pub struct StaticLocaleProvider {
    available: RwLock<Vec<String>>,
    default_locale: String,
    current: RwLock<String>,
}

impl StaticLocaleProvider {
    pub fn new<I, S>(available: I, default_locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default_locale = default_locale.into();
        Self {
            available: RwLock::new(available.into_iter().map(Into::into).collect()),
            current: RwLock::new(default_locale.clone()),
            default_locale,
        }
    }

    /// Set the locale returned outside of a request scope
    pub fn set_current_locale(&self, locale: impl Into<String>) {
        if let Ok(mut current) = self.current.write() {
            *current = locale.into();
        }
    }

    /// Replace the shipped locales. Filters caching a compiled set must be invalidated.
    pub fn set_available_locales<I, S>(&self, available: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut locales) = self.available.write() {
            *locales = available.into_iter().map(Into::into).collect();
        }
    }
}

impl LocaleProvider for StaticLocaleProvider {
    fn current_locale(&self) -> String {
        if let Some(locale) = request_locale() {
            return locale;
        }
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(_) => self.default_locale.clone(),
        }
    }

    fn default_locale(&self) -> String {
        self.default_locale.clone()
    }

    fn available_locales(&self) -> Vec<String> {
        match self.available.read() {
            Ok(available) => available.clone(),
            Err(_) => Vec::new(),
        }
    }
}

/// Run `fut` with `locale` as the request-scoped locale
pub async fn scope_locale<F>(locale: String, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_LOCALE.scope(locale, fut).await
}

/// Synchronous counterpart of [`scope_locale`]
pub fn with_locale<R>(locale: String, f: impl FnOnce() -> R) -> R {
    CURRENT_LOCALE.sync_scope(locale, f)
}

/// Locale of the enclosing request scope, if any
pub fn request_locale() -> Option<String> {
    CURRENT_LOCALE.try_with(|locale| locale.clone()).ok()
}

/// Normalize a locale string to language-tag form.
/// Accepts: "en", "EN", "en_us", "en-US", "zh_hant_tw", etc.
pub fn normalize_language_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .filter(|subtag| !subtag.is_empty())
        .enumerate()
        .map(|(i, subtag)| match (i, subtag.len()) {
            (0, _) => subtag.to_ascii_lowercase(),
            (_, 2) => subtag.to_ascii_uppercase(),
            (_, 4) => {
                let (head, tail) = subtag.split_at(1);
                format!("{}{}", head.to_ascii_uppercase(), tail.to_ascii_lowercase())
            },
            _ => subtag.to_ascii_lowercase(),
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether an already-normalized code looks like a language tag
pub fn is_well_formed_language_code(code: &str) -> bool {
    LANGUAGE_CODE_RE.is_match(code)
}

/// Extract locale from an Accept-Language header value.
///
/// Entries are tried in header order (quality weights are ignored); the first
/// one available either exactly or by its primary subtag wins.
pub fn extract_locale_from_header(header_value: Option<&str>, available: &[String]) -> Option<String> {
    let header_value = header_value?;

    for raw in header_value.split(',') {
        let tag = raw.split(';').next().unwrap_or(raw).trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let tag = normalize_language_code(tag);
        if available.iter().any(|code| *code == tag) {
            return Some(tag);
        }

        if let Some(primary) = tag.split('-').next()
            && available.iter().any(|code| code == primary)
        {
            return Some(primary.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<String> {
        vec!["en".to_string(), "de".to_string(), "pt-BR".to_string()]
    }

    #[test]
    fn test_normalize_language_code() {
        assert_eq!(normalize_language_code("en"), "en");
        assert_eq!(normalize_language_code("EN"), "en");
        assert_eq!(normalize_language_code("en_us"), "en-US");
        assert_eq!(normalize_language_code(" en-us "), "en-US");
        assert_eq!(normalize_language_code("zh_hant_tw"), "zh-Hant-TW");
        assert_eq!(normalize_language_code("de-1996"), "de-1996");
        assert_eq!(normalize_language_code(""), "");
    }

    #[test]
    fn test_is_well_formed_language_code() {
        assert!(is_well_formed_language_code("en"));
        assert!(is_well_formed_language_code("en-US"));
        assert!(is_well_formed_language_code("zh-Hant-TW"));
        assert!(!is_well_formed_language_code(""));
        assert!(!is_well_formed_language_code("e"));
        assert!(!is_well_formed_language_code("en/US"));
        assert!(!is_well_formed_language_code("EN"));
    }

    #[test]
    fn test_extract_locale_from_header() {
        let available = available();
        assert_eq!(extract_locale_from_header(Some("de"), &available), Some("de".to_string()));
        assert_eq!(
            extract_locale_from_header(Some("de-AT,de;q=0.9"), &available),
            Some("de".to_string())
        );
        assert_eq!(
            extract_locale_from_header(Some("pt_br, en;q=0.5"), &available),
            Some("pt-BR".to_string())
        );
        assert_eq!(
            extract_locale_from_header(Some("fr, *;q=0.1, en"), &available),
            Some("en".to_string())
        );
        assert_eq!(extract_locale_from_header(Some("fr"), &available), None);
        assert_eq!(extract_locale_from_header(None, &available), None);
    }

    #[test]
    fn test_static_provider_current_locale() {
        let provider = StaticLocaleProvider::new(["en", "de"], "en");
        assert_eq!(provider.current_locale(), "en");

        provider.set_current_locale("de");
        assert_eq!(provider.current_locale(), "de");
        assert_eq!(provider.default_locale(), "en");
        assert_eq!(provider.available_locales(), vec!["en", "de"]);

        provider.set_available_locales(["it"]);
        assert_eq!(provider.available_locales(), vec!["it"]);
    }

    #[test]
    fn test_request_scope_overrides_provider() {
        let provider = StaticLocaleProvider::new(["en", "de", "fr"], "en");
        assert_eq!(request_locale(), None);

        let inside = with_locale("fr".to_string(), || provider.current_locale());
        assert_eq!(inside, "fr");
        assert_eq!(provider.current_locale(), "en");
    }

    #[tokio::test]
    async fn test_scope_locale_async() {
        let locale = scope_locale("de".to_string(), async { request_locale() }).await;
        assert_eq!(locale, Some("de".to_string()));
        assert_eq!(request_locale(), None);
    }

    #[test]
    fn test_rust_i18n_provider_lists_bundled_locales() {
        let provider = RustI18nProvider::new();
        let available = provider.available_locales();
        assert!(available.iter().any(|l| l == "en"));
        assert!(available.iter().any(|l| l == "de"));
        assert!(available.iter().any(|l| l == "fr"));
        assert_eq!(provider.default_locale(), "en");
    }
}
