pub mod error;
pub mod i18n;

pub use error::{ApiError, ApiResult, RoutingError};
pub use i18n::{
    LocaleProvider, RustI18nProvider, StaticLocaleProvider, extract_locale_from_header,
    normalize_language_code, request_locale, scope_locale,
};
