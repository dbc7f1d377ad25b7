//! Locale extraction middleware
//!
//! Picks the request locale from the Accept-Language header, limited to the
//! languages the language filter accepts, and scopes it to the request.

use axum::{
    extract::{Request, State},
    http::header::ACCEPT_LANGUAGE,
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::utils::{extract_locale_from_header, scope_locale};

/// Middleware to extract locale from Accept-Language header
pub async fn locale_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let locale = {
        let header = req.headers().get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        let languages = state.language_filter.languages();
        extract_locale_from_header(header, languages.codes())
    };

    match locale {
        Some(locale) => {
            tracing::debug!("Request locale from Accept-Language: {}", locale);
            scope_locale(locale, next.run(req)).await
        },
        None => next.run(req).await,
    }
}
