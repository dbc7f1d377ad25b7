//! Language path-segment filter for URL recognition and generation.
//!
//! Incoming paths like `/de/products` are recognized as `/products` with
//! `language = "de"`; generated URLs get the language segment prepended again.
//! The filter plugs into a [`filter::FilterChain`] and can be served in front
//! of an axum router through [`build_app`].

rust_i18n::i18n!("locales", fallback = "en");

pub mod config;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod utils;

#[cfg(test)]
mod tests;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn_with_state,
    response::Response,
    routing::get,
};
use std::convert::Infallible;
use std::sync::Arc;
use tower::{Service, ServiceBuilder};
use tower_http::trace::TraceLayer;

use crate::config::LanguageConfig;
use crate::filter::{FilterChain, LanguageFilter};
use crate::routing::RouteSet;
use crate::utils::{LocaleProvider, RoutingError};

#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteSet>,
    pub language_filter: Arc<LanguageFilter>,
}

impl AppState {
    /// Install the language filter in a fresh chain and register the shop routes
    pub fn new(config: &LanguageConfig, provider: Arc<dyn LocaleProvider>) -> Result<Self, RoutingError> {
        let language_filter = Arc::new(LanguageFilter::new(config.clone(), provider));

        let mut chain = FilterChain::new();
        chain.push(language_filter.clone())?;

        let routes = RouteSet::new(chain)
            .route("root", "/")
            .route("products", "/products")
            .route("product", "/products/:id");

        Ok(Self { routes: Arc::new(routes), language_filter })
    }
}

/// Router with the page handlers
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::pages::home))
        .route("/products", get(handlers::pages::list_products))
        .route("/products/:id", get(handlers::pages::show_product))
        .fallback(handlers::pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router wrapped in the locale and language middleware.
///
/// The middleware sits outside the router so the language segment is gone
/// before routes are matched.
pub fn build_app(
    state: AppState,
) -> impl Service<Request, Response = Response, Error = Infallible, Future: Send> + Clone + Send + 'static {
    let router = build_router(state.clone());

    ServiceBuilder::new()
        .layer(from_fn_with_state(state.clone(), middleware::locale_middleware))
        .layer(from_fn_with_state(state, middleware::language_middleware))
        .service(router)
}
