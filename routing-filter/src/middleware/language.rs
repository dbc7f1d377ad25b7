//! Language segment middleware
//!
//! Runs the route filter chain over the request path before the router sees
//! it: `/de/products` is dispatched as `/products`, the recognized params are
//! stored as a request extension and the request locale becomes `de`.

use axum::{
    extract::{Request, State},
    http::uri::{PathAndQuery, Uri},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::filter::RequestEnv;
use crate::utils::scope_locale;

pub async fn language_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let env = RequestEnv::new(req.method().clone(), req.headers().clone());
    let original = req.uri().path().to_string();
    let (path, params) = state.routes.filter_path(&original, &env);

    if path != original {
        tracing::debug!("Filtered request path {} -> {}", original, path);
        if let Err(err) = rewrite_path(&mut req, &path) {
            tracing::warn!("Failed to rewrite request path {} -> {}: {}", original, path, err);
        }
    }

    let language = params.language().map(str::to_string);
    req.extensions_mut().insert(params);

    match language {
        Some(language) => scope_locale(language, next.run(req)).await,
        None => next.run(req).await,
    }
}

fn rewrite_path(req: &mut Request, path: &str) -> Result<(), anyhow::Error> {
    let path_and_query = match req.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    *req.uri_mut() = Uri::from_parts(parts)?;
    Ok(())
}
