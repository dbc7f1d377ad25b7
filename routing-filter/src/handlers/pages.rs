use axum::{
    Extension, Json,
    extract::{Path, State},
    http::Uri,
};
use rust_i18n::t;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;
use crate::filter::{GenerateArgs, LANGUAGE_PARAM, Params};
use crate::utils::{ApiError, ApiResult, request_locale};

/// Demo catalog
const PRODUCTS: &[i64] = &[1, 2, 3];

#[derive(Debug, Serialize)]
pub struct PageResponse {
    /// Language recognized from the path, if any
    pub language: Option<String>,
    /// Locale the page was rendered in
    pub locale: String,
    pub title: String,
    pub params: Params,
    pub links: BTreeMap<String, String>,
    /// The same page in every available language
    pub alternates: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ProductItem>,
}

#[derive(Debug, Serialize)]
pub struct ProductItem {
    pub id: i64,
    pub name: String,
    pub url: String,
}

// GET /
pub async fn home(
    State(state): State<AppState>,
    params: Option<Extension<Params>>,
) -> ApiResult<Json<PageResponse>> {
    let params = params.map(|Extension(p)| p).unwrap_or_default();
    let locale = current_locale(&state);
    tracing::debug!("Rendering home page in '{}'", locale);

    let mut links = BTreeMap::new();
    links.insert("self".to_string(), state.routes.url_for("root", GenerateArgs::new())?);
    links.insert("products".to_string(), state.routes.url_for("products", GenerateArgs::new())?);

    Ok(Json(PageResponse {
        language: params.language().map(str::to_string),
        title: t!("home.title", locale = &locale).to_string(),
        alternates: alternates(&state, "root", GenerateArgs::new())?,
        locale,
        params,
        links,
        items: Vec::new(),
    }))
}

// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    params: Option<Extension<Params>>,
) -> ApiResult<Json<PageResponse>> {
    let params = params.map(|Extension(p)| p).unwrap_or_default();
    let locale = current_locale(&state);
    tracing::debug!("Listing {} products in '{}'", PRODUCTS.len(), locale);

    let items = PRODUCTS
        .iter()
        .map(|id| {
            Ok::<_, ApiError>(ProductItem {
                id: *id,
                name: product_name(*id, &locale).unwrap_or_default(),
                url: state.routes.url_for("product", GenerateArgs::new().with_positional(*id))?,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let mut links = BTreeMap::new();
    links.insert("self".to_string(), state.routes.url_for("products", GenerateArgs::new())?);
    links.insert("home".to_string(), state.routes.url_for("root", GenerateArgs::new())?);

    Ok(Json(PageResponse {
        language: params.language().map(str::to_string),
        title: t!("products.title", locale = &locale).to_string(),
        alternates: alternates(&state, "products", GenerateArgs::new())?,
        locale,
        params,
        links,
        items,
    }))
}

// GET /products/:id
pub async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Option<Extension<Params>>,
) -> ApiResult<Json<PageResponse>> {
    let params = params.map(|Extension(p)| p).unwrap_or_default();
    let locale = current_locale(&state);

    let id: i64 = id.parse().map_err(|_| ApiError::invalid_input(format!("Invalid product id: {}", id)))?;
    let name = product_name(id, &locale).ok_or_else(|| ApiError::not_found(format!("product {}", id)))?;

    tracing::debug!("Showing product {} in '{}'", id, locale);

    let mut links = BTreeMap::new();
    links.insert("self".to_string(), state.routes.url_for("product", GenerateArgs::new().with_positional(id))?);
    links.insert("products".to_string(), state.routes.url_for("products", GenerateArgs::new())?);

    Ok(Json(PageResponse {
        language: params.language().map(str::to_string),
        title: name,
        alternates: alternates(&state, "product", GenerateArgs::new().with_positional(id))?,
        locale,
        params,
        links,
        items: Vec::new(),
    }))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path().to_string())
}

fn product_name(id: i64, locale: &str) -> Option<String> {
    let name = match id {
        1 => t!("products.teapot", locale = locale),
        2 => t!("products.kettle", locale = locale),
        3 => t!("products.mug", locale = locale),
        _ => return None,
    };
    Some(name.to_string())
}

fn current_locale(state: &AppState) -> String {
    request_locale().unwrap_or_else(|| state.language_filter.default_language())
}

/// Links to the page for every accepted language
fn alternates(state: &AppState, route: &str, args: GenerateArgs) -> ApiResult<BTreeMap<String, String>> {
    let languages = state.language_filter.languages();
    let mut alternates = BTreeMap::new();
    for code in languages.codes() {
        let mut args = args.clone();
        let mut options = args.extract_options();
        options.insert(LANGUAGE_PARAM, code.as_str());
        args.push_options(options);
        alternates.insert(code.clone(), state.routes.url_for(route, args)?);
    }
    Ok(alternates)
}
