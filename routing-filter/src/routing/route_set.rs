//! Named route table with recognition and generation running through a
//! [`FilterChain`].

use std::fmt;

use crate::filter::{FilterChain, GenerateArgs, ParamValue, Params, RequestEnv};
use crate::utils::RoutingError;

/// Key holding the matched route name in recognized params
pub const ROUTE_PARAM: &str = "route";

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateSegment {
    Static(String),
    Param(String),
}

/// A named route such as `product` → `/products/:id`
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    template: String,
    segments: Vec<TemplateSegment>,
}

impl Route {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = split_path(&template)
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => TemplateSegment::Param(param.to_string()),
                None => TemplateSegment::Static(segment.to_string()),
            })
            .collect();
        Self { name: name.into(), template, segments }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            TemplateSegment::Param(name) => Some(name.as_str()),
            TemplateSegment::Static(_) => None,
        })
    }

    /// Match a filtered path against the template
    fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new().with(ROUTE_PARAM, self.name.as_str());
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                TemplateSegment::Static(expected) if expected == part => {},
                TemplateSegment::Static(_) => return None,
                TemplateSegment::Param(name) => {
                    let value = urlencoding::decode(part).map(|v| v.into_owned()).unwrap_or_else(|_| part.to_string());
                    params.insert(name.as_str(), value);
                },
            }
        }
        Some(params)
    }

    /// Fail early when the call cannot fill every dynamic segment
    fn check_args(&self, args: &GenerateArgs) -> Result<(), RoutingError> {
        let mut positional = args.positional().len();
        for name in self.param_names() {
            if args.options().is_some_and(|options| options.contains_key(name)) {
                continue;
            }
            if positional == 0 {
                return Err(RoutingError::missing_segment(&self.name, name));
            }
            positional -= 1;
        }
        Ok(())
    }

    /// Build the path; named options win over positional values, leftover
    /// options become the query string.
    fn build(&self, args: &mut GenerateArgs) -> String {
        let mut options = args.extract_options();
        let mut positional = args.positional().iter();
        let mut path = String::new();

        for segment in &self.segments {
            path.push('/');
            match segment {
                TemplateSegment::Static(value) => path.push_str(value),
                TemplateSegment::Param(name) => {
                    let value = options
                        .remove(name)
                        .or_else(|| positional.next().cloned())
                        .unwrap_or(ParamValue::Str(String::new()));
                    path.push_str(&urlencoding::encode(&value.to_string()));
                },
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        if !options.is_empty() {
            let query = options
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(&value.to_string()))
                })
                .collect::<Vec<_>>()
                .join("&");
            path.push('?');
            path.push_str(&query);
        }

        path
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Route table plus the filters wrapped around it
pub struct RouteSet {
    routes: Vec<Route>,
    chain: FilterChain,
}

impl RouteSet {
    pub fn new(chain: FilterChain) -> Self {
        Self { routes: Vec::new(), chain }
    }

    /// Builder-style route registration
    pub fn route(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.add(name, template);
        self
    }

    /// Register a route; a later route with the same name replaces the earlier one
    pub fn add(&mut self, name: impl Into<String>, template: impl Into<String>) {
        let route = Route::new(name, template);
        tracing::debug!("Registering route '{}' -> {}", route.name(), route.template());
        match self.routes.iter_mut().find(|r| r.name == route.name) {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    /// Run only the filter chain over `path`.
    ///
    /// Returns the filtered path and the params the filters contributed; used
    /// when another router does the actual matching.
    pub fn filter_path(&self, path: &str, env: &RequestEnv) -> (String, Params) {
        let mut path = path.to_string();
        let mut filtered = None;
        let params = self.chain.recognize(&mut path, env, |path, _| {
            filtered = Some(path.clone());
            Params::new()
        });
        (filtered.unwrap_or(path), params)
    }

    /// Recognize `path` into route params
    pub fn recognize(&self, path: &str, env: &RequestEnv) -> Result<Params, RoutingError> {
        let mut remaining = path.to_string();
        let mut matched = false;

        let params = self.chain.recognize(&mut remaining, env, |path, _| {
            match self.routes.iter().find_map(|route| route.matches(path)) {
                Some(params) => {
                    matched = true;
                    params
                },
                None => Params::new(),
            }
        });

        if !matched {
            tracing::debug!("No route matches '{}' (filtered: '{}')", path, remaining);
            return Err(RoutingError::NoRouteMatches(path.to_string()));
        }
        Ok(params)
    }

    /// Generate the URL for the route called `name`
    pub fn url_for(&self, name: &str, args: GenerateArgs) -> Result<String, RoutingError> {
        let route = self.get(name).ok_or_else(|| RoutingError::UnknownRoute(name.to_string()))?;
        route.check_args(&args)?;

        let mut args = args;
        let url = self.chain.generate(&mut args, |args| route.build(args));
        tracing::debug!("Generated '{}' for route '{}'", url, name);
        Ok(url)
    }
}

impl fmt::Debug for RouteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSet").field("routes", &self.routes).field("chain", &self.chain).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> RouteSet {
        RouteSet::new(FilterChain::new())
            .route("root", "/")
            .route("products", "/products")
            .route("product", "/products/:id")
            .route("review", "/products/:product_id/reviews/:id")
    }

    #[test]
    fn test_recognize_static_and_dynamic() {
        let routes = routes();
        let env = RequestEnv::default();

        let params = routes.recognize("/", &env).unwrap();
        assert_eq!(params.get_str(ROUTE_PARAM), Some("root"));

        let params = routes.recognize("/products/", &env).unwrap();
        assert_eq!(params.get_str(ROUTE_PARAM), Some("products"));

        let params = routes.recognize("/products/7/reviews/3", &env).unwrap();
        assert_eq!(params.get_str(ROUTE_PARAM), Some("review"));
        assert_eq!(params.get_str("product_id"), Some("7"));
        assert_eq!(params.get_str("id"), Some("3"));
    }

    #[test]
    fn test_recognize_unknown_path() {
        let err = routes().recognize("/orders", &RequestEnv::default()).unwrap_err();
        assert!(matches!(err, RoutingError::NoRouteMatches(path) if path == "/orders"));
    }

    #[test]
    fn test_url_for_fills_segments() {
        let routes = routes();
        assert_eq!(routes.url_for("root", GenerateArgs::new()).unwrap(), "/");
        assert_eq!(
            routes.url_for("product", GenerateArgs::new().with_positional(7_i64)).unwrap(),
            "/products/7"
        );
        assert_eq!(
            routes
                .url_for(
                    "review",
                    GenerateArgs::new().with_positional(3_i64).with_options(Params::new().with("product_id", 7_i64)),
                )
                .unwrap(),
            "/products/7/reviews/3"
        );
    }

    #[test]
    fn test_url_for_leftover_options_become_query() {
        let url = routes()
            .url_for(
                "products",
                GenerateArgs::new().with_options(Params::new().with("q", "red shoes").with("page", 2_i64)),
            )
            .unwrap();
        assert_eq!(url, "/products?page=2&q=red%20shoes");
    }

    #[test]
    fn test_url_for_errors() {
        let routes = routes();
        assert!(matches!(
            routes.url_for("orders", GenerateArgs::new()),
            Err(RoutingError::UnknownRoute(_))
        ));
        assert!(matches!(
            routes.url_for("product", GenerateArgs::new()),
            Err(RoutingError::MissingSegment { .. })
        ));
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut routes = routes();
        routes.add("products", "/catalog");
        assert_eq!(routes.routes().len(), 4);
        assert_eq!(routes.url_for("products", GenerateArgs::new()).unwrap(), "/catalog");
    }
}
