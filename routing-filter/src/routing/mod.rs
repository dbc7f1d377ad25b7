mod route_set;

pub use route_set::{ROUTE_PARAM, Route, RouteSet};
