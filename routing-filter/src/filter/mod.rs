//! Route filters
//!
//! A route filter wraps URL recognition and generation: it sees the incoming
//! path before the route table does and the generated URL after it. Filters
//! are installed as named steps in a [`FilterChain`]; each one receives a
//! continuation that runs the rest of the chain.

mod chain;
mod language;
mod params;
mod segment;

pub use chain::FilterChain;
pub use language::{LanguageFilter, LanguageSet};
pub use params::{GenerateArgs, LANGUAGE_PARAM, ParamValue, Params, RequestEnv};
pub use segment::{extract_segment, prepend_segment};

/// Continuation running the remainder of recognition on the (possibly
/// rewritten) path
pub type RecognizeNext<'a> = Box<dyn FnOnce(&mut String, &RequestEnv) -> Params + 'a>;

/// Continuation running the remainder of generation on the (possibly
/// rewritten) arguments
pub type GenerateNext<'a> = Box<dyn FnOnce(&mut GenerateArgs) -> String + 'a>;

/// A step in the recognition/generation filter chain
pub trait RouteFilter: Send + Sync {
    /// Name the filter is installed under
    fn name(&self) -> &str;

    /// Inspect or rewrite `path`, call `next`, then post-process the params
    fn around_recognize(&self, path: &mut String, env: &RequestEnv, next: RecognizeNext<'_>) -> Params;

    /// Inspect or rewrite `args`, call `next`, then post-process the URL
    fn around_generate(&self, args: &mut GenerateArgs, next: GenerateNext<'_>) -> String;
}
