use std::fmt;
use std::sync::Arc;

use super::{GenerateArgs, GenerateNext, Params, RecognizeNext, RequestEnv, RouteFilter};
use crate::utils::RoutingError;

/// Ordered, named filter steps.
///
/// The first installed filter is the outermost: it sees the raw path first on
/// recognition and the finished URL last on generation.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn RouteFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter as the innermost step
    pub fn push(&mut self, filter: Arc<dyn RouteFilter>) -> Result<(), RoutingError> {
        self.ensure_unique(filter.name())?;
        tracing::debug!("Installing route filter '{}'", filter.name());
        self.filters.push(filter);
        Ok(())
    }

    /// Install a filter directly in front of the filter named `anchor`
    pub fn insert_before(&mut self, anchor: &str, filter: Arc<dyn RouteFilter>) -> Result<(), RoutingError> {
        self.ensure_unique(filter.name())?;
        let index = self
            .position(anchor)
            .ok_or_else(|| RoutingError::FilterNotFound(anchor.to_string()))?;
        tracing::debug!("Installing route filter '{}' before '{}'", filter.name(), anchor);
        self.filters.insert(index, filter);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn RouteFilter>> {
        let index = self.position(name)?;
        Some(self.filters.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RouteFilter>> {
        self.filters.iter().find(|f| f.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run recognition through every filter, ending in `finish`
    pub fn recognize<'a, F>(&'a self, path: &mut String, env: &RequestEnv, finish: F) -> Params
    where
        F: FnOnce(&mut String, &RequestEnv) -> Params + 'a,
    {
        self.recognize_from(0, path, env, Box::new(finish))
    }

    /// Run generation through every filter, ending in `finish`
    pub fn generate<'a, F>(&'a self, args: &mut GenerateArgs, finish: F) -> String
    where
        F: FnOnce(&mut GenerateArgs) -> String + 'a,
    {
        self.generate_from(0, args, Box::new(finish))
    }

    fn recognize_from<'a>(
        &'a self,
        index: usize,
        path: &mut String,
        env: &RequestEnv,
        finish: RecognizeNext<'a>,
    ) -> Params {
        match self.filters.get(index) {
            Some(filter) => filter.around_recognize(
                path,
                env,
                Box::new(move |path: &mut String, env: &RequestEnv| {
                    self.recognize_from(index + 1, path, env, finish)
                }),
            ),
            None => finish(path, env),
        }
    }

    fn generate_from<'a>(&'a self, index: usize, args: &mut GenerateArgs, finish: GenerateNext<'a>) -> String {
        match self.filters.get(index) {
            Some(filter) => filter.around_generate(
                args,
                Box::new(move |args: &mut GenerateArgs| self.generate_from(index + 1, args, finish)),
            ),
            None => finish(args),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.filters.iter().position(|f| f.name() == name)
    }

    fn ensure_unique(&self, name: &str) -> Result<(), RoutingError> {
        if self.position(name).is_some() {
            return Err(RoutingError::DuplicateFilter(name.to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain").field("filters", &self.names()).finish()
    }
}
