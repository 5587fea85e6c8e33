//! Resolver registry with the priority-ordered fallback loop.

use tracing::{debug, info};

use crate::models::ResolvedApp;
use crate::query::Query;

use super::Resolver;

/// A priority-ordered collection of resolution strategies.
///
/// Strategies are tried in priority order (Specialized, General, Fallback);
/// within one level, registration order is preserved.
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Registers a strategy.
    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        debug!(
            name = resolver.name(),
            priority = ?resolver.priority(),
            "Registering resolver"
        );
        self.resolvers.push(resolver);
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Strategy names in the order they would be tried for `query`.
    #[must_use]
    pub fn find_handlers(&self, query: &Query) -> Vec<&dyn Resolver> {
        let mut handlers: Vec<&dyn Resolver> = self
            .resolvers
            .iter()
            .filter(|r| r.can_handle(query))
            .map(AsRef::as_ref)
            .collect();
        handlers.sort_by_key(|r| r.priority());
        handlers
    }

    /// Runs the strategies in order and returns the first app page found.
    ///
    /// Returns `None` only after every applicable strategy missed.
    #[tracing::instrument(skip(self), fields(query = %query))]
    pub async fn resolve(&self, query: &Query) -> Option<ResolvedApp> {
        let handlers = self.find_handlers(query);
        debug!(handler_count = handlers.len(), "Found handlers for query");

        for handler in handlers {
            debug!(resolver = handler.name(), "Trying resolver");
            if let Some(app) = handler.resolve(query).await {
                info!(
                    resolver = handler.name(),
                    page = %app.page_url,
                    "Resolution successful"
                );
                return Some(app);
            }
            debug!(resolver = handler.name(), "Resolver missed, trying next");
        }

        info!("All resolvers exhausted");
        None
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.resolvers.iter().map(|r| r.name()).collect();
        f.debug_struct("ResolverRegistry")
            .field("resolver_count", &self.resolvers.len())
            .field("resolvers", &names)
            .finish()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::resolver::ResolverPriority;
    use async_trait::async_trait;

    struct MockResolver {
        mock_name: &'static str,
        mock_priority: ResolverPriority,
        handles: bool,
        hit: Option<&'static str>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Resolver for MockResolver {
        fn name(&self) -> &str {
            self.mock_name
        }

        fn priority(&self) -> ResolverPriority {
            self.mock_priority
        }

        fn can_handle(&self, _query: &Query) -> bool {
            self.handles
        }

        async fn resolve(&self, _query: &Query) -> Option<ResolvedApp> {
            self.calls.lock().unwrap().push(self.mock_name);
            self.hit.map(ResolvedApp::new)
        }
    }

    fn mock(
        calls: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
        priority: ResolverPriority,
        hit: Option<&'static str>,
    ) -> Box<MockResolver> {
        Box::new(MockResolver {
            mock_name: name,
            mock_priority: priority,
            handles: true,
            hit,
            calls: Arc::clone(calls),
        })
    }

    #[tokio::test]
    async fn test_registry_tries_in_priority_order_regardless_of_registration() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ResolverRegistry::new();
        registry.register(mock(&calls, "search", ResolverPriority::Fallback, Some("/s")));
        registry.register(mock(&calls, "guess", ResolverPriority::General, None));
        registry.register(mock(&calls, "table", ResolverPriority::Specialized, None));

        let app = registry.resolve(&Query::new("x")).await.unwrap();

        assert_eq!(app.page_url, "/s");
        assert_eq!(*calls.lock().unwrap(), vec!["table", "guess", "search"]);
    }

    #[tokio::test]
    async fn test_registry_stops_at_first_hit() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ResolverRegistry::new();
        registry.register(mock(&calls, "table", ResolverPriority::Specialized, Some("/t")));
        registry.register(mock(&calls, "search", ResolverPriority::Fallback, Some("/s")));

        let app = registry.resolve(&Query::new("x")).await.unwrap();

        assert_eq!(app.page_url, "/t");
        assert_eq!(*calls.lock().unwrap(), vec!["table"]);
    }

    #[tokio::test]
    async fn test_registry_skips_strategies_that_cannot_handle() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ResolverRegistry::new();
        let mut skipped = mock(&calls, "guess", ResolverPriority::General, Some("/g"));
        skipped.handles = false;
        registry.register(skipped);
        registry.register(mock(&calls, "search", ResolverPriority::Fallback, None));

        assert!(registry.resolve(&Query::new("x")).await.is_none());
        assert_eq!(*calls.lock().unwrap(), vec!["search"]);
    }

    #[tokio::test]
    async fn test_empty_registry_resolves_nothing() {
        let registry = ResolverRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.resolve(&Query::new("x")).await.is_none());
    }

    #[test]
    fn test_registry_debug_lists_names() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ResolverRegistry::new();
        registry.register(mock(&calls, "table", ResolverPriority::Specialized, None));
        let debug = format!("{registry:?}");
        assert!(debug.contains("table"));
        assert_eq!(registry.resolver_count(), 1);
    }
}
