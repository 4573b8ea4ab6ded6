//! Strategy registry
//!
//! Maps string references to strategy factories. Instances are created on
//! first lookup and then shared: the same reference always yields the same
//! `Arc`, no matter how many filters or schemas name it.

use crate::aggregator::DefaultTypeAggregator;
use crate::error::{Error, Result};
use crate::strategy::{DependencyRefresher, ResultFilter, SchemaStrategy, SearchSource, TypeAggregator};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Reference of the built-in type aggregator.
pub const DEFAULT_AGGREGATOR: &str = "default";

/// The five kinds of strategy the registry resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Source,
    Filter,
    TypeAggregator,
    Schema,
    DependencyRefresher,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Filter => "filter",
            Self::TypeAggregator => "type aggregator",
            Self::Schema => "schema",
            Self::DependencyRefresher => "dependency refresher",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Factory<T> = Box<dyn Fn() -> Arc<T> + Send + Sync>;

/// Factories and lazily created instances for one strategy kind.
struct Slot<T: ?Sized> {
    kind: StrategyKind,
    factories: HashMap<String, Factory<T>>,
    instances: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> Slot<T> {
    fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
            instances: RwLock::new(HashMap::new()),
        }
    }

    fn register(&mut self, reference: String, factory: Factory<T>) {
        self.instances
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&reference);
        self.factories.insert(reference, factory);
    }

    fn resolve(&self, reference: &str) -> Result<Arc<T>> {
        {
            let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(instance) = instances.get(reference) {
                return Ok(Arc::clone(instance));
            }
        }

        let factory = self
            .factories
            .get(reference)
            .ok_or_else(|| Error::UnknownStrategy {
                kind: self.kind,
                reference: reference.to_string(),
            })?;

        // Another thread may have won the race; keep its instance.
        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        let instance = instances
            .entry(reference.to_string())
            .or_insert_with(|| {
                tracing::debug!(kind = %self.kind, reference, "Instantiating strategy");
                factory()
            });
        Ok(Arc::clone(instance))
    }

    fn references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        refs.sort_unstable();
        refs
    }
}

/// Process-wide strategy lookup.
pub struct StrategyRegistry {
    sources: Slot<dyn SearchSource>,
    filters: Slot<dyn ResultFilter>,
    aggregators: Slot<dyn TypeAggregator>,
    schemas: Slot<dyn SchemaStrategy>,
    refreshers: Slot<dyn DependencyRefresher>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyRegistry {
    /// Registry with the built-in `default` type aggregator.
    pub fn new() -> Self {
        let mut registry = Self {
            sources: Slot::new(StrategyKind::Source),
            filters: Slot::new(StrategyKind::Filter),
            aggregators: Slot::new(StrategyKind::TypeAggregator),
            schemas: Slot::new(StrategyKind::Schema),
            refreshers: Slot::new(StrategyKind::DependencyRefresher),
        };
        registry.register_aggregator(DEFAULT_AGGREGATOR, || DefaultTypeAggregator);
        registry
    }

    pub fn register_source<S, F>(&mut self, reference: impl Into<String>, factory: F) -> &mut Self
    where
        S: SearchSource + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.sources.register(
            reference.into(),
            Box::new(move || Arc::new(factory()) as Arc<dyn SearchSource>),
        );
        self
    }

    pub fn register_filter<S, F>(&mut self, reference: impl Into<String>, factory: F) -> &mut Self
    where
        S: ResultFilter + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.filters.register(
            reference.into(),
            Box::new(move || Arc::new(factory()) as Arc<dyn ResultFilter>),
        );
        self
    }

    pub fn register_aggregator<S, F>(&mut self, reference: impl Into<String>, factory: F) -> &mut Self
    where
        S: TypeAggregator + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.aggregators.register(
            reference.into(),
            Box::new(move || Arc::new(factory()) as Arc<dyn TypeAggregator>),
        );
        self
    }

    pub fn register_schema<S, F>(&mut self, reference: impl Into<String>, factory: F) -> &mut Self
    where
        S: SchemaStrategy + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.schemas.register(
            reference.into(),
            Box::new(move || Arc::new(factory()) as Arc<dyn SchemaStrategy>),
        );
        self
    }

    pub fn register_refresher<S, F>(&mut self, reference: impl Into<String>, factory: F) -> &mut Self
    where
        S: DependencyRefresher + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.refreshers.register(
            reference.into(),
            Box::new(move || Arc::new(factory()) as Arc<dyn DependencyRefresher>),
        );
        self
    }

    pub fn source(&self, reference: &str) -> Result<Arc<dyn SearchSource>> {
        self.sources.resolve(reference)
    }

    pub fn filter(&self, reference: &str) -> Result<Arc<dyn ResultFilter>> {
        self.filters.resolve(reference)
    }

    pub fn aggregator(&self, reference: &str) -> Result<Arc<dyn TypeAggregator>> {
        self.aggregators.resolve(reference)
    }

    pub fn schema(&self, reference: &str) -> Result<Arc<dyn SchemaStrategy>> {
        self.schemas.resolve(reference)
    }

    pub fn refresher(&self, reference: &str) -> Result<Arc<dyn DependencyRefresher>> {
        self.refreshers.resolve(reference)
    }

    /// Registered references of one kind, sorted.
    pub fn references(&self, kind: StrategyKind) -> Vec<&str> {
        match kind {
            StrategyKind::Source => self.sources.references(),
            StrategyKind::Filter => self.filters.references(),
            StrategyKind::TypeAggregator => self.aggregators.references(),
            StrategyKind::Schema => self.schemas.references(),
            StrategyKind::DependencyRefresher => self.refreshers.references(),
        }
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("sources", &self.sources.references())
            .field("filters", &self.filters.references())
            .field("aggregators", &self.aggregators.references())
            .field("schemas", &self.schemas.references())
            .field("refreshers", &self.refreshers.references())
            .finish()
    }
}
