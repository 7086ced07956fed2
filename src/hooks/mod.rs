use std::sync::Arc;

use crate::cache::ExpressionCache;
use crate::context::Context;
use crate::errors::ValidationError;
use crate::keyword::Keyword;
use crate::model::Instance;
use crate::validator::MandatoryValidator;

/// Capability the host invokes on instance create and update events.
pub trait InstanceHook: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate_on_create(&self, instance: &Instance) -> Vec<ValidationError>;
    fn validate_on_update(&self, previous: &Instance, updated: &Instance) -> Vec<ValidationError>;
}

/// Thread-safe, ordered set of hooks. Registering a name twice replaces the
/// earlier hook in place.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Vec<Arc<dyn InstanceHook>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `mandatory` and `mandatoryIf`, sharing one expression cache.
    pub fn with_builtins(ctx: &Context) -> Self {
        let cache = Arc::new(ExpressionCache::from_context(ctx));
        let mut registry = Self::new();
        for keyword in [Keyword::Mandatory, Keyword::MandatoryIf] {
            registry.register(MandatoryValidator::new(keyword, Arc::clone(&cache)));
        }
        registry
    }

    pub fn register<H: InstanceHook + 'static>(&mut self, hook: H) {
        let hooks = Arc::make_mut(&mut self.inner);
        let hook: Arc<dyn InstanceHook> = Arc::new(hook);
        match hooks.iter_mut().find(|h| h.name() == hook.name()) {
            Some(slot) => *slot = hook,
            None => hooks.push(hook),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn InstanceHook>> {
        self.inner.iter().find(|h| h.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.inner.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Runs every hook in registration order and concatenates their errors.
    pub fn on_create(&self, instance: &Instance) -> Vec<ValidationError> {
        self.inner
            .iter()
            .flat_map(|h| h.validate_on_create(instance))
            .collect()
    }

    pub fn on_update(&self, previous: &Instance, updated: &Instance) -> Vec<ValidationError> {
        self.inner
            .iter()
            .flat_map(|h| h.validate_on_update(previous, updated))
            .collect()
    }
}
