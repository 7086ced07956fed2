pub mod errors;
pub mod context;
pub mod model;
pub mod hooks;      // host-facing create/update capability
pub mod cache;
pub mod expression;
pub mod keyword;
pub mod resolver;
pub mod comparison;
pub mod validator;
mod parser;

use std::sync::OnceLock;

use context::Context;
use hooks::Registry;

/// Entry point for hosts: a registry of validators plus the options they
/// were built with.
#[derive(Clone)]
pub struct Engine {
    ctx: Context,
    registry: Registry,
}

impl Engine {
    /// Engine with the built-in `mandatory` and `mandatoryIf` validators.
    pub fn new(ctx: Context) -> Self {
        let registry = Registry::with_builtins(&ctx);
        Self { ctx, registry }
    }

    pub fn with_registry(ctx: Context, registry: Registry) -> Self {
        Self { ctx, registry }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn on_create(&self, instance: &Instance) -> Vec<ValidationError> {
        self.registry.on_create(instance)
    }

    /// Only `updated` is inspected; `previous` is passed through to hooks.
    pub fn on_update(&self, previous: &Instance, updated: &Instance) -> Vec<ValidationError> {
        self.registry.on_update(previous, updated)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Context::default())
    }
}

fn default_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::default)
}

/// Convenience: validate with the process-wide default engine, whose
/// expression cache is shared by every caller.
pub fn validate(instance: &Instance) -> Vec<ValidationError> {
    default_engine().on_create(instance)
}

/// Convenience: update-event validation with the default engine.
pub fn validate_update(previous: &Instance, updated: &Instance) -> Vec<ValidationError> {
    default_engine().on_update(previous, updated)
}

pub use errors::{ErrorKind, Result, RuleError, ValidationError};
pub use expression::{parse_expression, Expression, OperatorKind};
pub use keyword::Keyword;
pub use model::{FieldDocument, FieldId, Instance, InstanceDocument};
