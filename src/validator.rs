use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::cache::ExpressionCache;
use crate::comparison::is_satisfied;
use crate::errors::{Result, ValidationError};
use crate::hooks::InstanceHook;
use crate::keyword::{find_keyword, Keyword};
use crate::model::{FieldId, FieldNode, Instance};
use crate::resolver::resolve;

/// Walks an instance and reports empty fields whose `keyword` rule applies.
#[derive(Debug, Clone)]
pub struct MandatoryValidator {
    keyword: Keyword,
    cache: Arc<ExpressionCache>,
}

impl MandatoryValidator {
    pub fn new(keyword: Keyword, cache: Arc<ExpressionCache>) -> Self {
        Self { keyword, cache }
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn cache(&self) -> &Arc<ExpressionCache> {
        &self.cache
    }

    /// Validates the subtrees rooted at `fields`.
    ///
    /// Errors come out in pre-order. Invisible fields are skipped together
    /// with everything below them.
    pub fn validate_fields(&self, instance: &Instance, fields: &[FieldId]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for &id in fields {
            self.walk(instance, id, &mut errors);
        }
        errors
    }

    fn walk(&self, instance: &Instance, id: FieldId, errors: &mut Vec<ValidationError>) {
        let Some(field) = instance.field(id) else {
            return;
        };
        if !field.is_visible() {
            trace!(field = field.name(), "skipping invisible subtree");
            return;
        }

        if field.is_empty() {
            match self.is_required(instance, id, field) {
                Ok(true) => {
                    debug!(field = field.name(), keyword = %self.keyword, "mandatory field is empty");
                    errors.push(ValidationError::mandatory(id, field.name()));
                }
                Ok(false) => {}
                Err(message) => {
                    warn!(field = field.name(), diagnostic = %message, "mandatory rule could not be applied");
                    errors.push(ValidationError::custom(id, field.name(), message));
                }
            }
        }

        for &child in field.children() {
            self.walk(instance, child, errors);
        }
    }

    /// Whether the rule on an empty `field` currently applies. The error is
    /// the diagnostic reported on the field.
    fn is_required(
        &self,
        instance: &Instance,
        id: FieldId,
        field: &FieldNode,
    ) -> std::result::Result<bool, String> {
        let found = find_keyword(field.description(), self.keyword)
            .map_err(|e| format!("error validating mandatory expression: {e}"))?;
        let Some(found) = found else {
            return Ok(false);
        };
        let Some(raw) = found.args else {
            return Ok(true);
        };
        self.evaluate(instance, id, field, raw)
            .map_err(|e| format!("error validating mandatory expression `{raw}`: {e}"))
    }

    fn evaluate(&self, instance: &Instance, id: FieldId, field: &FieldNode, raw: &str) -> Result<bool> {
        let expression = self.cache.get_or_build(raw)?;
        let target_value = match expression.target() {
            Some(name) => {
                let target = resolve(instance, id, name)?;
                instance.field(target).and_then(FieldNode::value)
            }
            None => None,
        };
        let holds = is_satisfied(&expression, target_value);
        trace!(field = field.name(), %expression, ?target_value, holds, "evaluated condition");
        Ok(holds)
    }
}

impl InstanceHook for MandatoryValidator {
    fn name(&self) -> &'static str {
        self.keyword.hook_name()
    }

    fn validate_on_create(&self, instance: &Instance) -> Vec<ValidationError> {
        self.validate_fields(instance, instance.root_fields())
    }

    fn validate_on_update(&self, _previous: &Instance, updated: &Instance) -> Vec<ValidationError> {
        self.validate_fields(updated, updated.root_fields())
    }
}
