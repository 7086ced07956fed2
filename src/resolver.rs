use tracing::{debug, instrument};

use crate::errors::{Result, RuleError};
use crate::model::{FieldId, Instance};

/// Finds the field a rule on `start` refers to by name.
///
/// Scopes are tried in order and the first hit wins:
/// 1. walking up from `start`, nearest first: the parent, then the siblings
///    of the level just left, then the grandparent, and so on to the root list
/// 2. the descendants of `start`, depth first
/// 3. any field of the instance, in document order
#[instrument(level = "trace", skip(instance))]
pub fn resolve(instance: &Instance, start: FieldId, target_name: &str) -> Result<FieldId> {
    let found = nearest_relative(instance, start, target_name)
        .map(|id| (id, "relative"))
        .or_else(|| nearest_descendant(instance, start, target_name).map(|id| (id, "descendant")))
        .or_else(|| instance.find_by_name(target_name).map(|id| (id, "global")));

    match found {
        Some((id, scope)) => {
            debug!(%start, name = target_name, %id, scope, "resolved target field");
            Ok(id)
        }
        None => Err(RuleError::TargetNotFound(target_name.to_string())),
    }
}

fn has_name(instance: &Instance, id: FieldId, name: &str) -> bool {
    instance.field(id).is_some_and(|f| f.name() == name)
}

fn nearest_relative(instance: &Instance, start: FieldId, name: &str) -> Option<FieldId> {
    let mut current = start;
    loop {
        let parent = instance.parent(current);
        if let Some(parent) = parent.filter(|&p| has_name(instance, p, name)) {
            return Some(parent);
        }
        let sibling = instance
            .siblings(current)
            .iter()
            .copied()
            .find(|&id| id != current && has_name(instance, id, name));
        if sibling.is_some() {
            return sibling;
        }
        current = parent?;
    }
}

fn nearest_descendant(instance: &Instance, start: FieldId, name: &str) -> Option<FieldId> {
    instance
        .preorder(instance.children(start))
        .find(|&id| has_name(instance, id, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDocument;
    use pretty_assertions::assert_eq;

    fn f(name: &str) -> FieldDocument {
        FieldDocument::new(name, "", None)
    }

    /// Group A { Type, Inner { Type, Start } }, Elsewhere { Only, Type }, Type
    fn sample() -> Instance {
        Instance::from_fields(vec![
            f("Group A").with_children(vec![
                f("Type"),
                f("Inner").with_children(vec![f("Type"), f("Start")]),
            ]),
            f("Elsewhere").with_children(vec![f("Only"), f("Type")]),
            f("Type"),
        ])
    }

    fn by_path(instance: &Instance, path: &[usize]) -> FieldId {
        let mut ids = instance.root_fields();
        let mut id = ids[path[0]];
        for &i in &path[1..] {
            ids = instance.children(id);
            id = ids[i];
        }
        id
    }

    #[test]
    fn sibling_beats_everything_else() {
        let instance = sample();
        let start = by_path(&instance, &[0, 1, 1]);
        let expected = by_path(&instance, &[0, 1, 0]);
        assert_eq!(resolve(&instance, start, "Type").unwrap(), expected);
    }

    #[test]
    fn walks_up_to_ancestor_level_siblings() {
        let instance = Instance::from_fields(vec![
            f("Group").with_children(vec![
                f("Level").with_children(vec![f("Start")]),
                f("Target"),
            ]),
            f("Target"),
        ]);
        let start = by_path(&instance, &[0, 0, 0]);
        let expected = by_path(&instance, &[0, 1]);
        assert_eq!(resolve(&instance, start, "Target").unwrap(), expected);
    }

    #[test]
    fn ancestor_itself_matches() {
        let instance = sample();
        let start = by_path(&instance, &[0, 1, 1]);
        let expected = by_path(&instance, &[0]);
        assert_eq!(resolve(&instance, start, "Group A").unwrap(), expected);
    }

    #[test]
    fn parent_beats_same_named_sibling() {
        let instance = Instance::from_fields(vec![f("Kind").with_children(vec![f("Address"), f("Kind")])]);
        let start = by_path(&instance, &[0, 0]);
        let expected = by_path(&instance, &[0]);
        assert_eq!(resolve(&instance, start, "Kind").unwrap(), expected);
    }

    #[test]
    fn grandparent_beats_same_named_uncle() {
        let instance = Instance::from_fields(vec![
            f("T").with_children(vec![f("P").with_children(vec![f("Start")]), f("T")]),
        ]);
        let start = by_path(&instance, &[0, 0, 0]);
        let expected = by_path(&instance, &[0]);
        assert_eq!(resolve(&instance, start, "T").unwrap(), expected);
    }

    #[test]
    fn descendant_before_global() {
        let instance = Instance::from_fields(vec![
            f("Start").with_children(vec![f("Box").with_children(vec![f("Deep")])]),
            f("Other").with_children(vec![f("Deep")]),
        ]);
        let start = by_path(&instance, &[0]);
        let expected = by_path(&instance, &[0, 0, 0]);
        assert_eq!(resolve(&instance, start, "Deep").unwrap(), expected);
    }

    #[test]
    fn global_fallback_reaches_other_subtrees() {
        let instance = sample();
        let start = by_path(&instance, &[0, 1, 1]);
        let expected = by_path(&instance, &[1, 0]);
        assert_eq!(resolve(&instance, start, "Only").unwrap(), expected);
    }

    #[test]
    fn unknown_name_is_target_not_found() {
        let instance = sample();
        let start = by_path(&instance, &[2]);
        let err = resolve(&instance, start, "Missing").unwrap_err();
        assert!(matches!(err, RuleError::TargetNotFound(name) if name == "Missing"));
    }
}
