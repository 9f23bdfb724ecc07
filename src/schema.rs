//! Field maps and per-request schema assembly.

use async_graphql::dynamic::{Field, Object, Schema, Type};

use crate::error::GatewayError;

/// Insertion-ordered map of field name to field definition.
///
/// Duplicate names overwrite: when two handlers expose the same field, the
/// later-registered handler wins. The name must match the name the field was
/// constructed with.
#[derive(Default)]
pub struct FieldMap {
    entries: Vec<(String, Field)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any existing field of the same name.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = field;
        } else {
            self.entries.push((name, field));
        }
    }

    /// Fold another map over this one, overwriting on duplicate names.
    pub fn merge(&mut self, other: FieldMap) {
        for (name, field) in other.entries {
            self.insert(name, field);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    fn into_object(self, name: &str) -> Object {
        self.entries
            .into_iter()
            .fold(Object::new(name), |object, (_, field)| object.field(field))
    }
}

/// Build one executable schema from merged field maps.
///
/// The `Query` root is registered only when the query map is non-empty, the
/// `Mutation` root only when the mutation map is non-empty. An invalid
/// resulting type graph (including a missing query root, which the engine
/// requires) is reported as `SCHEMA_GENERATION_ERROR`.
pub(crate) fn assemble(
    types: Vec<Type>,
    queries: FieldMap,
    mutations: FieldMap,
) -> Result<Schema, GatewayError> {
    let has_queries = !queries.is_empty();
    let has_mutations = !mutations.is_empty();

    let mutation_root = if has_mutations { Some("Mutation") } else { None };
    let mut builder = Schema::build("Query", mutation_root, None::<&str>);
    for ty in types {
        builder = builder.register(ty);
    }
    if has_queries {
        builder = builder.register(queries.into_object("Query"));
    }
    if has_mutations {
        builder = builder.register(mutations.into_object("Mutation"));
    }

    builder
        .finish()
        .map_err(|e| GatewayError::Schema(e.to_string()))
}
