//! Schema Model
//!
//! Tagged-variant view of request/response schemas, traversed with an
//! exhaustive visitor instead of duck-typed JSON walking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

// == Schema ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Schema {
    Primitive { primitive: PrimitiveType },
    Array { items: Box<Schema> },
    Object { fields: BTreeMap<String, Schema> },
    /// Named reference to a shared component, not resolved here
    Reference { name: String },
}

impl Schema {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Schema::Primitive { primitive }
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Schema::Reference { name: name.into() }
    }

    /// Folds the schema bottom-up through `visitor`.
    pub fn accept<V: SchemaVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Schema::Primitive { primitive } => visitor.primitive(*primitive),
            Schema::Array { items } => {
                let inner = items.accept(visitor);
                visitor.array(inner)
            }
            Schema::Object { fields } => {
                let children = fields
                    .iter()
                    .map(|(name, schema)| (name.as_str(), schema.accept(visitor)))
                    .collect();
                visitor.object(children)
            }
            Schema::Reference { name } => visitor.reference(name),
        }
    }

    /// Size metrics used for complexity estimation.
    pub fn metrics(&self) -> SchemaMetrics {
        self.accept(&mut MetricsVisitor)
    }
}

// == Visitor ==
/// Bottom-up fold over a [`Schema`].
pub trait SchemaVisitor {
    type Output;

    fn primitive(&mut self, primitive: PrimitiveType) -> Self::Output;
    fn array(&mut self, items: Self::Output) -> Self::Output;
    fn object(&mut self, fields: Vec<(&str, Self::Output)>) -> Self::Output;
    fn reference(&mut self, name: &str) -> Self::Output;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaMetrics {
    /// Object fields at any depth
    pub fields: usize,
    /// Nesting depth; a primitive is depth 1
    pub depth: usize,
    /// Unresolved references
    pub references: usize,
}

struct MetricsVisitor;

impl SchemaVisitor for MetricsVisitor {
    type Output = SchemaMetrics;

    fn primitive(&mut self, _: PrimitiveType) -> SchemaMetrics {
        SchemaMetrics {
            depth: 1,
            ..SchemaMetrics::default()
        }
    }

    fn array(&mut self, items: SchemaMetrics) -> SchemaMetrics {
        SchemaMetrics {
            depth: items.depth + 1,
            ..items
        }
    }

    fn object(&mut self, fields: Vec<(&str, SchemaMetrics)>) -> SchemaMetrics {
        let mut total = SchemaMetrics {
            fields: fields.len(),
            ..SchemaMetrics::default()
        };
        let mut deepest = 0;
        for (_, child) in fields {
            total.fields += child.fields;
            total.references += child.references;
            deepest = deepest.max(child.depth);
        }
        total.depth = deepest + 1;
        total
    }

    fn reference(&mut self, _: &str) -> SchemaMetrics {
        SchemaMetrics {
            depth: 1,
            references: 1,
            ..SchemaMetrics::default()
        }
    }
}
