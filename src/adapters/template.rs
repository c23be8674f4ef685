//! Template composition: builds a record template from a field mapping and
//! materializes it into concrete JSON.

use rand::Rng;
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};

use super::field_generator::{FieldGenerator, Placeholder};
use crate::domain::{FieldMap, MockError, MockResult};

/// Structural template where leaves are still to be drawn
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    Placeholder(Placeholder),
    /// Ordered field name -> sub-template
    Record(Vec<(String, Template)>),
    List(Vec<Template>),
    /// Value already generated at composition time
    Literal(Value),
}

impl Template {
    /// Resolve every placeholder; every element of a list draws independently
    pub fn materialize<R: Rng>(&self, rng: &mut R) -> Value {
        match self {
            Template::Placeholder(p) => p.render(rng),
            Template::Record(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (name, template) in entries {
                    map.insert(name.clone(), template.materialize(rng));
                }
                Value::Object(map)
            }
            Template::List(items) => {
                Value::Array(items.iter().map(|t| t.materialize(rng)).collect())
            }
            Template::Literal(v) => v.clone(),
        }
    }
}

/// Template for one record of `fields`, keys in declaration order
pub fn record_template<R: Rng>(generator: &FieldGenerator, fields: &FieldMap, rng: &mut R) -> Template {
    Template::Record(
        fields
            .iter()
            .map(|(name, field)| (name.clone(), generator.template_for(field, rng)))
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateComposer {
    generator: FieldGenerator,
}

impl TemplateComposer {
    pub fn new() -> Self {
        Self {
            generator: FieldGenerator::new(),
        }
    }

    /// Template for `count` records. One record yields a bare record template;
    /// more yield a list of independently drawn records.
    pub fn compose<R: Rng>(&self, fields: &FieldMap, count: usize, rng: &mut R) -> Template {
        if count <= 1 {
            record_template(&self.generator, fields, rng)
        } else {
            Template::List(
                (0..count)
                    .map(|_| record_template(&self.generator, fields, rng))
                    .collect(),
            )
        }
    }

    pub fn generate_with<R: Rng>(&self, fields: &FieldMap, count: usize, rng: &mut R) -> Value {
        self.compose(fields, count, rng).materialize(rng)
    }

    pub fn generate(&self, fields: &FieldMap, count: usize) -> Value {
        self.generate_with(fields, count, &mut rand::thread_rng())
    }

    /// Like [`generate`](Self::generate), but a panic inside a value generator
    /// is reported as [`MockError::Generation`]
    pub fn try_generate(&self, fields: &FieldMap, count: usize) -> MockResult<Value> {
        panic::catch_unwind(AssertUnwindSafe(|| self.generate(fields, count)))
            .map_err(|payload| MockError::Generation(panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "value generator panicked".to_string())
}
