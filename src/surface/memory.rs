//! In-memory surface for exercising the reconciliation loop in tests.

use std::collections::BTreeMap;

use super::{LiveSurface, Result, SurfaceError};

/// A mutation applied to the surface, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Set { name: String, value: String },
    Append { name: String, value: String },
    Clear { name: String },
}

/// A page made of a plain name → value map.
#[derive(Debug, Default)]
pub struct MemorySurface {
    fields: BTreeMap<String, String>,

    /// Field names whose mutations fail, to exercise error handling.
    broken: Vec<String>,

    /// Field names whose lookups fail, as if the page stopped responding.
    unreachable: Vec<String>,

    /// Every successful mutation, in order.
    pub mutations: Vec<Mutation>,
}

impl MemorySurface {
    pub fn new<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Make every mutation on `name` fail.
    pub fn break_field(&mut self, name: &str) {
        self.broken.push(name.to_string());
    }

    /// Make every lookup of `name` fail.
    pub fn drop_lookups(&mut self, name: &str) {
        self.unreachable.push(name.to_string());
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut String> {
        if self.broken.iter().any(|b| b == name) {
            return Err(SurfaceError::JavaScript(format!("{name} is read-only")));
        }
        self.fields
            .get_mut(name)
            .ok_or_else(|| SurfaceError::FieldNotFound(name.to_string()))
    }
}

impl LiveSurface for MemorySurface {
    fn lookup(&mut self, name: &str) -> Result<Option<String>> {
        if self.unreachable.iter().any(|u| u == name) {
            return Err(SurfaceError::WebSocket("connection reset".to_string()));
        }
        Ok(self.fields.get(name).cloned())
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        *self.field_mut(name)? = value.to_string();
        self.mutations.push(Mutation::Set {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn append(&mut self, name: &str, value: &str) -> Result<()> {
        self.field_mut(name)?.push_str(value);
        self.mutations.push(Mutation::Append {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn clear(&mut self, name: &str) -> Result<()> {
        self.field_mut(name)?.clear();
        self.mutations.push(Mutation::Clear {
            name: name.to_string(),
        });
        Ok(())
    }
}
