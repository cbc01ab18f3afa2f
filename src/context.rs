use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::error::{XmlError, XmlResult};
use crate::shape::Shape;

/// Per-shape marshalling metadata: the shape's label (used in error
/// messages) and its resolved element name. Built once per type, never
/// mutated, shared read-only across threads.
#[derive(Debug)]
pub struct MarshalContext {
    shape: &'static str,
    element_name: String,
}

impl MarshalContext {
    fn build<T: Shape + 'static>() -> XmlResult<Self> {
        let shape = T::type_label();
        let element_name = T::element_name();
        if let Err(reason) = check_element_name(&element_name) {
            return Err(XmlError::Setup { shape, reason });
        }
        debug!("built marshalling context for {shape} (element '{element_name}')");
        Ok(MarshalContext {
            shape,
            element_name,
        })
    }

    pub fn shape(&self) -> &'static str {
        self.shape
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }
}

/// Concurrent per-type cache of [`MarshalContext`] values.
///
/// Contexts are built lazily on first use and retained for the process
/// lifetime. Concurrent misses may race to build redundant contexts; the
/// insert-if-absent discipline guarantees only one is retained.
#[derive(Debug, Default)]
pub struct ContextCache {
    map: DashMap<TypeId, Arc<MarshalContext>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Shape + 'static>(&self) -> XmlResult<Arc<MarshalContext>> {
        let id = TypeId::of::<T>();
        if let Some(ctx) = self.map.get(&id) {
            return Ok(ctx.clone());
        }
        let built = Arc::new(MarshalContext::build::<T>()?);
        Ok(self.map.entry(id).or_insert(built).clone())
    }
}

/// Rejects names that cannot appear as an XML element tag.
fn check_element_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err("the resolved element name is empty".to_string()),
        Some(c) if !(c.is_alphabetic() || c == '_') => {
            return Err(format!("'{name}' is not a valid XML element name"));
        }
        _ => {}
    }
    for c in chars {
        if !(c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ':')) {
            return Err(format!("'{name}' is not a valid XML element name"));
        }
    }
    Ok(())
}
