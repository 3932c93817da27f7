//! Metadata registry
//!
//! Maps qualified type names to component descriptors. Lookups walk the
//! superclass chain, so a descriptor only lists what its class adds.

use std::collections::HashMap;

use crate::descriptor::simple_name;
use crate::{ComponentDescriptor, MetadataError, MetadataResult, PropertyDescriptor, PropertyName};

/// Component metadata registry
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    components: HashMap<String, ComponentDescriptor>,
    /// Simple name -> qualified names
    by_simple_name: HashMap<String, Vec<String>>,
}

impl MetadataRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in component catalog
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in crate::builtin::catalog() {
            registry.register(descriptor);
        }
        tracing::debug!("Built-in metadata catalog: {} components", registry.len());
        registry
    }

    /// Register (or replace) a component descriptor
    pub fn register(&mut self, descriptor: ComponentDescriptor) {
        let qualified = descriptor.qualified_name.clone();
        let simple = descriptor.simple_name().to_string();
        let names = self.by_simple_name.entry(simple).or_default();
        if !names.contains(&qualified) {
            names.push(qualified.clone());
        }
        self.components.insert(qualified, descriptor);
    }

    /// Register every descriptor of a JSON catalog (an array of descriptors).
    /// Superclasses must already be known or be part of the same catalog.
    pub fn register_catalog_json(&mut self, json: &str) -> MetadataResult<usize> {
        let descriptors: Vec<ComponentDescriptor> = serde_json::from_str(json)?;
        for descriptor in &descriptors {
            if let Some(superclass) = &descriptor.superclass {
                let known = self.components.contains_key(superclass)
                    || descriptors.iter().any(|d| &d.qualified_name == superclass);
                if !known {
                    return Err(MetadataError::UnknownSuperclass {
                        component: descriptor.qualified_name.clone(),
                        superclass: superclass.clone(),
                    });
                }
            }
        }
        let count = descriptors.len();
        for descriptor in descriptors {
            self.register(descriptor);
        }
        tracing::debug!("Registered {} components from catalog", count);
        Ok(count)
    }

    /// Resolve a qualified type name
    pub fn resolve(&self, qualified_name: &str) -> Option<&ComponentDescriptor> {
        self.components.get(qualified_name)
    }

    /// Resolve a simple type name when it is unambiguous
    pub fn resolve_simple(&self, simple: &str) -> Option<&ComponentDescriptor> {
        match self.by_simple_name.get(simple).map(Vec::as_slice) {
            Some([only]) => self.components.get(only),
            _ => None,
        }
    }

    /// Qualified names sharing a simple name
    pub fn candidates(&self, simple: &str) -> &[String] {
        self.by_simple_name
            .get(simple)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve by qualified name, falling back to an unambiguous simple name
    pub fn lookup(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.resolve(name).or_else(|| self.resolve_simple(simple_name(name)))
    }

    /// The type followed by its ancestors
    pub fn ancestry<'a>(&'a self, qualified_name: &str) -> Vec<&'a ComponentDescriptor> {
        let mut chain = Vec::new();
        let mut current = self.resolve(qualified_name);
        while let Some(descriptor) = current {
            // Guard against cyclic catalogs
            if chain.iter().any(|d: &&ComponentDescriptor| d.qualified_name == descriptor.qualified_name) {
                break;
            }
            chain.push(descriptor);
            current = descriptor.superclass.as_deref().and_then(|s| self.resolve(s));
        }
        chain
    }

    /// All properties of a type, own properties first, overridden ones once
    pub fn properties_of(&self, qualified_name: &str) -> Vec<&PropertyDescriptor> {
        let mut result: Vec<&PropertyDescriptor> = Vec::new();
        for descriptor in self.ancestry(qualified_name) {
            for property in &descriptor.properties {
                if !result.iter().any(|p| p.name == property.name) {
                    result.push(property);
                }
            }
        }
        result
    }

    /// Property lookup; static names are looked up on their residence class
    pub fn property(&self, qualified_name: &str, name: &PropertyName) -> Option<&PropertyDescriptor> {
        match &name.residence {
            Some(residence) => {
                let owner = self.lookup(residence)?;
                self.ancestry(&owner.qualified_name)
                    .into_iter()
                    .flat_map(|d| d.static_properties.iter())
                    .find(|p| p.name.name == name.name)
            }
            None => self
                .ancestry(qualified_name)
                .into_iter()
                .find_map(|d| d.own_property(&name.name)),
        }
    }

    /// Default property name, inherited
    pub fn default_property(&self, qualified_name: &str) -> Option<&str> {
        self.ancestry(qualified_name)
            .into_iter()
            .find_map(|d| d.default_property.as_deref())
    }

    /// Whether `qualified_name` is `ancestor` or derives from it
    pub fn is_subclass_of(&self, qualified_name: &str, ancestor: &str) -> bool {
        self.ancestry(qualified_name)
            .iter()
            .any(|d| d.qualified_name == ancestor)
    }

    /// Qualified names of all registered components, sorted
    pub fn component_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
