//! Type resolution context
//!
//! Resolves element tag names to qualified component names using the
//! document's `<?import?>` instructions, then the registry itself.

use crate::descriptor::simple_name;
use crate::MetadataRegistry;

/// One `<?import?>` instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `<?import javafx.scene.control.Button?>`
    Class(String),
    /// `<?import javafx.scene.control.*?>`
    Package(String),
}

impl Import {
    /// Parse the data part of an import instruction
    pub fn parse(data: &str) -> Option<Self> {
        let data = data.trim();
        if data.is_empty() {
            return None;
        }
        match data.strip_suffix(".*") {
            Some(package) if !package.is_empty() => Some(Self::Package(package.to_string())),
            Some(_) => None,
            None => Some(Self::Class(data.to_string())),
        }
    }

    /// Instruction data for this import
    pub fn to_instruction_data(&self) -> String {
        match self {
            Self::Class(c) => c.clone(),
            Self::Package(p) => format!("{p}.*"),
        }
    }

    /// Whether this import makes `qualified` visible by its simple name
    pub fn covers(&self, qualified: &str) -> bool {
        match self {
            Self::Class(c) => c == qualified,
            Self::Package(p) => qualified
                .rsplit_once('.')
                .is_some_and(|(package, _)| package == p),
        }
    }
}

/// Tag-name resolution context of one document
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    imports: Vec<Import>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the data of `import` instructions
    pub fn from_instructions<'a>(instructions: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            imports: instructions.into_iter().filter_map(Import::parse).collect(),
        }
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn add_import(&mut self, import: Import) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Whether a qualified name can be written by its simple name
    pub fn is_imported(&self, qualified: &str) -> bool {
        self.imports.iter().any(|i| i.covers(qualified))
    }

    /// Resolve a tag name to a registered qualified name
    pub fn resolve(&self, registry: &MetadataRegistry, tag: &str) -> Option<String> {
        // Fully qualified tag
        if tag.contains('.') {
            return registry.resolve(tag).map(|d| d.qualified_name.clone());
        }

        for import in &self.imports {
            let candidate = match import {
                Import::Class(c) if simple_name(c) == tag => c.clone(),
                Import::Package(p) => format!("{p}.{tag}"),
                Import::Class(_) => continue,
            };
            if registry.resolve(&candidate).is_some() {
                return Some(candidate);
            }
        }

        registry
            .resolve_simple(tag)
            .map(|d| d.qualified_name.clone())
    }

    /// Name to write in a tag for `qualified`: the simple name when the
    /// simple name resolves back to the same class, else the qualified name
    pub fn tag_for(&self, registry: &MetadataRegistry, qualified: &str) -> String {
        let simple = simple_name(qualified);
        match self.resolve(registry, simple) {
            Some(resolved) if resolved == qualified => simple.to_string(),
            None if self.is_imported(qualified) => simple.to_string(),
            _ => qualified.to_string(),
        }
    }
}
