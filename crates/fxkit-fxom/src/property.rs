//! FXOM properties

use fxkit_metadata::PropertyName;

use crate::{NodeFormat, ObjectId};

/// How a text property is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextForm {
    /// `text="..."`
    Attribute,
    /// `<text>...</text>`
    Element,
}

/// Property variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// Single text or expression value
    Text { value: String, form: TextForm },
    /// Ordered object values
    Complex {
        values: Vec<ObjectId>,
        /// Values written inline in the owner element (default property)
        implicit: bool,
    },
}

/// FXOM property node
#[derive(Debug, Clone)]
pub struct PropertyNode {
    pub(crate) owner: Option<ObjectId>,
    pub(crate) name: PropertyName,
    pub(crate) format: NodeFormat,
    pub(crate) kind: PropertyKind,
}

impl PropertyNode {
    pub(crate) fn new(name: PropertyName, kind: PropertyKind) -> Self {
        Self {
            owner: None,
            name,
            format: NodeFormat::default(),
            kind,
        }
    }

    #[inline]
    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }

    #[inline]
    pub fn name(&self) -> &PropertyName {
        &self.name
    }

    pub fn format(&self) -> &NodeFormat {
        &self.format
    }

    #[inline]
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Text value of a text property
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Text { value, .. } => Some(value),
            PropertyKind::Complex { .. } => None,
        }
    }

    /// Values of a complex property (empty for text properties)
    pub fn values(&self) -> &[ObjectId] {
        match &self.kind {
            PropertyKind::Complex { values, .. } => values,
            PropertyKind::Text { .. } => &[],
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, PropertyKind::Complex { .. })
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self.kind, PropertyKind::Complex { implicit: true, .. })
    }
}
