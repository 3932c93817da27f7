//! FXOM objects

use fxkit_glue::{AttributeMap, GlueNode};

use crate::{FxomDocument, NodeFormat, PropertyId};

/// Component instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Type as written in the markup (tag name, or `type` of `fx:root`)
    pub type_name: String,
    /// Registered qualified name, `None` when the type could not be resolved
    pub qualified_name: Option<String>,
    /// Written as `<fx:root type="...">`
    pub fx_root: bool,
    pub controller: Option<String>,
    pub fx_value: Option<String>,
    pub fx_constant: Option<String>,
    pub fx_factory: Option<String>,
}

impl Instance {
    pub fn new(type_name: impl Into<String>, qualified_name: Option<String>) -> Self {
        Self {
            type_name: type_name.into(),
            qualified_name,
            fx_root: false,
            controller: None,
            fx_value: None,
            fx_constant: None,
            fx_factory: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.qualified_name.is_some()
    }
}

/// Reserved non-instance element
#[derive(Debug, Clone)]
pub enum Intrinsic {
    /// `fx:include`; the loaded document is embedded but saved as a marker
    Include {
        source: String,
        charset: Option<String>,
        resources: Option<String>,
        included: Option<Box<FxomDocument>>,
        /// Why the source could not be loaded
        failure: Option<String>,
    },
    /// `fx:reference source="id"`
    Reference { source: String },
    /// `fx:copy source="id"`
    Copy { source: String },
    /// `fx:define`; content lives in an implicit property
    Define,
}

impl Intrinsic {
    pub fn include(source: impl Into<String>) -> Self {
        Self::Include {
            source: source.into(),
            charset: None,
            resources: None,
            included: None,
            failure: None,
        }
    }

    pub fn reference(source: impl Into<String>) -> Self {
        Self::Reference {
            source: source.into(),
        }
    }

    pub fn copy(source: impl Into<String>) -> Self {
        Self::Copy {
            source: source.into(),
        }
    }

    /// Tag name, `fx:` prefix included
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Include { .. } => "fx:include",
            Self::Reference { .. } => "fx:reference",
            Self::Copy { .. } => "fx:copy",
            Self::Define => "fx:define",
        }
    }

    /// Referenced fx:id of a reference or copy
    pub fn reference_source(&self) -> Option<&str> {
        match self {
            Self::Reference { source } | Self::Copy { source } => Some(source),
            _ => None,
        }
    }
}

/// `fx:script`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Inline body
    pub body: String,
    /// External script location
    pub source: Option<String>,
    pub charset: Option<String>,
    /// Inline body written as CDATA
    pub cdata: bool,
    /// Content of the external source, when it could be read
    pub loaded: Option<String>,
}

impl Script {
    pub fn inline(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            source: None,
            charset: None,
            cdata: false,
            loaded: None,
        }
    }

    /// Effective script text
    pub fn text(&self) -> &str {
        self.loaded.as_deref().unwrap_or(&self.body)
    }
}

/// Comment kept as an item of property content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    /// Whether `text` can be written as an XML comment
    pub fn accepts(text: &str) -> bool {
        GlueNode::is_valid_comment(text)
    }
}

/// Object variants
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Instance(Instance),
    Intrinsic(Intrinsic),
    Script(Script),
    Comment(Comment),
}

/// FXOM object node
#[derive(Debug, Clone)]
pub struct ObjectNode {
    /// Owning property; `None` for the root and for detached objects
    pub(crate) parent: Option<PropertyId>,
    pub(crate) fx_id: Option<String>,
    /// Properties of instances, content of `fx:define`
    pub(crate) properties: Vec<PropertyId>,
    /// Attributes with no semantic meaning here (namespaces, unknown `fx:`)
    pub(crate) attributes: AttributeMap,
    pub(crate) format: NodeFormat,
    pub(crate) kind: ObjectKind,
}

impl ObjectNode {
    pub(crate) fn new(kind: ObjectKind) -> Self {
        Self {
            parent: None,
            fx_id: None,
            properties: Vec::new(),
            attributes: AttributeMap::new(),
            format: NodeFormat::default(),
            kind,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<PropertyId> {
        self.parent
    }

    #[inline]
    pub fn fx_id(&self) -> Option<&str> {
        self.fx_id.as_deref()
    }

    #[inline]
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn format(&self) -> &NodeFormat {
        &self.format
    }

    #[inline]
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match &self.kind {
            ObjectKind::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_intrinsic(&self) -> Option<&Intrinsic> {
        match &self.kind {
            ObjectKind::Intrinsic(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_script(&self) -> Option<&Script> {
        match &self.kind {
            ObjectKind::Script(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match &self.kind {
            ObjectKind::Comment(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.kind, ObjectKind::Instance(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, ObjectKind::Comment(_))
    }

    /// Whether this object can own properties
    pub fn has_properties(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Instance(_) | ObjectKind::Intrinsic(Intrinsic::Define)
        )
    }

    /// Short label for logs and history descriptions
    pub fn label(&self) -> String {
        let base = match &self.kind {
            ObjectKind::Instance(i) => i.type_name.clone(),
            ObjectKind::Intrinsic(i) => i.tag().to_string(),
            ObjectKind::Script(_) => "fx:script".to_string(),
            ObjectKind::Comment(_) => "comment".to_string(),
        };
        match &self.fx_id {
            Some(id) => format!("{base} ({id})"),
            None => base,
        }
    }
}
