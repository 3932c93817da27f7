//! Component and property descriptors

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{FormatVersion, MetadataError};

/// Property name, optionally qualified by the class that defines it as a
/// static property (`GridPane.rowIndex`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyName {
    pub residence: Option<String>,
    pub name: String,
}

impl PropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            residence: None,
            name: name.into(),
        }
    }

    /// Static property owned by `residence`
    pub fn with_residence(residence: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            residence: Some(residence.into()),
            name: name.into(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.residence.is_some()
    }

    /// Whether this name matches `other` ignoring how the residence is spelled
    /// (simple vs. qualified class name)
    pub fn matches(&self, other: &PropertyName) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.residence, &other.residence) {
            (None, None) => true,
            (Some(a), Some(b)) => simple_name(a) == simple_name(b),
            _ => false,
        }
    }
}

impl FromStr for PropertyName {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.ends_with('.') {
            return Err(MetadataError::InvalidPropertyName(s.to_string()));
        }
        match s.rsplit_once('.') {
            Some((residence, name)) => Ok(Self::with_residence(residence, name)),
            None => Ok(Self::new(s)),
        }
    }
}

impl TryFrom<String> for PropertyName {
    type Error = MetadataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PropertyName> for String {
    fn from(value: PropertyName) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.residence {
            Some(residence) => write!(f, "{}.{}", residence, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Last segment of a dotted class name
pub(crate) fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// What a property holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Boolean,
    Integer,
    Double,
    Enum { values: Vec<String> },
    /// Component-valued (single object or collection of objects)
    Component { collection: bool },
    /// Document-relative locations (images, stylesheets)
    Url { collection: bool },
}

impl ValueKind {
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::Component { collection: true } | Self::Url { collection: true }
        )
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component { .. })
    }
}

/// Property metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: PropertyName,
    pub value: ValueKind,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub since: FormatVersion,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, value: ValueKind) -> Self {
        Self {
            name: PropertyName::new(name),
            value,
            default_value: None,
            read_only: false,
            since: FormatVersion::initial(),
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn since(mut self, version: &str) -> Self {
        if let Ok(v) = version.parse() {
            self.since = v;
        }
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Whether `value` equals the declared default
    pub fn is_default(&self, value: &str) -> bool {
        self.default_value.as_deref() == Some(value)
    }
}

/// Constructible component metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub qualified_name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    /// Static properties this class defines for its children
    #[serde(default)]
    pub static_properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    pub default_property: Option<String>,
    #[serde(default)]
    pub since: FormatVersion,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

impl ComponentDescriptor {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            superclass: None,
            properties: Vec::new(),
            static_properties: Vec::new(),
            default_property: None,
            since: FormatVersion::initial(),
            is_abstract: false,
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Static property, named `<SimpleName>.<name>`
    pub fn static_property(mut self, mut property: PropertyDescriptor) -> Self {
        property.name = PropertyName::with_residence(self.simple_name(), property.name.name);
        self.static_properties.push(property);
        self
    }

    pub fn default_property(mut self, name: impl Into<String>) -> Self {
        self.default_property = Some(name.into());
        self
    }

    pub fn since(mut self, version: &str) -> Self {
        if let Ok(v) = version.parse() {
            self.since = v;
        }
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.qualified_name)
    }

    /// Package part of the qualified name
    pub fn package(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }

    /// Own (non-inherited) property lookup
    pub fn own_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name.name == name)
    }
}
