//! Reference sites
//!
//! `fx:reference` / `fx:copy` intrinsics and `$id` property values name
//! their target by fx:id. They are resolved on demand through the index, so
//! a removed target shows up as a miss rather than a stale link.

use crate::{FxomDocument, ObjectId, PrefixedValue, PropertyId};

/// A place in the tree that refers to an fx:id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSite {
    /// `fx:reference` or `fx:copy`
    Intrinsic(ObjectId),
    /// Text property holding `$id`
    Expression(PropertyId),
}

impl FxomDocument {
    /// All reference sites of the attached tree, in document order
    pub fn references(&self) -> impl Iterator<Item = ReferenceSite> + '_ {
        self.walk().flat_map(move |id| self.sites_of(id))
    }

    fn sites_of(&self, id: ObjectId) -> Vec<ReferenceSite> {
        let Some(object) = self.object(id) else {
            return Vec::new();
        };
        let mut sites = Vec::new();
        if object.as_intrinsic().and_then(|i| i.reference_source()).is_some() {
            sites.push(ReferenceSite::Intrinsic(id));
        }
        for property in object.properties().iter().copied() {
            let is_reference = self
                .property(property)
                .and_then(|p| p.text())
                .is_some_and(|v| matches!(PrefixedValue::classify(v), PrefixedValue::Reference(_)));
            if is_reference {
                sites.push(ReferenceSite::Expression(property));
            }
        }
        sites
    }

    /// fx:id named by a site
    pub fn reference_source(&self, site: ReferenceSite) -> Option<&str> {
        match site {
            ReferenceSite::Intrinsic(id) => self.object(id)?.as_intrinsic()?.reference_source(),
            ReferenceSite::Expression(property) => {
                match PrefixedValue::classify(self.property(property)?.text()?) {
                    PrefixedValue::Reference(source) => Some(source),
                    _ => None,
                }
            }
        }
    }

    /// Object currently holding the fx:id `source`; `None` on a miss
    pub fn resolve_reference(&self, source: &str) -> Option<ObjectId> {
        self.lookup(source)
    }

    /// Target of a site, looked up now
    pub fn resolve_site(&self, site: ReferenceSite) -> Option<ObjectId> {
        self.resolve_reference(self.reference_source(site)?)
    }

    /// Object carrying the site
    pub fn site_object(&self, site: ReferenceSite) -> Option<ObjectId> {
        match site {
            ReferenceSite::Intrinsic(id) => Some(id),
            ReferenceSite::Expression(property) => self.property(property)?.owner(),
        }
    }

    /// Sites naming `fx_id`
    pub fn references_to(&self, fx_id: &str) -> Vec<ReferenceSite> {
        self.references()
            .filter(|site| self.reference_source(*site) == Some(fx_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoadContext;

    #[test]
    fn test_missing_reference_is_a_miss() {
        let doc = FxomDocument::parse(
            r#"<VBox><children><fx:reference source="myRef"/></children></VBox>"#,
            &LoadContext::default(),
        )
        .unwrap();
        let sites: Vec<_> = doc.references().collect();
        assert_eq!(sites.len(), 1);
        assert_eq!(doc.reference_source(sites[0]), Some("myRef"));
        assert_eq!(doc.resolve_site(sites[0]), None);
    }

    #[test]
    fn test_expression_sites() {
        let doc = FxomDocument::parse(
            r#"<VBox><Label fx:id="name" text="Name"/><TextField promptText="$name"/><fx:copy source="name"/></VBox>"#,
            &LoadContext::default(),
        )
        .unwrap();
        let label = doc.lookup("name").unwrap();
        let sites = doc.references_to("name");
        assert_eq!(sites.len(), 2);
        assert!(matches!(sites[0], ReferenceSite::Expression(_)));
        assert!(sites.iter().all(|s| doc.resolve_site(*s) == Some(label)));
    }
}
