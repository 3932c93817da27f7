//! Object walker and collectors
//!
//! Pre-order traversal over objects. Collectors are lazy and restartable:
//! each call starts a fresh walk over the current tree.

use crate::{FxomDocument, ObjectId, ObjectKind};

/// Pre-order object iterator
#[derive(Debug, Clone)]
pub struct ObjectWalker<'a> {
    document: &'a FxomDocument,
    stack: Vec<ObjectId>,
}

impl<'a> ObjectWalker<'a> {
    fn new(document: &'a FxomDocument, start: Option<ObjectId>) -> Self {
        Self {
            document,
            stack: start.into_iter().collect(),
        }
    }
}

impl Iterator for ObjectWalker<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Some(node) = self.document.object(id) {
            // Push in reverse so the first child is visited first
            for property in node.properties().iter().rev() {
                if let Some(property) = self.document.property(*property) {
                    self.stack.extend(property.values().iter().rev());
                }
            }
        }
        Some(id)
    }
}

impl FxomDocument {
    /// Walk the attached tree from the root
    pub fn walk(&self) -> ObjectWalker<'_> {
        ObjectWalker::new(self, self.root)
    }

    /// Walk the subtree of any object, attached or not
    pub fn walk_from(&self, start: ObjectId) -> ObjectWalker<'_> {
        ObjectWalker::new(self, Some(start))
    }

    /// `fx:script` objects
    pub fn scripts(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.walk()
            .filter(move |id| matches!(self.object(*id).map(|o| &o.kind), Some(ObjectKind::Script(_))))
    }

    /// Comment objects
    pub fn comments(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.walk()
            .filter(move |id| self.object(*id).is_some_and(|o| o.is_comment()))
    }

    /// Component instances
    pub fn instances(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.walk()
            .filter(move |id| self.object(*id).is_some_and(|o| o.is_instance()))
    }

    /// Intrinsic objects (`fx:include`, `fx:reference`, `fx:copy`, `fx:define`)
    pub fn intrinsics(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.walk()
            .filter(move |id| matches!(self.object(*id).map(|o| &o.kind), Some(ObjectKind::Intrinsic(_))))
    }

    /// Number of attached objects
    pub fn object_count(&self) -> usize {
        self.walk().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoadContext;

    const SOURCE: &str = r#"<VBox>
    <children>
        <Label text="a"/>
        <!-- note -->
        <fx:script>run()</fx:script>
        <HBox>
            <children>
                <Button/>
            </children>
        </HBox>
    </children>
</VBox>"#;

    #[test]
    fn test_walk_is_preorder() {
        let doc = FxomDocument::parse(SOURCE, &LoadContext::default()).unwrap();
        let labels: Vec<String> = doc
            .walk()
            .map(|id| doc.object(id).unwrap().label())
            .collect();
        assert_eq!(labels, ["VBox", "Label", "comment", "fx:script", "HBox", "Button"]);
    }

    #[test]
    fn test_collectors_are_restartable() {
        let doc = FxomDocument::parse(SOURCE, &LoadContext::default()).unwrap();
        assert_eq!(doc.scripts().count(), 1);
        assert_eq!(doc.scripts().count(), 1);
        assert_eq!(doc.comments().count(), 1);
        assert_eq!(doc.instances().count(), 4);
        assert_eq!(doc.object_count(), 6);
    }
}
