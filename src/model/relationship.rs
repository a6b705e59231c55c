//! End-to-end entity relationships.

/// A foreign-key relationship mined from a resolved entity's
/// attribute-context tree: `from_entity.from_entity_attribute` points at
/// `to_entity.to_entity_attribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E2ERelationship {
    pub from_entity: String,
    pub from_entity_attribute: String,
    pub to_entity: String,
    pub to_entity_attribute: String,
}
