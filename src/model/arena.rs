//! Arena storage and traversal for corpus objects.

use super::object::{ArgValue, ObjectData, ObjectId, ObjectKind};
use super::object_type::ObjectType;

/// Arena storage for all objects in a corpus - single source of truth.
///
/// Ids are handed out monotonically and never reused, so a stale id can
/// only ever observe the object it was created for.
#[derive(Debug, Default)]
pub struct ObjectArena {
    objects: Vec<ObjectData>,
}

/// Whether a walk step fires before or after the object's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent {
    Pre,
    Post,
}

/// One step of a document walk, carrying the object's path inside the
/// document.
#[derive(Debug, Clone)]
pub struct WalkStep {
    pub object: ObjectId,
    pub path: String,
    pub event: WalkEvent,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new object with the next id.
    pub fn alloc(
        &mut self,
        object_type: ObjectType,
        name: Option<String>,
        kind: ObjectKind,
    ) -> ObjectId {
        let id = ObjectId::new(self.objects.len());
        self.objects.push(ObjectData {
            id,
            object_type,
            name,
            in_document: None,
            declared_path: None,
            kind,
        });
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectData> {
        self.objects.get(id.index())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectData> {
        self.objects.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Direct children of an object paired with the path connector that
    /// sits between the parent path and the child segment.
    pub fn children_of(&self, id: ObjectId) -> Vec<(Option<&'static str>, ObjectId)> {
        let Some(object) = self.get(id) else {
            return Vec::new();
        };

        let mut children = Vec::new();
        match &object.kind {
            ObjectKind::Entity(entity) => {
                children.extend(entity.extends_entity.map(|c| (None, c)));
                children.extend(entity.exhibits_traits.iter().map(|&c| (None, c)));
                children.extend(
                    entity
                        .attributes
                        .iter()
                        .map(|&c| (Some("hasAttributes"), c)),
                );
                children.extend(
                    entity
                        .attribute_context
                        .map(|c| (Some("attributeContext"), c)),
                );
            }
            ObjectKind::Trait(trait_def) => {
                children.extend(trait_def.extends_trait.map(|c| (None, c)));
                children.extend(
                    trait_def
                        .parameters
                        .iter()
                        .map(|&c| (Some("hasParameters"), c)),
                );
            }
            ObjectKind::Extensible(extensible) => {
                children.extend(extensible.extends.map(|c| (None, c)));
                children.extend(extensible.exhibits_traits.iter().map(|&c| (None, c)));
            }
            ObjectKind::Parameter(parameter) => {
                children.extend(parameter.data_type.map(|c| (None, c)));
                if let Some(ArgValue::Object(value)) = &parameter.default_value {
                    children.push((None, *value));
                }
            }
            ObjectKind::TypeAttribute(attribute) => {
                children.extend(attribute.data_type.map(|c| (None, c)));
                children.extend(attribute.purpose.map(|c| (None, c)));
                children.extend(attribute.applied_traits.iter().map(|&c| (None, c)));
            }
            ObjectKind::EntityAttribute(attribute) => {
                children.extend(attribute.entity.map(|c| (None, c)));
                children.extend(attribute.purpose.map(|c| (None, c)));
                children.extend(attribute.applied_traits.iter().map(|&c| (None, c)));
            }
            ObjectKind::AttributeGroup(group) => {
                children.extend(group.exhibits_traits.iter().map(|&c| (None, c)));
                children.extend(group.members.iter().map(|&c| (Some("members"), c)));
            }
            ObjectKind::ConstantEntity(constant) => {
                children.extend(constant.entity_shape.map(|c| (None, c)));
            }
            ObjectKind::AttributeContext(context) => {
                children.extend(context.definition.map(|c| (None, c)));
                children.extend(context.exhibits_traits.iter().map(|&c| (None, c)));
                children.extend(context.contents.iter().map(|&c| (None, c)));
            }
            ObjectKind::Manifest(manifest) => {
                children.extend(manifest.entities.iter().map(|&c| (None, c)));
                children.extend(manifest.sub_manifests.iter().map(|&c| (None, c)));
            }
            ObjectKind::Reference(reference) => {
                children.extend(reference.explicit_reference.map(|c| (None, c)));
                children.extend(reference.arguments.iter().map(|&c| (Some("arguments"), c)));
                children.extend(reference.applied_traits.iter().map(|&c| (None, c)));
            }
            ObjectKind::Argument(argument) => {
                if let Some(ArgValue::Object(value)) = &argument.value {
                    children.push((None, *value));
                }
            }
            ObjectKind::EntityDeclaration(_) | ObjectKind::ManifestDeclaration(_) => {}
        }
        children
    }

    /// Depth-first walk over `roots`, producing pre and post steps with
    /// the slash-joined path of each object.
    ///
    /// Passes iterate the returned snapshot and mutate arena entries
    /// directly, which keeps traversal free of borrow conflicts.
    pub fn walk(&self, roots: &[ObjectId]) -> Vec<WalkStep> {
        let mut steps = Vec::new();
        for &root in roots {
            self.walk_into(root, "", None, &mut steps);
        }
        steps
    }

    fn walk_into(
        &self,
        id: ObjectId,
        parent_path: &str,
        connector: Option<&str>,
        steps: &mut Vec<WalkStep>,
    ) {
        let Some(object) = self.get(id) else {
            return;
        };

        let segment = object.name().unwrap_or("(unspecified)");
        let path = match (parent_path.is_empty(), connector) {
            (true, _) => segment.to_string(),
            (false, None) => format!("{parent_path}/{segment}"),
            (false, Some(connector)) => format!("{parent_path}/{connector}/{segment}"),
        };

        steps.push(WalkStep {
            object: id,
            path: path.clone(),
            event: WalkEvent::Pre,
        });

        for (child_connector, child) in self.children_of(id) {
            self.walk_into(child, &path, child_connector, steps);
        }

        steps.push(WalkStep {
            object: id,
            path,
            event: WalkEvent::Post,
        });
    }
}
