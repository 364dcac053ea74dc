//! Serialization tree: groups dotted property names (`address.city`) under
//! synthetic intermediate nodes so they resolve as nested objects.

use tracing::warn;

use crate::property::{Property, PropertySet};

/// Node of the serialization tree built from a property set.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializationNode<'a> {
    /// A single property, named by its last path segment.
    Leaf { name: String, property: &'a Property },
    /// A synthetic path segment holding nested nodes.
    Group {
        name: String,
        children: Vec<SerializationNode<'a>>,
    },
}

impl<'a> SerializationNode<'a> {
    pub fn name(&self) -> &str {
        match self {
            SerializationNode::Leaf { name, .. } | SerializationNode::Group { name, .. } => name,
        }
    }
}

/// Build the ordered root nodes for a property set.
///
/// Groups appear at the first occurrence of their segment; leaves keep the
/// property order. When a plain property and a dotted path share a segment
/// the group takes that position and the plain property is dropped.
pub fn build_tree(set: &PropertySet) -> Vec<SerializationNode<'_>> {
    let mut roots = Vec::new();
    for property in set {
        // Property sets reject names without a non-empty segment.
        let segments: Vec<&str> = property
            .name()
            .split('.')
            .filter(|s| !s.is_empty())
            .collect();
        insert(&mut roots, &segments, property);
    }
    roots
}

fn insert<'a>(nodes: &mut Vec<SerializationNode<'a>>, segments: &[&str], property: &'a Property) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let position = nodes.iter().position(|n| n.name() == *head);

    if rest.is_empty() {
        // Group wins over a plain property of the same name.
        match position {
            None => nodes.push(SerializationNode::Leaf {
                name: (*head).to_string(),
                property,
            }),
            Some(_) => warn!(
                property = property.name(),
                "property shadowed by a nested path of the same name"
            ),
        }
        return;
    }

    let index = match position {
        Some(i) => {
            if let SerializationNode::Leaf { property: shadowed, .. } = &nodes[i] {
                warn!(
                    property = shadowed.name(),
                    "property shadowed by a nested path of the same name"
                );
                nodes[i] = SerializationNode::Group {
                    name: (*head).to_string(),
                    children: Vec::new(),
                };
            }
            i
        }
        None => {
            nodes.push(SerializationNode::Group {
                name: (*head).to_string(),
                children: Vec::new(),
            });
            nodes.len() - 1
        }
    };

    if let SerializationNode::Group { children, .. } = &mut nodes[index] {
        insert(children, rest, property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;

    fn make_set(names: &[&str]) -> PropertySet {
        PropertySet::new(
            names
                .iter()
                .map(|n| Property::new(*n, TypeDescriptor::string()))
                .collect(),
        )
        .unwrap()
    }

    fn shape(nodes: &[SerializationNode<'_>]) -> String {
        nodes
            .iter()
            .map(|n| match n {
                SerializationNode::Leaf { name, .. } => name.clone(),
                SerializationNode::Group { name, children } => {
                    format!("{}({})", name, shape(children))
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn flat_properties_are_leaves() {
        let set = make_set(&["id", "name"]);
        assert_eq!(shape(&build_tree(&set)), "id,name");
    }

    #[test]
    fn dotted_paths_group_by_first_occurrence() {
        let set = make_set(&["n1.v1", "n2.v1", "n1.v2"]);
        assert_eq!(shape(&build_tree(&set)), "n1(v1,v2),n2(v1)");
    }

    #[test]
    fn deep_paths_nest() {
        let set = make_set(&["a.b.c", "a.d", "e"]);
        assert_eq!(shape(&build_tree(&set)), "a(b(c),d),e");
    }

    #[test]
    fn leaf_keeps_full_property() {
        let set = make_set(&["address.city"]);
        let tree = build_tree(&set);
        let SerializationNode::Group { children, .. } = &tree[0] else {
            panic!("expected group");
        };
        let SerializationNode::Leaf { name, property } = &children[0] else {
            panic!("expected leaf");
        };
        assert_eq!(name, "city");
        assert_eq!(property.name(), "address.city");
    }

    #[test]
    fn group_replaces_plain_property_in_place() {
        let set = make_set(&["a", "b", "a.x"]);
        assert_eq!(shape(&build_tree(&set)), "a(x),b");

        let set = make_set(&["a.x", "a"]);
        assert_eq!(shape(&build_tree(&set)), "a(x)");
    }

    #[test]
    fn deterministic() {
        let set = make_set(&["x.y", "z", "x.w"]);
        assert_eq!(build_tree(&set), build_tree(&set));
    }
}
