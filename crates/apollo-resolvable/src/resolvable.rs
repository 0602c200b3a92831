//! The bound, immutable description of how to resolve each field of a schema.
//!
//! A [`DispatchTree`] is an arena of [`Resolvable`] nodes addressed by [`ExecId`].
//! Nodes refer to their children by id, so a recursive schema type bound twice
//! to the same resolver shape reuses one node instead of building an infinite tree:
//! the same id appears both as an ancestor and as a descendant.

use crate::packer::StructPacker;
use crate::shape::ShapeId;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::Name;
use apollo_compiler::Node;
use indexmap::IndexMap;
use std::ops::Index;
use triomphe::Arc;

/// Index of a node in a [`DispatchTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecId(pub(crate) usize);

/// Bound nodes, every one of them fully built
#[derive(Debug, Clone)]
pub struct DispatchTree {
    pub(crate) nodes: Vec<Resolvable>,
}

/// How to produce the result of a GraphQL type from a resolver value
#[derive(Debug, Clone)]
pub enum Resolvable {
    /// Object, interface, or union type
    Object(Object),
    /// List type, with the node for its items
    List(List),
    /// Scalar or enum type: the resolver value is the result
    Scalar,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: Name,
    /// Keyed by field name
    pub fields: IndexMap<Name, Field>,
    /// Keyed by concrete object type name. Empty for object types.
    pub type_assertions: IndexMap<Name, TypeAssertion>,
}

#[derive(Debug, Clone)]
pub struct List {
    pub elem: ExecId,
}

/// Which member of the resolver value provides a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Index in the [method set][crate::shape::Shapes::method_set] of the resolver shape
    Method(usize),
    /// Data member path, as returned by [`Shapes::find_field`][crate::shape::Shapes::find_field]
    Field(Vec<usize>),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub definition: Node<FieldDefinition>,
    /// Name of the object, interface, or union type declaring this field
    pub type_name: Name,
    pub dispatch: Dispatch,
    /// Shape of the resolver value the dispatch target is looked up on
    pub resolver_shape: ShapeId,
    /// The method expects the request context as its first parameter
    pub has_context: bool,
    /// The method returns an error as its second result
    pub has_error: bool,
    pub args_packer: Option<Arc<StructPacker>>,
    /// Only for directives that intercept field resolution, keyed by directive name
    pub directive_packers: IndexMap<Name, Arc<StructPacker>>,
    pub value_exec: ExecId,
    pub trace_label: String,
}

/// Conversion from an interface or union resolver value to one concrete object type
#[derive(Debug, Clone)]
pub struct TypeAssertion {
    /// Index in the method set of the polymorphic resolver shape.
    /// The method returns the concrete value and a success flag.
    pub method_index: usize,
    pub type_exec: ExecId,
}

impl DispatchTree {
    pub fn get(&self, id: ExecId) -> Option<&Resolvable> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExecId, &Resolvable)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (ExecId(index), node))
    }

    /// Returns the node if it is an object node
    pub fn object(&self, id: ExecId) -> Option<&Object> {
        match self.get(id)? {
            Resolvable::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl Index<ExecId> for DispatchTree {
    type Output = Resolvable;

    fn index(&self, id: ExecId) -> &Resolvable {
        &self.nodes[id.0]
    }
}

impl Resolvable {
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Resolvable::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Resolvable::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Resolvable::Scalar)
    }
}

impl Field {
    /// Whether the field is provided by a method rather than a data member
    pub fn uses_method_resolver(&self) -> bool {
        matches!(self.dispatch, Dispatch::Method(_))
    }
}
