//! Structural description of resolver types
//!
//! Resolvers are ordinary Rust values, but binding needs to answer structural questions
//! about them ahead of execution: which methods a type exposes, which data members it carries
//! (including inside embedded members), and whether it is a pointer, an interface,
//! a sequence, or a stream.
//!
//! [`Shapes`] is a registry of such descriptions, filled once by the application
//! before calling [`Binder::bind`][crate::Binder::bind].
//! Each description is addressed by a [`ShapeId`].
//! Types that refer to themselves are described by declaring a shape first,
//! then attaching members that mention its id:
//!
//! ```
//! use apollo_resolvable::shape::Method;
//! use apollo_resolvable::shape::ShapeId;
//! use apollo_resolvable::shape::Shapes;
//!
//! let mut shapes = Shapes::new();
//! let human = shapes.declare_struct("Human");
//! let human_ref = shapes.pointer_to(human);
//! let friends = shapes.slice_of(human_ref);
//! shapes.add_method(human, Method::new("name").returns([ShapeId::STRING]));
//! shapes.add_method(human, Method::new("friends").returns([friends]));
//! assert_eq!(shapes.name(friends), "[&Human]");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifies a [`Shape`] within its [`Shapes`] registry
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u32);

impl ShapeId {
    pub const BOOL: Self = Self(0);
    pub const INT32: Self = Self(1);
    pub const INT64: Self = Self(2);
    pub const FLOAT32: Self = Self(3);
    pub const FLOAT64: Self = Self(4);
    pub const STRING: Self = Self(5);
    /// The request context capability, recognized as an optional first method parameter
    pub const CONTEXT: Self = Self(6);
    /// The error capability, recognized as an optional second method result
    pub const ERROR: Self = Self(7);
    /// A string-backed value implementing the built-in `ID` scalar
    pub const ID: Self = Self(8);

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeId({})", self.0)
    }
}

/// The structural category of a shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    /// A named value type that may carry data members and methods
    Struct,
    /// A named dynamic-dispatch type: only its declared methods are known
    Interface,
    /// A nullable reference to a value of the given shape
    Pointer(ShapeId),
    /// A sequence of values of the given shape
    Slice(ShapeId),
    /// A stream of values of the given shape
    Chan(ShapeId),
}

/// Whether a method is callable on a value, or only through a pointer to it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receiver {
    Value,
    Pointer,
}

/// Calls a method: receives the receiver value and explicit arguments, returns the results.
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> Vec<Value> + Send + Sync>;

/// A callable member of a shape.
///
/// Parameters are explicit parameters only: the receiver is always implicit.
#[derive(Clone)]
pub struct Method {
    pub name: String,
    pub receiver: Receiver,
    pub params: Vec<ShapeId>,
    pub results: Vec<ShapeId>,
    invoker: Option<Invoker>,
}

/// A data member of a struct shape
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub shape: ShapeId,
    /// Members of an embedded struct are searched as if they were declared on the outer one
    pub embedded: bool,
}

/// Description of one resolver type
pub struct Shape {
    name: String,
    kind: Kind,
    methods: Vec<Method>,
    fields: Vec<StructField>,
    implements_scalar: Option<fn(&str) -> bool>,
}

/// Registry of resolver type descriptions.
///
/// Starts with the built-in shapes named by the associated constants of [`ShapeId`].
pub struct Shapes {
    shapes: Vec<Shape>,
}

/// An application value together with the shape describing it.
///
/// A value without payload is nil.
#[derive(Clone)]
pub struct Value {
    shape: ShapeId,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Method {
    /// A method with pointer receiver, no parameters, and no results
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receiver: Receiver::Pointer,
            params: Vec::new(),
            results: Vec::new(),
            invoker: None,
        }
    }

    /// Make this method callable on values, not only through pointers
    pub fn value_receiver(mut self) -> Self {
        self.receiver = Receiver::Value;
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ShapeId>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn returns(mut self, results: impl IntoIterator<Item = ShapeId>) -> Self {
        self.results.extend(results);
        self
    }

    pub fn invoker(
        mut self,
        invoker: impl Fn(&Value, &[Value]) -> Vec<Value> + Send + Sync + 'static,
    ) -> Self {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    /// Calls the method, or returns `None` if it was registered without an invoker
    pub fn invoke(&self, receiver: &Value, arguments: &[Value]) -> Option<Vec<Value>> {
        self.invoker
            .as_ref()
            .map(|invoker| invoker(receiver, arguments))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("params", &self.params)
            .field("results", &self.results)
            .field("invocable", &self.invoker.is_some())
            .finish()
    }
}

impl StructField {
    pub fn new(name: impl Into<String>, shape: ShapeId) -> Self {
        Self {
            name: name.into(),
            shape,
            embedded: false,
        }
    }

    pub fn embedded(name: impl Into<String>, shape: ShapeId) -> Self {
        Self {
            name: name.into(),
            shape,
            embedded: true,
        }
    }
}

impl Shape {
    /// Display name, used in error messages
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Every declared method, regardless of receiver
    pub fn declared_methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("methods", &self.methods)
            .field("fields", &self.fields)
            .field("implements_scalar", &self.implements_scalar.is_some())
            .finish()
    }
}

impl Default for Shapes {
    fn default() -> Self {
        Self::new()
    }
}

impl Shapes {
    pub fn new() -> Self {
        let mut shapes = Self { shapes: Vec::new() };
        let builtins = [
            (ShapeId::BOOL, "bool", Kind::Bool),
            (ShapeId::INT32, "i32", Kind::Int32),
            (ShapeId::INT64, "i64", Kind::Int64),
            (ShapeId::FLOAT32, "f32", Kind::Float32),
            (ShapeId::FLOAT64, "f64", Kind::Float64),
            (ShapeId::STRING, "String", Kind::String),
            (ShapeId::CONTEXT, "Context", Kind::Interface),
            (ShapeId::ERROR, "Error", Kind::Interface),
            (ShapeId::ID, "ID", Kind::Struct),
        ];
        for (expected, name, kind) in builtins {
            let id = shapes.push(name.to_owned(), kind);
            debug_assert_eq!(id, expected);
        }
        shapes.add_field(ShapeId::ID, StructField::new("value", ShapeId::STRING));
        shapes.implements_scalar(ShapeId::ID, |name| name == "ID");
        shapes
    }

    fn push(&mut self, name: String, kind: Kind) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(Shape {
            name,
            kind,
            methods: Vec::new(),
            fields: Vec::new(),
            implements_scalar: None,
        });
        id
    }

    fn find_or_push(&mut self, kind: Kind, name: impl FnOnce(&Self) -> String) -> ShapeId {
        if let Some(index) = self.shapes.iter().position(|shape| shape.kind == kind) {
            return ShapeId(index as u32);
        }
        let name = name(self);
        self.push(name, kind)
    }

    /// Declares a named value type. Members are added separately.
    pub fn declare_struct(&mut self, name: impl Into<String>) -> ShapeId {
        self.push(name.into(), Kind::Struct)
    }

    /// Declares a named interface type. Methods are added separately.
    pub fn declare_interface(&mut self, name: impl Into<String>) -> ShapeId {
        let name = format!("dyn {}", name.into());
        self.push(name, Kind::Interface)
    }

    /// Returns the pointer shape for `elem`, registering it on first use
    pub fn pointer_to(&mut self, elem: ShapeId) -> ShapeId {
        self.find_or_push(Kind::Pointer(elem), |shapes| {
            format!("&{}", shapes.name(elem))
        })
    }

    /// Returns the sequence shape for `elem`, registering it on first use
    pub fn slice_of(&mut self, elem: ShapeId) -> ShapeId {
        self.find_or_push(Kind::Slice(elem), |shapes| {
            format!("[{}]", shapes.name(elem))
        })
    }

    /// Returns the stream shape for `elem`, registering it on first use
    pub fn chan_of(&mut self, elem: ShapeId) -> ShapeId {
        self.find_or_push(Kind::Chan(elem), |shapes| {
            format!("Stream<{}>", shapes.name(elem))
        })
    }

    /// Attaches a method to a struct or interface shape
    ///
    /// # Panics
    ///
    /// If `shape` is neither a struct nor an interface.
    pub fn add_method(&mut self, shape: ShapeId, method: Method) -> &mut Self {
        let target = &mut self.shapes[shape.index()];
        assert!(
            matches!(target.kind, Kind::Struct | Kind::Interface),
            "methods can only be declared on struct or interface shapes, not {}",
            target.name
        );
        target.methods.push(method);
        self
    }

    /// Attaches a data member to a struct shape
    ///
    /// # Panics
    ///
    /// If `shape` is not a struct.
    pub fn add_field(&mut self, shape: ShapeId, field: StructField) -> &mut Self {
        let target = &mut self.shapes[shape.index()];
        assert!(
            target.kind == Kind::Struct,
            "data members can only be declared on struct shapes, not {}",
            target.name
        );
        target.fields.push(field);
        self
    }

    /// Declares which custom scalar names values of `shape` can stand for
    pub fn implements_scalar(&mut self, shape: ShapeId, implements: fn(&str) -> bool) -> &mut Self {
        self.shapes[shape.index()].implements_scalar = Some(implements);
        self
    }

    /// # Panics
    ///
    /// If `id` was not created by this registry.
    pub fn get(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()]
    }

    pub fn name(&self, id: ShapeId) -> &str {
        &self.get(id).name
    }

    pub fn kind(&self, id: ShapeId) -> Kind {
        self.get(id).kind
    }

    pub fn is_pointer(&self, id: ShapeId) -> bool {
        matches!(self.kind(id), Kind::Pointer(_))
    }

    pub fn is_interface(&self, id: ShapeId) -> bool {
        self.kind(id) == Kind::Interface
    }

    /// The pointee of a pointer shape, or `id` itself
    pub fn unwrap_ptr(&self, id: ShapeId) -> ShapeId {
        match self.kind(id) {
            Kind::Pointer(elem) => elem,
            _ => id,
        }
    }

    /// Methods callable on a value of this shape, in declaration order.
    ///
    /// A value type exposes its value-receiver methods,
    /// a pointer exposes every method of its pointee,
    /// an interface exposes its declared methods.
    pub fn method_set(&self, id: ShapeId) -> Vec<&Method> {
        let shape = self.get(id);
        match shape.kind {
            Kind::Interface => shape.methods.iter().collect(),
            Kind::Pointer(elem) if !self.is_interface(elem) => {
                self.get(elem).methods.iter().collect()
            }
            Kind::Pointer(_) => Vec::new(),
            _ => shape
                .methods
                .iter()
                .filter(|method| method.receiver == Receiver::Value)
                .collect(),
        }
    }

    /// The method at `index` in [`method_set`][Self::method_set]
    pub fn method(&self, id: ShapeId, index: usize) -> Option<&Method> {
        self.method_set(id).get(index).copied()
    }

    /// The first method whose name matches `name`, ignoring case and underscores,
    /// with its index in the method set
    pub fn find_method(&self, id: ShapeId, name: &str) -> Option<(usize, &Method)> {
        let wanted = normalize(name);
        self.method_set(id)
            .into_iter()
            .enumerate()
            .find(|(_, method)| normalize(&method.name) == wanted)
    }

    /// The method named exactly `name`, with its index in the method set
    pub fn find_method_exact(&self, id: ShapeId, name: &str) -> Option<(usize, &Method)> {
        self.method_set(id)
            .into_iter()
            .enumerate()
            .find(|(_, method)| method.name == name)
    }

    /// Whether a matching method would be found through a pointer to a value of this shape
    pub(crate) fn has_pointer_method(&self, id: ShapeId, name: &str) -> bool {
        if matches!(self.kind(id), Kind::Pointer(_) | Kind::Interface) {
            return false;
        }
        let wanted = normalize(name);
        self.get(id)
            .methods
            .iter()
            .any(|method| normalize(&method.name) == wanted)
    }

    /// Path of member indexes leading to the data member matching `name`,
    /// ignoring case and underscores.
    ///
    /// Members of embedded structs are searched before the name of the embedding member itself.
    pub fn find_field(&self, id: ShapeId, name: &str) -> Option<Vec<usize>> {
        self.find_normalized_field(id, &normalize(name))
    }

    fn find_normalized_field(&self, id: ShapeId, wanted: &str) -> Option<Vec<usize>> {
        for (index, field) in self.get(id).fields.iter().enumerate() {
            if field.embedded && self.kind(field.shape) == Kind::Struct {
                if let Some(mut path) = self.find_normalized_field(field.shape, wanted) {
                    path.insert(0, index);
                    return Some(path);
                }
            }
            if normalize(&field.name) == wanted {
                return Some(vec![index]);
            }
        }
        None
    }

    /// The data member at the end of a path returned by [`find_field`][Self::find_field]
    pub fn field_by_path(&self, id: ShapeId, path: &[usize]) -> Option<&StructField> {
        let (&last, init) = path.split_last()?;
        let mut current = id;
        for &index in init {
            current = self.get(current).fields.get(index)?.shape;
        }
        self.get(current).fields.get(last)
    }

    /// Number of data members per normalized name, counted across embedded structs.
    ///
    /// A count above one means the name is ambiguous.
    pub(crate) fn field_counts(&self, id: ShapeId) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        self.count_fields(id, &mut counts);
        counts
    }

    fn count_fields(&self, id: ShapeId, counts: &mut HashMap<String, usize>) {
        if self.kind(id) != Kind::Struct {
            return;
        }
        for field in &self.get(id).fields {
            if field.embedded && self.kind(field.shape) == Kind::Struct {
                self.count_fields(field.shape, counts)
            } else {
                *counts.entry(normalize(&field.name)).or_default() += 1
            }
        }
    }

    /// Whether values of this shape can stand for the scalar type named `scalar`.
    ///
    /// Built-in scalars each accept exactly one primitive:
    /// `Int` is `i32`, `Float` is `f64`, `String` is `String`, and `Boolean` is `bool`.
    /// Other shapes must declare the scalar through [`implements_scalar`][Self::implements_scalar].
    pub fn implements_graphql_type(&self, id: ShapeId, scalar: &str) -> bool {
        let shape = self.get(id);
        match shape.kind {
            Kind::Int32 => scalar == "Int",
            Kind::Float64 => scalar == "Float",
            Kind::String => scalar == "String",
            Kind::Bool => scalar == "Boolean",
            _ => shape
                .implements_scalar
                .is_some_and(|implements| implements(scalar)),
        }
    }
}

impl fmt::Debug for Shapes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.shapes).finish()
    }
}

impl Value {
    pub fn new<T: Any + Send + Sync>(shape: ShapeId, payload: T) -> Self {
        Self {
            shape,
            payload: Some(Arc::new(payload)),
        }
    }

    pub fn from_arc(shape: ShapeId, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            shape,
            payload: Some(payload),
        }
    }

    pub fn nil(shape: ShapeId) -> Self {
        Self {
            shape,
            payload: None,
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn is_nil(&self) -> bool {
        self.payload.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("shape", &self.shape)
            .field("nil", &self.is_nil())
            .finish()
    }
}

/// Name used for matching: underscores removed, lowercase
pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|&c| c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
