//! Ahead-of-time binding of a GraphQL schema to resolvers.
//!
//! Given a [`Valid<Schema>`][apollo_compiler::validation::Valid] and a description of
//! resolver types in a [`Shapes`] registry, [`Binder::bind`] decides once, before any request,
//! how each schema field is provided: which resolver method to call or which data member to
//! read, whether the method takes a request context or arguments, whether it can fail,
//! how interface and union values are converted to concrete object types,
//! and which directives intercept the field.
//!
//! The result is a [`DispatchTree`][resolvable::DispatchTree]: an immutable arena of nodes
//! that an executor walks for every request without looking at the schema or shapes again.
//! Any mismatch between schema and resolvers is reported by `bind` as a [`BindError`].
//!
//! # Example
//!
//! ```
//! use apollo_compiler::Schema;
//! use apollo_resolvable::shape::Method;
//! use apollo_resolvable::shape::ShapeId;
//! use apollo_resolvable::shape::Shapes;
//! use apollo_resolvable::shape::Value;
//! use apollo_resolvable::Binder;
//!
//! let schema = Schema::parse_and_validate("type Query { hello: String! }", "schema.graphql")
//!     .unwrap();
//!
//! let mut shapes = Shapes::new();
//! let query = shapes.declare_struct("Query");
//! shapes.add_method(query, Method::new("hello").returns([ShapeId::STRING]));
//! let query_ref = shapes.pointer_to(query);
//!
//! let bound = Binder::new(&schema, &shapes)
//!     .bind(&Value::new(query_ref, ()))
//!     .unwrap();
//! let root = bound.tree.object(bound.query.unwrap().exec).unwrap();
//! assert!(root.fields["hello"].uses_method_resolver());
//! ```

mod builder;
pub mod directives;
mod error;
pub mod packer;
pub mod resolvable;
mod root;
pub mod shape;

pub use self::error::BindError;
pub use self::root::BindOptions;
pub use self::root::Binder;
pub use self::root::ResolvableSchema;
pub use self::root::RootBinding;
pub use self::shape::Shapes;
