use crate::builder::ExecBuilder;
use crate::directives::apply_directives;
use crate::directives::Directive;
use crate::error::BindError;
use crate::resolvable::DispatchTree;
use crate::resolvable::ExecId;
use crate::shape::Kind;
use crate::shape::Shapes;
use crate::shape::Value;
use apollo_compiler::ast::OperationType;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use std::sync::Arc;

const QUERY: &str = "Query";
const MUTATION: &str = "Mutation";
const SUBSCRIPTION: &str = "Subscription";

/// Configuration for [`Binder`], loadable with serde
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct BindOptions {
    /// When a resolver has no method for a field,
    /// look for a data member with a matching name instead of failing
    pub use_field_resolvers: bool,
}

/// Builder for binding a schema to its resolvers
///
/// Start with [`Binder::new`], configure, then call [`bind`][Self::bind]
/// with the root resolver value.
pub struct Binder<'a> {
    schema: &'a Valid<Schema>,
    shapes: &'a Shapes,
    directives: Vec<Arc<dyn Directive>>,
    options: BindOptions,
}

/// A schema whose root operation types are bound to resolvers
#[derive(Debug, Clone)]
pub struct ResolvableSchema {
    pub tree: DispatchTree,
    pub query: Option<RootBinding>,
    pub mutation: Option<RootBinding>,
    pub subscription: Option<RootBinding>,
}

/// The node for a root operation type, and the resolver value to execute it on
#[derive(Debug, Clone)]
pub struct RootBinding {
    pub exec: ExecId,
    pub resolver: Value,
}

impl<'a> Binder<'a> {
    pub fn new(schema: &'a Valid<Schema>, shapes: &'a Shapes) -> Self {
        Self {
            schema,
            shapes,
            directives: Vec::new(),
            options: BindOptions::default(),
        }
    }

    pub fn options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    /// See [`BindOptions::use_field_resolvers`]
    pub fn use_field_resolvers(mut self, use_field_resolvers: bool) -> Self {
        self.options.use_field_resolvers = use_field_resolvers;
        self
    }

    /// Registers the implementation of a directive
    pub fn directive(mut self, directive: impl Directive + 'static) -> Self {
        self.directives.push(Arc::new(directive));
        self
    }

    pub fn directives(mut self, directives: impl IntoIterator<Item = Arc<dyn Directive>>) -> Self {
        self.directives.extend(directives);
        self
    }

    /// Binds every root operation type of the schema.
    ///
    /// For each of `Query`, `Mutation`, and `Subscription`, a method of `resolver`
    /// with exactly that name provides a dedicated resolver for the operation type.
    /// Without such a method, `resolver` itself is used.
    ///
    /// A nil `resolver` binds nothing: the result has an empty tree and no root bindings,
    /// and directive implementations are not checked.
    pub fn bind(self, resolver: &Value) -> Result<ResolvableSchema, BindError> {
        if resolver.is_nil() {
            log::debug!("nil root resolver: no operation type is bound");
            return Ok(ResolvableSchema {
                tree: DispatchTree { nodes: Vec::new() },
                query: None,
                mutation: None,
                subscription: None,
            });
        }
        let directives = apply_directives(self.schema, self.shapes, &self.directives)?;
        let mut builder = ExecBuilder::new(
            self.schema,
            self.shapes,
            &directives,
            self.options.use_field_resolvers,
        );

        let query_resolver = self.root_resolver(resolver, QUERY)?;
        let mutation_resolver = self.root_resolver(resolver, MUTATION)?;
        let subscription_resolver = self.root_resolver(resolver, SUBSCRIPTION)?;

        let definition = &self.schema.schema_definition;
        let mut bind_root = |root: Option<&ComponentName>,
                             resolver: Value|
         -> Result<Option<RootBinding>, BindError> {
            let Some(root) = root else {
                return Ok(None);
            };
            log::debug!(
                "binding root type {} to {}",
                root.name,
                self.shapes.name(resolver.shape())
            );
            let exec = builder.assign(&Type::Named(root.name.clone()), resolver.shape())?;
            Ok(Some(RootBinding { exec, resolver }))
        };
        let query = bind_root(definition.query.as_ref(), query_resolver)?;
        let mutation = bind_root(definition.mutation.as_ref(), mutation_resolver)?;
        let subscription = bind_root(definition.subscription.as_ref(), subscription_resolver)?;

        let tree = builder.finish()?;
        Ok(ResolvableSchema {
            tree,
            query,
            mutation,
            subscription,
        })
    }

    /// The value returned by the method named `operation`, or `resolver` if there is none
    fn root_resolver(&self, resolver: &Value, operation: &'static str) -> Result<Value, BindError> {
        let shapes = self.shapes;
        let resolver_type = shapes.name(resolver.shape());
        let Some((_, method)) = shapes.find_method_exact(resolver.shape(), operation) else {
            return Ok(resolver.clone());
        };
        if !method.params.is_empty() {
            return Err(BindError::RootMethodArguments {
                method: operation,
                resolver_type: resolver_type.to_owned(),
                count: method.params.len(),
            });
        }
        let [return_type] = method.results[..] else {
            return Err(BindError::RootMethodReturnCount {
                method: operation,
                resolver_type: resolver_type.to_owned(),
                count: method.results.len(),
            });
        };
        if !matches!(shapes.kind(return_type), Kind::Pointer(_) | Kind::Interface) {
            return Err(BindError::RootMethodReturnShape {
                method: operation,
                resolver_type: resolver_type.to_owned(),
                return_type: shapes.name(return_type).to_owned(),
            });
        }
        let Some(results) = method.invoke(resolver, &[]) else {
            return Err(BindError::RootMethodNotInvocable {
                method: operation,
                resolver_type: resolver_type.to_owned(),
            });
        };
        match results.into_iter().next() {
            Some(value) if !value.is_nil() => Ok(value),
            _ => Err(BindError::RootMethodNilResult {
                method: operation,
                resolver_type: resolver_type.to_owned(),
            }),
        }
    }
}

impl ResolvableSchema {
    pub fn root(&self, operation_type: OperationType) -> Option<&RootBinding> {
        match operation_type {
            OperationType::Query => self.query.as_ref(),
            OperationType::Mutation => self.mutation.as_ref(),
            OperationType::Subscription => self.subscription.as_ref(),
        }
    }
}
