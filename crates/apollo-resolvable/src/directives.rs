//! Application-provided implementations of schema directives
//!
//! Binding only checks that every directive that may be placed on field definitions
//! has an implementation, and prepares argument packers for those that intercept
//! field resolution. Calling [`ResolverInterceptor::resolve`] is up to the executor.

use crate::error::BindError;
use crate::shape::ShapeId;
use crate::shape::Shapes;
use crate::shape::Value;
use apollo_compiler::ast::DirectiveLocation;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use indexmap::IndexMap;
use std::sync::Arc;

/// Directives that never need an implementation
const BUILT_IN_DIRECTIVES: [&str; 4] = ["include", "skip", "deprecated", "specifiedBy"];

pub type InterceptResult = Result<Value, Box<dyn std::error::Error + Send + Sync>>;

/// Implementation of a directive declared in the schema
pub trait Directive: Send + Sync {
    /// Name of the implemented directive, without `@`
    fn implements_directive(&self) -> &str;

    /// Shape of this implementation, whose data members receive the directive's arguments
    fn shape(&self) -> ShapeId;

    /// Returns `Some` if this directive intercepts field resolution
    fn as_resolver_interceptor(&self) -> Option<&dyn ResolverInterceptor> {
        None
    }
}

/// A directive that wraps the resolution of fields it is applied to
pub trait ResolverInterceptor: Send + Sync {
    /// `arguments` is this directive's arguments, packed into a value of
    /// [`Directive::shape`]. `next` resolves the field.
    fn resolve(
        &self,
        context: &Value,
        arguments: &Value,
        next: &dyn Fn(&Value) -> InterceptResult,
    ) -> InterceptResult;
}

/// Indexes directive implementations by name,
/// and checks that every directive applicable to field definitions is implemented
pub(crate) fn apply_directives(
    schema: &Valid<Schema>,
    shapes: &Shapes,
    visitors: &[Arc<dyn Directive>],
) -> Result<IndexMap<String, Arc<dyn Directive>>, BindError> {
    let mut by_name: IndexMap<String, Arc<dyn Directive>> = IndexMap::new();

    for visitor in visitors {
        let name = visitor.implements_directive();

        if let Some(existing) = by_name.get(name) {
            return Err(BindError::DuplicateDirectiveImplementation {
                name: name.to_owned(),
                first: shapes.name(existing.shape()).to_owned(),
                second: shapes.name(visitor.shape()).to_owned(),
            });
        }

        // Field resolution interception is the only capability so far
        if visitor.as_resolver_interceptor().is_none() {
            return Err(BindError::InvalidDirectiveVisitor {
                name: name.to_owned(),
                implementation: shapes.name(visitor.shape()).to_owned(),
            });
        }

        by_name.insert(name.to_owned(), visitor.clone());
    }

    for (name, definition) in &schema.directive_definitions {
        if !definition
            .locations
            .contains(&DirectiveLocation::FieldDefinition)
        {
            continue;
        }
        if by_name.contains_key(name.as_str()) || BUILT_IN_DIRECTIVES.contains(&name.as_str()) {
            continue;
        }
        return Err(BindError::UnregisteredDirective { name: name.clone() });
    }

    log::debug!("registered {} directive implementations", by_name.len());
    Ok(by_name)
}
