use crate::directives::Directive;
use crate::error::BindError;
use crate::packer::PackerBuilder;
use crate::resolvable::Dispatch;
use crate::resolvable::DispatchTree;
use crate::resolvable::ExecId;
use crate::resolvable::Field;
use crate::resolvable::List;
use crate::resolvable::Object;
use crate::resolvable::Resolvable;
use crate::resolvable::TypeAssertion;
use crate::shape::normalize;
use crate::shape::Kind;
use crate::shape::Method;
use crate::shape::ShapeId;
use crate::shape::Shapes;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Schema;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds [`Resolvable`] nodes for (schema type, resolver shape) pairs.
///
/// Nodes are allocated in an arena before being built. When a pair is requested again,
/// even while its node is still being built further up the stack,
/// the id allocated the first time is returned. Slots are sealed by [`finish`][Self::finish].
pub(crate) struct ExecBuilder<'a> {
    schema: &'a Valid<Schema>,
    shapes: &'a Shapes,
    directives: &'a IndexMap<String, Arc<dyn Directive>>,
    packer_builder: PackerBuilder<'a>,
    use_field_resolvers: bool,
    res_map: HashMap<(Type, ShapeId), ExecId>,
    nodes: Vec<Option<Resolvable>>,
    possible_types: HashMap<Name, Vec<Name>>,
}

/// Where a field value comes from, before its signature is checked
enum Target<'s> {
    Method(usize, &'s Method),
    Field(Vec<usize>, ShapeId),
}

impl<'a> ExecBuilder<'a> {
    pub(crate) fn new(
        schema: &'a Valid<Schema>,
        shapes: &'a Shapes,
        directives: &'a IndexMap<String, Arc<dyn Directive>>,
        use_field_resolvers: bool,
    ) -> Self {
        let possible_types = schema
            .implementers_map()
            .into_iter()
            .map(|(interface, implementers)| {
                // In type declaration order
                let objects: Vec<Name> = implementers.objects.into_iter().collect();
                (interface, objects)
            })
            .collect();
        Self {
            schema,
            shapes,
            directives,
            packer_builder: PackerBuilder::new(schema, shapes),
            use_field_resolvers,
            res_map: HashMap::new(),
            nodes: Vec::new(),
            possible_types,
        }
    }

    /// Seals every node and checks argument packers
    pub(crate) fn finish(self) -> Result<DispatchTree, BindError> {
        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| {
                node.ok_or_else(|| BindError::SuspectedValidationBug {
                    ty: format!("node {index} was never built"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.packer_builder.finish()?;
        log::debug!("built {} resolvable nodes", nodes.len());
        Ok(DispatchTree { nodes })
    }

    /// Returns the node for this pair, building it on first request
    pub(crate) fn assign(&mut self, ty: &Type, resolver: ShapeId) -> Result<ExecId, BindError> {
        let key = (ty.clone(), resolver);
        if let Some(&id) = self.res_map.get(&key) {
            log::trace!("reusing node for {ty} on {}", self.shapes.name(resolver));
            return Ok(id);
        }
        let id = ExecId(self.nodes.len());
        self.nodes.push(None);
        self.res_map.insert(key, id);
        let exec = self.make_exec(ty, resolver)?;
        self.nodes[id.0] = Some(exec);
        Ok(id)
    }

    fn make_exec(&mut self, ty: &Type, resolver: ShapeId) -> Result<Resolvable, BindError> {
        let non_null = ty.is_non_null();
        let schema = self.schema;

        if let Type::Named(name) | Type::NonNullNamed(name) = ty {
            match schema.types.get(name) {
                Some(ExtendedType::Object(object)) => {
                    let fields: Vec<_> = object.fields.values().collect();
                    return self
                        .make_object_exec(name, &fields, &[], non_null, resolver)
                        .map(Resolvable::Object);
                }
                Some(ExtendedType::Interface(interface)) => {
                    let possible_types = self
                        .possible_types
                        .get(name)
                        .cloned()
                        .unwrap_or_default();
                    let fields: Vec<_> = interface.fields.values().collect();
                    return self
                        .make_object_exec(name, &fields, &possible_types, non_null, resolver)
                        .map(Resolvable::Object);
                }
                Some(ExtendedType::Union(union_)) => {
                    let members: Vec<Name> = union_
                        .members
                        .iter()
                        .map(|member| member.name.clone())
                        .collect();
                    return self
                        .make_object_exec(name, &[], &members, non_null, resolver)
                        .map(Resolvable::Object);
                }
                _ => {}
            }
        }

        // Absence of a leaf or list value is a nil pointer
        let resolver = if non_null {
            resolver
        } else {
            match self.shapes.kind(resolver) {
                Kind::Pointer(elem) => elem,
                _ => {
                    return Err(BindError::NotAPointer {
                        resolver_type: self.shapes.name(resolver).to_owned(),
                    })
                }
            }
        };

        match ty {
            Type::Named(name) | Type::NonNullNamed(name) => match schema.types.get(name) {
                Some(ExtendedType::Scalar(_)) => self.make_scalar_exec(name, resolver),
                // Enum values are checked during execution
                Some(ExtendedType::Enum(_)) => Ok(Resolvable::Scalar),
                _ => Err(BindError::SuspectedValidationBug { ty: ty.to_string() }),
            },
            Type::List(item) | Type::NonNullList(item) => match self.shapes.kind(resolver) {
                Kind::Slice(elem) => {
                    let elem = self.assign(item, elem)?;
                    Ok(Resolvable::List(List { elem }))
                }
                _ => Err(BindError::NotASlice {
                    resolver_type: self.shapes.name(resolver).to_owned(),
                }),
            },
        }
    }

    fn make_scalar_exec(&self, name: &Name, resolver: ShapeId) -> Result<Resolvable, BindError> {
        if self.shapes.implements_graphql_type(resolver, name) {
            Ok(Resolvable::Scalar)
        } else {
            Err(BindError::IncompatibleScalar {
                resolver_type: self.shapes.name(resolver).to_owned(),
                scalar: name.clone(),
            })
        }
    }

    fn make_object_exec(
        &mut self,
        type_name: &Name,
        fields: &[&Component<FieldDefinition>],
        possible_types: &[Name],
        non_null: bool,
        resolver: ShapeId,
    ) -> Result<Object, BindError> {
        let shapes = self.shapes;
        let resolver_type = shapes.name(resolver);
        if !non_null && !shapes.is_pointer(resolver) && !shapes.is_interface(resolver) {
            return Err(BindError::NotAPointerOrInterface {
                resolver_type: resolver_type.to_owned(),
            });
        }
        log::debug!("binding {type_name} to {resolver_type}");

        let struct_shape = shapes.unwrap_ptr(resolver);
        let field_counts = shapes.field_counts(struct_shape);
        let mut bound_fields = IndexMap::new();
        for &field in fields {
            let field_name = &field.name;
            let mut target = shapes
                .find_method(resolver, field_name)
                .map(|(index, method)| Target::Method(index, method));
            if self.use_field_resolvers && target.is_none() {
                if field_counts
                    .get(&normalize(field_name))
                    .is_some_and(|&count| count > 1)
                {
                    return Err(BindError::AmbiguousField {
                        resolver_type: resolver_type.to_owned(),
                        type_name: type_name.clone(),
                        field: field_name.clone(),
                    });
                }
                target = shapes.find_field(struct_shape, field_name).and_then(|path| {
                    let member = shapes.field_by_path(struct_shape, &path)?;
                    Some(Target::Field(path, member.shape))
                });
            }
            let Some(target) = target else {
                return Err(BindError::MissingField {
                    resolver_type: resolver_type.to_owned(),
                    type_name: type_name.clone(),
                    field: field_name.clone(),
                    exists_on_pointer: shapes.has_pointer_method(resolver, field_name),
                });
            };

            let member = match &target {
                Target::Method(_, method) => method.name.clone(),
                Target::Field(path, _) => shapes
                    .field_by_path(struct_shape, path)
                    .map(|member| member.name.clone())
                    .unwrap_or_default(),
            };
            let bound = self
                .make_field_exec(type_name, field, target, resolver)
                .map_err(|source| BindError::UsedBy {
                    source: Box::new(source),
                    resolver_type: resolver_type.to_owned(),
                    member,
                })?;
            bound_fields.insert(field_name.clone(), bound);
        }

        // With data member resolvers, an interface resolver is expected to be
        // converted by the executor without assertion methods
        let mut type_assertions = IndexMap::new();
        if !self.use_field_resolvers || !shapes.is_interface(resolver) {
            for concrete in possible_types {
                let method_name = format!("To{concrete}");
                let Some((method_index, method)) = shapes.find_method(resolver, &method_name) else {
                    return Err(BindError::MissingTypeAssertion {
                        resolver_type: resolver_type.to_owned(),
                        type_name: type_name.clone(),
                        method: method_name,
                        concrete: concrete.clone(),
                    });
                };
                if !method.params.is_empty() {
                    return Err(BindError::TypeAssertionArguments {
                        resolver_type: resolver_type.to_owned(),
                        type_name: type_name.clone(),
                        method: method_name,
                    });
                }
                let [concrete_shape, ShapeId::BOOL] = method.results[..] else {
                    return Err(BindError::TypeAssertionReturns {
                        resolver_type: resolver_type.to_owned(),
                        type_name: type_name.clone(),
                        method: method_name,
                    });
                };
                let type_exec = self.assign(&Type::Named(concrete.clone()), concrete_shape)?;
                type_assertions.insert(
                    concrete.clone(),
                    TypeAssertion {
                        method_index,
                        type_exec,
                    },
                );
            }
        }

        Ok(Object {
            name: type_name.clone(),
            fields: bound_fields,
            type_assertions,
        })
    }

    fn make_field_exec(
        &mut self,
        type_name: &Name,
        field: &Component<FieldDefinition>,
        target: Target<'_>,
        resolver: ShapeId,
    ) -> Result<Field, BindError> {
        let mut args_packer = None;
        let mut has_context = false;
        let mut has_error = false;

        let (dispatch, out) = match target {
            Target::Method(index, method) => {
                let mut params = method.params.as_slice();

                has_context = params.first() == Some(&ShapeId::CONTEXT);
                if has_context {
                    params = &params[1..];
                }

                if !field.arguments.is_empty() {
                    let Some((&args_shape, rest)) = params.split_first() else {
                        return Err(BindError::MissingArgumentsParameter);
                    };
                    args_packer = Some(
                        self.packer_builder
                            .make_struct_packer(&field.arguments, args_shape)?,
                    );
                    params = rest;
                }

                if !params.is_empty() {
                    return Err(BindError::TooManyArguments);
                }

                let out = match method.results[..] {
                    [] => return Err(BindError::TooFewReturnValues),
                    [out] => out,
                    [out, ShapeId::ERROR] => {
                        has_error = true;
                        out
                    }
                    [_, _] => return Err(BindError::LastReturnNotError),
                    _ => return Err(BindError::TooManyReturnValues),
                };
                (Dispatch::Method(index), self.subscription_item(type_name, out))
            }
            Target::Field(path, shape) => (Dispatch::Field(path), shape),
        };

        let mut directive_packers = IndexMap::new();
        for directive in field.directives.iter() {
            let name = &directive.name;
            // Has no runtime behavior
            if name.as_str() == "deprecated" {
                continue;
            }
            let Some(visitor) = self.directives.get(name.as_str()) else {
                return Err(BindError::FieldDirectiveWithoutVisitor {
                    directive: name.clone(),
                    field: field.name.clone(),
                });
            };
            if visitor.as_resolver_interceptor().is_none() {
                log::trace!("directive @{name} does not intercept {type_name}.{}", field.name);
                continue;
            }
            // Field directive arguments lack type information: use the definition
            let Some(definition) = self.schema.directive_definitions.get(name) else {
                return Err(BindError::UndefinedDirective { name: name.clone() });
            };
            let packer = self
                .packer_builder
                .make_struct_packer(&definition.arguments, visitor.shape())?;
            directive_packers.insert(name.clone(), packer);
        }

        let value_exec = self.assign(&field.ty, out)?;
        Ok(Field {
            definition: field.node.clone(),
            type_name: type_name.clone(),
            dispatch,
            resolver_shape: resolver,
            has_context,
            has_error,
            args_packer,
            directive_packers,
            value_exec,
            trace_label: format!("GraphQL field: {type_name}.{}", field.name),
        })
    }

    /// Subscription fields produce a stream: its items are bound instead
    fn subscription_item(&self, type_name: &Name, out: ShapeId) -> ShapeId {
        let is_subscription = self
            .schema
            .schema_definition
            .subscription
            .as_ref()
            .is_some_and(|subscription| subscription.name == *type_name);
        match self.shapes.kind(out) {
            Kind::Chan(item) if is_subscription => item,
            _ => out,
        }
    }
}
