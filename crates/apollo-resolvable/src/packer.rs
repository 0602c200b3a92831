//! Mapping of GraphQL argument lists onto resolver parameter shapes
//!
//! A [`StructPacker`] records, for each argument definition, which data member of the
//! target struct receives it. Packers are created during binding, but checking that an
//! argument's GraphQL type fits its target member is deferred until every field is bound:
//! input object types can be recursive, and the check memoizes on (type, shape) pairs.

use crate::shape::Kind;
use crate::shape::ShapeId;
use crate::shape::Shapes;
use apollo_compiler::ast;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use std::collections::HashSet;
use triomphe::Arc;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PackerError {
    #[error(
        "expected struct or pointer to struct, got {shape} \
         (hint: missing arguments struct wrapping the field arguments?)"
    )]
    NotAStruct { shape: String },

    #[error("{shape} does not define a member for argument \"{argument}\"")]
    MissingArgument { shape: String, argument: Name },

    #[error("{shape} is not a pointer, as required for nullable {ty}")]
    NotAPointer { shape: String, ty: String },

    #[error("{shape} is not a slice, as required for {ty}")]
    NotASlice { shape: String, ty: String },

    #[error("can not unmarshal {ty} into {shape}")]
    IncompatibleType { shape: String, ty: String },

    #[error("{shape} does not define a member for input field \"{field}\" of {type_name}")]
    MissingInputField {
        shape: String,
        type_name: Name,
        field: Name,
    },

    #[error("invalid input type: {ty}")]
    UnknownInputType { ty: String },
}

/// Where one argument value is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArgument {
    pub name: Name,
    pub ty: Node<Type>,
    pub default_value: Option<Node<ast::Value>>,
    /// Member indexes from the target struct, as returned by [`Shapes::find_field`]
    pub field_path: Vec<usize>,
    /// Shape of the member receiving the value
    pub shape: ShapeId,
}

/// Converts GraphQL argument values into one host struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructPacker {
    /// The declared target shape, possibly a pointer to the struct
    pub target: ShapeId,
    /// The struct receiving the arguments
    pub struct_shape: ShapeId,
    pub arguments: Vec<PackedArgument>,
}

impl StructPacker {
    /// Whether the packed struct is passed by pointer
    pub fn uses_pointer(&self) -> bool {
        self.target != self.struct_shape
    }

    pub fn argument(&self, name: &str) -> Option<&PackedArgument> {
        self.arguments.iter().find(|argument| argument.name == name)
    }
}

/// Creates [`StructPacker`]s during binding, then checks them all in [`finish`][Self::finish]
pub(crate) struct PackerBuilder<'a> {
    schema: &'a Valid<Schema>,
    shapes: &'a Shapes,
    pending: Vec<Arc<StructPacker>>,
}

impl<'a> PackerBuilder<'a> {
    pub(crate) fn new(schema: &'a Valid<Schema>, shapes: &'a Shapes) -> Self {
        Self {
            schema,
            shapes,
            pending: Vec::new(),
        }
    }

    pub(crate) fn make_struct_packer(
        &mut self,
        arguments: &[Node<InputValueDefinition>],
        target: ShapeId,
    ) -> Result<Arc<StructPacker>, PackerError> {
        let struct_shape = self.shapes.unwrap_ptr(target);
        if self.shapes.kind(struct_shape) != Kind::Struct {
            return Err(PackerError::NotAStruct {
                shape: self.shapes.name(target).to_owned(),
            });
        }
        let arguments = arguments
            .iter()
            .map(|definition| {
                let field_path = self
                    .shapes
                    .find_field(struct_shape, &definition.name)
                    .ok_or_else(|| PackerError::MissingArgument {
                        shape: self.shapes.name(struct_shape).to_owned(),
                        argument: definition.name.clone(),
                    })?;
                let shape = self
                    .shapes
                    .field_by_path(struct_shape, &field_path)
                    .map(|field| field.shape)
                    .ok_or_else(|| PackerError::MissingArgument {
                        shape: self.shapes.name(struct_shape).to_owned(),
                        argument: definition.name.clone(),
                    })?;
                Ok(PackedArgument {
                    name: definition.name.clone(),
                    ty: definition.ty.clone(),
                    default_value: definition.default_value.clone(),
                    field_path,
                    shape,
                })
            })
            .collect::<Result<Vec<_>, PackerError>>()?;
        let packer = Arc::new(StructPacker {
            target,
            struct_shape,
            arguments,
        });
        self.pending.push(packer.clone());
        Ok(packer)
    }

    /// Checks every argument of every packer created so far against its target member
    pub(crate) fn finish(self) -> Result<(), PackerError> {
        let mut checked = HashSet::new();
        for packer in &self.pending {
            for argument in &packer.arguments {
                // An omitted argument with a default value is never null
                if argument.default_value.is_some() && !argument.ty.is_non_null() {
                    let ty = (*argument.ty).clone().non_null();
                    self.check(&mut checked, &ty, argument.shape)?;
                } else {
                    self.check(&mut checked, &argument.ty, argument.shape)?;
                }
            }
        }
        log::trace!("checked {} argument packers", self.pending.len());
        Ok(())
    }

    fn check(
        &self,
        checked: &mut HashSet<(Type, ShapeId)>,
        ty: &Type,
        shape: ShapeId,
    ) -> Result<(), PackerError> {
        if !checked.insert((ty.clone(), shape)) {
            return Ok(());
        }
        let shape = if ty.is_non_null() {
            shape
        } else {
            match self.shapes.kind(shape) {
                Kind::Pointer(elem) => elem,
                _ => {
                    return Err(PackerError::NotAPointer {
                        shape: self.shapes.name(shape).to_owned(),
                        ty: ty.to_string(),
                    })
                }
            }
        };
        match ty {
            Type::List(item) | Type::NonNullList(item) => match self.shapes.kind(shape) {
                Kind::Slice(elem) => self.check(checked, item, elem),
                _ => Err(PackerError::NotASlice {
                    shape: self.shapes.name(shape).to_owned(),
                    ty: ty.to_string(),
                }),
            },
            Type::Named(name) | Type::NonNullNamed(name) => match self.schema.types.get(name) {
                Some(ExtendedType::Scalar(_)) => {
                    if self.shapes.implements_graphql_type(shape, name) {
                        Ok(())
                    } else {
                        Err(self.incompatible(ty, shape))
                    }
                }
                Some(ExtendedType::Enum(_)) => {
                    if self.shapes.kind(shape) == Kind::String
                        || self.shapes.implements_graphql_type(shape, name)
                    {
                        Ok(())
                    } else {
                        Err(self.incompatible(ty, shape))
                    }
                }
                Some(ExtendedType::InputObject(input_object)) => {
                    if self.shapes.kind(shape) != Kind::Struct {
                        return Err(self.incompatible(ty, shape));
                    }
                    for (field_name, field) in &input_object.fields {
                        let member = self
                            .shapes
                            .find_field(shape, field_name)
                            .and_then(|path| self.shapes.field_by_path(shape, &path))
                            .ok_or_else(|| PackerError::MissingInputField {
                                shape: self.shapes.name(shape).to_owned(),
                                type_name: name.clone(),
                                field: field_name.clone(),
                            })?;
                        self.check(checked, &field.ty, member.shape)?;
                    }
                    Ok(())
                }
                _ => Err(PackerError::UnknownInputType { ty: ty.to_string() }),
            },
        }
    }

    fn incompatible(&self, ty: &Type, shape: ShapeId) -> PackerError {
        PackerError::IncompatibleType {
            shape: self.shapes.name(shape).to_owned(),
            ty: ty.to_string(),
        }
    }
}
