use crate::packer::PackerError;
use apollo_compiler::Name;

/// Reason why a schema could not be bound to its resolvers.
///
/// Binding is all-or-nothing: the first error aborts it and no partial result is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindError {
    #[error("method \"{method}\" of {resolver_type} must not accept any arguments, got {count}")]
    RootMethodArguments {
        method: &'static str,
        resolver_type: String,
        count: usize,
    },

    #[error("method \"{method}\" of {resolver_type} must have 1 return value, got {count}")]
    RootMethodReturnCount {
        method: &'static str,
        resolver_type: String,
        count: usize,
    },

    #[error(
        "method \"{method}\" of {resolver_type} must return an interface or a pointer, \
         got {return_type}"
    )]
    RootMethodReturnShape {
        method: &'static str,
        resolver_type: String,
        return_type: String,
    },

    #[error("method \"{method}\" of {resolver_type} must return a non-nil result")]
    RootMethodNilResult {
        method: &'static str,
        resolver_type: String,
    },

    #[error("method \"{method}\" of {resolver_type} cannot be called: no invoker was registered")]
    RootMethodNotInvocable {
        method: &'static str,
        resolver_type: String,
    },

    #[error(
        "multiple implementations registered for directive \"{name}\". \
         Implementation types {first} and {second}"
    )]
    DuplicateDirectiveImplementation {
        name: String,
        first: String,
        second: String,
    },

    #[error(
        "directive \"{name}\" (implemented by {implementation}) \
         does not implement a valid directive visitor function"
    )]
    InvalidDirectiveVisitor {
        name: String,
        implementation: String,
    },

    #[error("no visitors have been registered for directive \"{name}\"")]
    UnregisteredDirective { name: Name },

    #[error(
        "directive \"{directive}\" on field \"{field}\" \
         does not have a visitor registered with the schema"
    )]
    FieldDirectiveWithoutVisitor { directive: Name, field: Name },

    #[error("directive definition \"{name}\" is not defined in the schema")]
    UndefinedDirective { name: Name },

    #[error("{resolver_type} is not a pointer")]
    NotAPointer { resolver_type: String },

    #[error("{resolver_type} is not a pointer or interface")]
    NotAPointerOrInterface { resolver_type: String },

    #[error("{resolver_type} is not a slice")]
    NotASlice { resolver_type: String },

    #[error("can not use {resolver_type} as {scalar}")]
    IncompatibleScalar { resolver_type: String, scalar: Name },

    #[error(
        "{resolver_type} does not resolve \"{type_name}\": missing method for field \"{field}\"{}",
        pointer_hint(.exists_on_pointer)
    )]
    MissingField {
        resolver_type: String,
        type_name: Name,
        field: Name,
        exists_on_pointer: bool,
    },

    #[error("{resolver_type} does not resolve \"{type_name}\": ambiguous field \"{field}\"")]
    AmbiguousField {
        resolver_type: String,
        type_name: Name,
        field: Name,
    },

    #[error(
        "{resolver_type} does not resolve \"{type_name}\": \
         missing method \"{method}\" to convert to \"{concrete}\""
    )]
    MissingTypeAssertion {
        resolver_type: String,
        type_name: Name,
        method: String,
        concrete: Name,
    },

    #[error(
        "{resolver_type} does not resolve \"{type_name}\": \
         method \"{method}\" should not have any arguments"
    )]
    TypeAssertionArguments {
        resolver_type: String,
        type_name: Name,
        method: String,
    },

    #[error(
        "{resolver_type} does not resolve \"{type_name}\": \
         method \"{method}\" should return a value and a bool indicating success"
    )]
    TypeAssertionReturns {
        resolver_type: String,
        type_name: Name,
        method: String,
    },

    #[error("must have an arguments struct parameter for field arguments")]
    MissingArgumentsParameter,

    #[error("too many arguments")]
    TooManyArguments,

    #[error("too few return values")]
    TooFewReturnValues,

    #[error("too many return values")]
    TooManyReturnValues,

    #[error("must have \"error\" as its last return value")]
    LastReturnNotError,

    /// A field-level error, annotated with the resolver member that was being bound
    #[error("{source}\n\tused by ({resolver_type}).{member}")]
    UsedBy {
        source: Box<BindError>,
        resolver_type: String,
        member: String,
    },

    #[error(transparent)]
    Packer(#[from] PackerError),

    /// The schema representation is internally inconsistent.
    ///
    /// This is never caused by resolvers and is not expected for a valid schema.
    #[error("invalid type: {ty}")]
    SuspectedValidationBug { ty: String },
}

fn pointer_hint(exists_on_pointer: &bool) -> &'static str {
    if *exists_on_pointer {
        " (hint: the method exists on the pointer type)"
    } else {
        ""
    }
}

impl BindError {
    /// Returns true for errors that indicate a bug in the schema representation
    /// rather than a mistake in resolvers
    pub fn is_suspected_validation_bug(&self) -> bool {
        match self {
            BindError::SuspectedValidationBug { .. } => true,
            BindError::UsedBy { source, .. } => source.is_suspected_validation_bug(),
            _ => false,
        }
    }

    /// The innermost error, without `used by` annotations
    pub fn root_cause(&self) -> &BindError {
        match self {
            BindError::UsedBy { source, .. } => source.root_cause(),
            _ => self,
        }
    }
}
