use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use apollo_resolvable::resolvable::Field;
use apollo_resolvable::resolvable::Object;
use apollo_resolvable::shape::ShapeId;
use apollo_resolvable::shape::Shapes;
use apollo_resolvable::shape::Value;
use apollo_resolvable::BindError;
use apollo_resolvable::Binder;
use apollo_resolvable::ResolvableSchema;

pub fn parse(sdl: &str) -> Valid<Schema> {
    Schema::parse_and_validate(sdl, "schema.graphql").unwrap()
}

pub fn bind(schema: &Valid<Schema>, shapes: &Shapes, root: ShapeId) -> ResolvableSchema {
    match Binder::new(schema, shapes).bind(&Value::new(root, ())) {
        Ok(bound) => bound,
        Err(err) => panic!("binding failed: {err}"),
    }
}

pub fn bind_with_field_resolvers(
    schema: &Valid<Schema>,
    shapes: &Shapes,
    root: ShapeId,
) -> ResolvableSchema {
    let binder = Binder::new(schema, shapes).use_field_resolvers(true);
    match binder.bind(&Value::new(root, ())) {
        Ok(bound) => bound,
        Err(err) => panic!("binding failed: {err}"),
    }
}

pub fn bind_err(schema: &Valid<Schema>, shapes: &Shapes, root: ShapeId) -> BindError {
    match Binder::new(schema, shapes).bind(&Value::new(root, ())) {
        Ok(_) => panic!("expected binding to fail"),
        Err(err) => err,
    }
}

pub fn query_object(bound: &ResolvableSchema) -> &Object {
    let exec = bound.query.as_ref().expect("query root is bound").exec;
    bound.tree.object(exec).expect("query root is an object")
}

pub fn child_object<'a>(bound: &'a ResolvableSchema, field: &Field) -> &'a Object {
    bound
        .tree
        .object(field.value_exec)
        .expect("field value is an object")
}
