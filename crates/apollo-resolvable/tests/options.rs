use crate::common::parse;
use apollo_resolvable::resolvable::Dispatch;
use apollo_resolvable::shape::Method;
use apollo_resolvable::shape::ShapeId;
use apollo_resolvable::shape::Shapes;
use apollo_resolvable::shape::StructField;
use apollo_resolvable::shape::Value;
use apollo_resolvable::BindOptions;
use apollo_resolvable::Binder;
use pretty_assertions::assert_eq;

#[test]
fn deserializes_with_defaults() {
    let options: BindOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, BindOptions::default());
    assert!(!options.use_field_resolvers);

    let options: BindOptions =
        serde_json::from_str(r#"{ "use_field_resolvers": true }"#).unwrap();
    assert!(options.use_field_resolvers);
}

#[test]
fn loaded_options_configure_binding() {
    let schema = parse("type Query { name: String! }");
    let mut shapes = Shapes::new();
    let query = shapes.declare_struct("Query");
    shapes.add_field(query, StructField::new("name", ShapeId::STRING));
    let query_ref = shapes.pointer_to(query);
    let root = Value::new(query_ref, ());

    let options: BindOptions =
        serde_json::from_str(r#"{ "use_field_resolvers": true }"#).unwrap();
    let bound = Binder::new(&schema, &shapes)
        .options(options)
        .bind(&root)
        .unwrap();
    let exec = bound.query.as_ref().unwrap().exec;
    let query_object = bound.tree.object(exec).unwrap();
    assert_eq!(query_object.fields["name"].dispatch, Dispatch::Field(vec![0]));

    let err = Binder::new(&schema, &shapes)
        .options(BindOptions::default())
        .bind(&root)
        .unwrap_err();
    assert!(err.to_string().contains("missing method for field \"name\""));
}

#[test]
fn builder_flags_override_loaded_options() {
    let schema = parse("type Query { name: String! }");
    let mut shapes = Shapes::new();
    let query = shapes.declare_struct("Query");
    shapes.add_field(query, StructField::new("name", ShapeId::STRING));
    shapes.add_method(query, Method::new("unrelated").returns([ShapeId::BOOL]));
    let query_ref = shapes.pointer_to(query);

    let result = Binder::new(&schema, &shapes)
        .options(BindOptions {
            use_field_resolvers: false,
        })
        .use_field_resolvers(true)
        .bind(&Value::new(query_ref, ()));
    assert!(result.is_ok());
}
