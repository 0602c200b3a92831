use crate::common::bind;
use crate::common::bind_err;
use crate::common::bind_with_field_resolvers;
use crate::common::child_object;
use crate::common::parse;
use crate::common::query_object;
use apollo_resolvable::shape::Method;
use apollo_resolvable::shape::ShapeId;
use apollo_resolvable::shape::Shapes;
use apollo_resolvable::BindError;
use expect_test::expect;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
interface Character { name: String! }
type Human implements Character {
  name: String!
  height: Float!
}
type Droid implements Character {
  name: String!
  primaryFunction: String!
}
type Query { hero: Character }
"#;

struct Characters {
    shapes: Shapes,
    query_ref: ShapeId,
    character: ShapeId,
    human_ref: ShapeId,
    droid_ref: ShapeId,
}

fn characters() -> Characters {
    let mut shapes = Shapes::new();
    let human = shapes.declare_struct("Human");
    shapes.add_method(human, Method::new("name").returns([ShapeId::STRING]));
    shapes.add_method(human, Method::new("height").returns([ShapeId::FLOAT64]));
    let human_ref = shapes.pointer_to(human);

    let droid = shapes.declare_struct("Droid");
    shapes.add_method(droid, Method::new("name").returns([ShapeId::STRING]));
    shapes.add_method(
        droid,
        Method::new("primary_function").returns([ShapeId::STRING]),
    );
    let droid_ref = shapes.pointer_to(droid);

    let character = shapes.declare_interface("Character");
    shapes.add_method(character, Method::new("name").returns([ShapeId::STRING]));

    let query = shapes.declare_struct("Query");
    shapes.add_method(query, Method::new("hero").returns([character]));
    let query_ref = shapes.pointer_to(query);
    Characters {
        shapes,
        query_ref,
        character,
        human_ref,
        droid_ref,
    }
}

fn with_assertions(mut characters: Characters) -> Characters {
    let Characters {
        shapes,
        character,
        human_ref,
        droid_ref,
        ..
    } = &mut characters;
    shapes.add_method(
        *character,
        Method::new("ToHuman").returns([*human_ref, ShapeId::BOOL]),
    );
    shapes.add_method(
        *character,
        Method::new("ToDroid").returns([*droid_ref, ShapeId::BOOL]),
    );
    characters
}

#[test]
fn binds_type_assertions_for_every_implementation() {
    let schema = parse(SDL);
    let characters = with_assertions(characters());
    let shapes = &characters.shapes;

    let bound = bind(&schema, shapes, characters.query_ref);
    let hero = child_object(&bound, &query_object(&bound).fields["hero"]);
    assert_eq!(hero.name, "Character");
    assert_eq!(hero.fields.len(), 1);
    assert_eq!(hero.fields["name"].resolver_shape, characters.character);

    let concrete: Vec<_> = hero
        .type_assertions
        .iter()
        .map(|(name, assertion)| (name.as_str(), assertion.method_index))
        .collect();
    assert_eq!(concrete, [("Human", 1), ("Droid", 2)]);

    let human = bound
        .tree
        .object(hero.type_assertions["Human"].type_exec)
        .unwrap();
    assert_eq!(human.name, "Human");
    assert!(human.type_assertions.is_empty());
    assert_eq!(human.fields["height"].resolver_shape, characters.human_ref);

    let droid = bound
        .tree
        .object(hero.type_assertions["Droid"].type_exec)
        .unwrap();
    assert_eq!(droid.fields.len(), 2);
    assert_eq!(droid.fields["primaryFunction"].resolver_shape, characters.droid_ref);
}

#[test]
fn every_implementation_needs_an_assertion_method() {
    let schema = parse(SDL);
    let mut characters = characters();
    let (character, human_ref) = (characters.character, characters.human_ref);
    characters.shapes.add_method(
        character,
        Method::new("ToHuman").returns([human_ref, ShapeId::BOOL]),
    );

    let err = bind_err(&schema, &characters.shapes, characters.query_ref);
    assert_eq!(
        err.to_string(),
        "dyn Character does not resolve \"Character\": \
         missing method \"ToDroid\" to convert to \"Droid\"\n\
         \tused by (&Query).hero"
    );
}

#[test]
fn assertion_methods_take_no_arguments() {
    let schema = parse(SDL);
    let mut characters = characters();
    let (character, human_ref) = (characters.character, characters.human_ref);
    characters.shapes.add_method(
        character,
        Method::new("ToHuman")
            .params([ShapeId::STRING])
            .returns([human_ref, ShapeId::BOOL]),
    );

    let err = bind_err(&schema, &characters.shapes, characters.query_ref);
    expect![[r#"dyn Character does not resolve "Character": method "ToHuman" should not have any arguments"#]]
        .assert_eq(&err.root_cause().to_string());
}

#[test]
fn assertion_methods_report_success() {
    let schema = parse(SDL);
    for results in [vec![], vec![ShapeId::STRING], vec![ShapeId::STRING, ShapeId::ERROR]] {
        let mut characters = characters();
        characters
            .shapes
            .add_method(characters.character, Method::new("ToHuman").returns(results));

        let err = bind_err(&schema, &characters.shapes, characters.query_ref);
        assert!(matches!(
            err.root_cause(),
            BindError::TypeAssertionReturns { method, .. } if method == "ToHuman"
        ));
    }
}

#[test]
fn asserted_values_are_bound_to_the_concrete_type() {
    let schema = parse(SDL);
    let mut characters = characters();
    let (character, droid_ref) = (characters.character, characters.droid_ref);
    characters.shapes.add_method(
        character,
        Method::new("ToDroid").returns([droid_ref, ShapeId::BOOL]),
    );
    characters.shapes.add_method(
        character,
        Method::new("ToHuman").returns([droid_ref, ShapeId::BOOL]),
    );

    let err = bind_err(&schema, &characters.shapes, characters.query_ref);
    assert_eq!(
        err.to_string(),
        "&Droid does not resolve \"Human\": missing method for field \"height\"\n\
         \tused by (&Query).hero"
    );
}

#[test]
fn interface_assertions_follow_type_declaration_order() {
    let schema = parse(
        r#"
        interface Node { id: ID! }
        type Zebra implements Node { id: ID! }
        type Apple implements Node { id: ID! }
        type Query { node: Node }
        "#,
    );
    let mut shapes = Shapes::new();
    let zebra = shapes.declare_struct("Zebra");
    shapes.add_method(zebra, Method::new("id").returns([ShapeId::ID]));
    let zebra_ref = shapes.pointer_to(zebra);
    let apple = shapes.declare_struct("Apple");
    shapes.add_method(apple, Method::new("id").returns([ShapeId::ID]));
    let apple_ref = shapes.pointer_to(apple);
    let node = shapes.declare_interface("Node");
    shapes
        .add_method(node, Method::new("id").returns([ShapeId::ID]))
        .add_method(node, Method::new("ToApple").returns([apple_ref, ShapeId::BOOL]))
        .add_method(node, Method::new("ToZebra").returns([zebra_ref, ShapeId::BOOL]));
    let query = shapes.declare_struct("Query");
    shapes.add_method(query, Method::new("node").returns([node]));
    let query_ref = shapes.pointer_to(query);

    let bound = bind(&schema, &shapes, query_ref);
    let node = child_object(&bound, &query_object(&bound).fields["node"]);
    let concrete: Vec<_> = node
        .type_assertions
        .iter()
        .map(|(name, assertion)| (name.as_str(), assertion.method_index))
        .collect();
    assert_eq!(concrete, [("Zebra", 2), ("Apple", 1)]);
}

#[test]
fn binds_unions() {
    let schema = parse(
        r#"
        type Human { name: String! }
        type Droid { name: String! }
        union SearchResult = Human | Droid
        type Query { search: [SearchResult!]! }
        "#,
    );
    let mut shapes = Shapes::new();
    let human = shapes.declare_struct("Human");
    shapes.add_method(human, Method::new("name").returns([ShapeId::STRING]));
    let human_ref = shapes.pointer_to(human);
    let droid = shapes.declare_struct("Droid");
    shapes.add_method(droid, Method::new("name").returns([ShapeId::STRING]));
    let droid_ref = shapes.pointer_to(droid);
    let result = shapes.declare_interface("SearchResult");
    shapes.add_method(result, Method::new("ToHuman").returns([human_ref, ShapeId::BOOL]));
    shapes.add_method(result, Method::new("ToDroid").returns([droid_ref, ShapeId::BOOL]));
    let results = shapes.slice_of(result);
    let query = shapes.declare_struct("Query");
    shapes.add_method(query, Method::new("search").returns([results]));
    let query_ref = shapes.pointer_to(query);

    let bound = bind(&schema, &shapes, query_ref);
    let search = &query_object(&bound).fields["search"];
    let list = bound.tree[search.value_exec].as_list().unwrap();
    let union_ = bound.tree.object(list.elem).unwrap();
    assert_eq!(union_.name, "SearchResult");
    assert!(union_.fields.is_empty());
    // Member order
    let members: Vec<_> = union_.type_assertions.keys().map(|name| name.as_str()).collect();
    assert_eq!(members, ["Human", "Droid"]);
    assert_eq!(union_.type_assertions["Human"].method_index, 0);
    assert_eq!(union_.type_assertions["Droid"].method_index, 1);
}

#[test]
fn interface_resolvers_need_no_assertions_with_field_resolvers() {
    let schema = parse(SDL);
    let characters = characters();

    let bound = bind_with_field_resolvers(&schema, &characters.shapes, characters.query_ref);
    let hero = child_object(&bound, &query_object(&bound).fields["hero"]);
    assert!(hero.type_assertions.is_empty());
    // Only Query and Character, plus String!
    assert_eq!(bound.tree.len(), 3);
}

#[test]
fn nullable_interfaces_require_pointers_or_interfaces() {
    let schema = parse(SDL);
    let mut shapes = Shapes::new();
    let human = shapes.declare_struct("Human");
    shapes.add_method(
        human,
        Method::new("name").value_receiver().returns([ShapeId::STRING]),
    );
    let query = shapes.declare_struct("Query");
    shapes.add_method(query, Method::new("hero").returns([human]));
    let query_ref = shapes.pointer_to(query);

    let err = bind_err(&schema, &shapes, query_ref);
    assert_eq!(
        err.to_string(),
        "Human is not a pointer or interface\n\tused by (&Query).hero"
    );
}
