//! End-to-end derivation and execution tests.
//!
//! Builds a small character-catalog schema from host descriptors, lowers it
//! and executes queries against it, exercising interfaces, unions, enums,
//! input objects, optional-argument coercion and query limits.

use std::sync::Arc;

use async_graphql::{Name, Value};
use typeforge_graphql::host::{
    typed_object, Coerced, ConstructorSpec, CtorParamSpec, EnumValueSpec, FieldSpec, HostRegistry,
    HostTypeSpec, MethodSpec, ParamSpec, TypeShape,
};
use typeforge_graphql::{lower, BuildSession, DeriveConfig, DeriveError, TypeRetriever};

fn luke() -> Value {
    typed_object(
        "Human",
        [
            ("name", Value::String("Luke".into())),
            (
                "friends",
                Value::List(vec![r2d2(), typed_object("Human", [("name", Value::String("Han".into()))])]),
            ),
        ],
    )
}

fn r2d2() -> Value {
    typed_object(
        "Droid",
        [
            ("name", Value::String("R2-D2".into())),
            ("primaryFunction", Value::String("Astromech".into())),
        ],
    )
}

/// A catalog with an interface, two implementors, a union, an enum, an
/// input object and a root query type.
fn catalog() -> HostRegistry {
    let mut host = HostRegistry::new();

    host.register(
        HostTypeSpec::interface("Character")
            .expose(true)
            .method(MethodSpec::new("getName", TypeShape::String).required()),
    );
    host.register(
        HostTypeSpec::new("Human")
            .implements("Character")
            .expose(true)
            .method(MethodSpec::new("getName", TypeShape::String).required())
            .method(MethodSpec::new(
                "getFriends",
                TypeShape::list(TypeShape::named("Character")),
            )),
    );
    host.register(
        HostTypeSpec::new("Droid")
            .implements("Character")
            .expose(true)
            .method(MethodSpec::new("getName", TypeShape::String).required())
            .method(MethodSpec::new("getPrimaryFunction", TypeShape::String)),
    );
    host.register(HostTypeSpec::union(
        "SearchResult",
        vec!["Human".into(), "Droid".into()],
    ));
    host.register(HostTypeSpec::enumeration(
        "Status",
        vec![EnumValueSpec::new("ACTIVE"), EnumValueSpec::new("RETIRED")],
    ));
    host.register(
        HostTypeSpec::new("Point").constructor(
            ConstructorSpec::new(vec![
                CtorParamSpec::new("x", TypeShape::Int),
                CtorParamSpec::new("y", TypeShape::Int),
            ])
            .construct(|_, args| {
                Ok(typed_object(
                    "Point",
                    [
                        ("x", args[0].clone().into_value()),
                        ("y", args[1].clone().into_value()),
                    ],
                ))
            }),
        ),
    );

    let mut hero = MethodSpec::new("hero", TypeShape::named("Character"))
        .invoke(|_, _| Ok(r2d2()));
    hero.is_static = true;

    let mut human = MethodSpec::new("human", TypeShape::named("Human"))
        .param(ParamSpec::new("id", TypeShape::Id))
        .invoke(|_, _| Ok(luke()));
    human.is_static = true;

    let mut search = MethodSpec::new(
        "search",
        TypeShape::list(TypeShape::named("SearchResult")),
    )
    .invoke(|_, _| Ok(Value::List(vec![luke(), r2d2()])));
    search.is_static = true;

    let mut greeting = MethodSpec::new("greeting", TypeShape::String)
        .param(ParamSpec::new(
            "name",
            TypeShape::optional(TypeShape::String),
        ))
        .invoke(|_, args| {
            Ok(Value::String(match &args[0] {
                Coerced::Null => "absent".into(),
                Coerced::Empty => "empty".into(),
                Coerced::Wrapped(v) | Coerced::Value(v) => format!("got {v}"),
            }))
        });
    greeting.is_static = true;

    let mut status = MethodSpec::new("status", TypeShape::named("Status"))
        .invoke(|_, _| Ok(Value::Enum(Name::new("ACTIVE"))));
    status.is_static = true;

    let mut sum = MethodSpec::new("sum", TypeShape::Int)
        .param(ParamSpec::new("point", TypeShape::named("Point")))
        .invoke(|_, args| {
            let Coerced::Value(Value::Object(map)) = &args[0] else {
                return Ok(Value::Null);
            };
            let get = |key: &str| match map.get(key) {
                Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
                _ => 0,
            };
            Ok(Value::from(get("x") + get("y")))
        });
    sum.is_static = true;

    host.register(
        HostTypeSpec::new("Query")
            .expose(true)
            .method(hero)
            .method(human)
            .method(search)
            .method(greeting)
            .method(status)
            .method(sum),
    );

    host
}

fn build_schema(config: &DeriveConfig) -> async_graphql::dynamic::Schema {
    let host = Arc::new(catalog());
    let retriever = TypeRetriever::new(Arc::clone(&host));
    let mut session = BuildSession::new();
    retriever.output_type(&mut session, "Query").unwrap();
    // The union is only reachable through `search`, already derived; the
    // enum through `status`.
    lower(&session, host, config, "Query", None).unwrap()
}

async fn execute(query: &str) -> Value {
    let schema = build_schema(&DeriveConfig::default());
    let response = schema.execute(query).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data
}

fn object(entries: Vec<(&str, Value)>) -> Value {
    let mut map = async_graphql::indexmap::IndexMap::new();
    for (key, value) in entries {
        map.insert(Name::new(key), value);
    }
    Value::Object(map)
}

#[tokio::test]
async fn scalar_fields_resolve_through_accessor_chase() {
    let data = execute(r#"{ human(id: "1") { name } }"#).await;
    assert_eq!(
        data,
        object(vec![(
            "human",
            object(vec![("name", Value::String("Luke".into()))])
        )])
    );
}

#[tokio::test]
async fn interface_values_resolve_their_concrete_type() {
    let data = execute(r#"{ hero { name ... on Droid { primaryFunction } } }"#).await;
    assert_eq!(
        data,
        object(vec![(
            "hero",
            object(vec![
                ("name", Value::String("R2-D2".into())),
                ("primaryFunction", Value::String("Astromech".into())),
            ])
        )])
    );
}

#[tokio::test]
async fn interface_lists_attach_concrete_types_per_element() {
    let data = execute(r#"{ human(id: "1") { friends { name } } }"#).await;
    let expected = object(vec![(
        "human",
        object(vec![(
            "friends",
            Value::List(vec![
                object(vec![("name", Value::String("R2-D2".into()))]),
                object(vec![("name", Value::String("Han".into()))]),
            ]),
        )]),
    )]);
    assert_eq!(data, expected);
}

#[tokio::test]
async fn union_members_resolve_in_declaration_order() {
    let data = execute(r#"{ search { __typename } }"#).await;
    assert_eq!(
        data,
        object(vec![(
            "search",
            Value::List(vec![
                object(vec![("__typename", Value::String("Human".into()))]),
                object(vec![("__typename", Value::String("Droid".into()))]),
            ])
        )])
    );
}

#[tokio::test]
async fn optional_arguments_distinguish_absent_from_null() {
    let data = execute(r#"{ greeting }"#).await;
    assert_eq!(data, object(vec![("greeting", Value::String("absent".into()))]));

    let data = execute(r#"{ greeting(name: null) }"#).await;
    assert_eq!(data, object(vec![("greeting", Value::String("empty".into()))]));

    let data = execute(r#"{ greeting(name: "Ada") }"#).await;
    assert_eq!(
        data,
        object(vec![("greeting", Value::String("got \"Ada\"".into()))])
    );
}

#[tokio::test]
async fn enum_fields_resolve_and_values_carry_descriptions() {
    let data = execute(r#"{ status }"#).await;
    assert_eq!(data, object(vec![("status", Value::Enum(Name::new("ACTIVE")))]));

    // Every enum value has a description, defaulting to its identifier.
    let schema = build_schema(&DeriveConfig::default());
    let response = schema
        .execute(r#"{ __type(name: "Status") { enumValues { name description } } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let json = serde_json::to_value(&response.data).unwrap();
    let values = json["__type"]["enumValues"].as_array().unwrap();
    assert_eq!(values.len(), 2);
    for value in values {
        assert_eq!(value["name"], value["description"]);
    }
}

#[tokio::test]
async fn input_objects_coerce_through_the_designated_constructor() {
    let data = execute(r#"{ sum(point: { x: 1, y: 2 }) }"#).await;
    assert_eq!(data, object(vec![("sum", Value::from(3))]));
}

#[tokio::test]
async fn input_type_is_registered_under_the_input_suffix() {
    let schema = build_schema(&DeriveConfig::default());
    let response = schema
        .execute(r#"{ __type(name: "PointInput") { kind inputFields { name } } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let json = serde_json::to_value(&response.data).unwrap();
    assert_eq!(json["__type"]["kind"], "INPUT_OBJECT");
    let fields = json["__type"]["inputFields"].as_array().unwrap();
    let names: Vec<_> = fields.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["x", "y"]);
}

#[tokio::test]
async fn disabling_introspection_rejects_schema_queries() {
    let mut config = DeriveConfig::default();
    config.introspection = false;
    let schema = build_schema(&config);
    let response = schema
        .execute(r#"{ __schema { queryType { name } } }"#)
        .await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn depth_limit_rejects_deep_queries() {
    let mut config = DeriveConfig::default();
    config.max_depth = 2;
    let schema = build_schema(&config);
    let response = schema
        .execute(r#"{ human(id: "1") { friends { name } } }"#)
        .await;
    assert!(!response.errors.is_empty());
}

#[test]
fn hyphenated_host_names_are_normalized_once() {
    let mut host = HostRegistry::new();
    host.register(
        HostTypeSpec::new("us-core")
            .expose(true)
            .field(FieldSpec::new("id", TypeShape::Id)),
    );
    let host = Arc::new(host);
    let retriever = TypeRetriever::new(Arc::clone(&host));
    let mut session = BuildSession::new();

    retriever.output_type(&mut session, "us-core").unwrap();
    assert!(session.contains_type("us_45_core"));
}

#[test]
fn repeated_retrieval_returns_the_identical_type_instance() {
    let host = Arc::new(catalog());
    let retriever = TypeRetriever::new(Arc::clone(&host));
    let mut session = BuildSession::new();

    retriever.output_type(&mut session, "Human").unwrap();
    let first = session.type_def("Human").unwrap();
    retriever.output_type(&mut session, "Human").unwrap();
    let second = session.type_def("Human").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn derivation_failure_propagates_a_descriptive_error() {
    let mut host = HostRegistry::new();
    host.register(
        HostTypeSpec::new("Broken")
            .expose(true)
            .field(FieldSpec::new("pet", TypeShape::named("Missing"))),
    );
    let retriever = TypeRetriever::new(Arc::new(host));
    let mut session = BuildSession::new();

    let err = retriever.output_type(&mut session, "Broken").unwrap_err();
    assert!(matches!(err, DeriveError::UnknownHostType { .. }));
    assert_eq!(session.type_count(), 0);
}
