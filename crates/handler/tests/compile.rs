use resolvegate_handler::{
    parse_literal, CompileError, DirectiveCompiler, FieldNodeType, OrderDirection,
    ResolveToByTransform, ResolverMap, CONDITION_RESOLVERS,
};
use resolvegate_planner::{print_field, PlanError, StitchingInfo};
use resolvegate_schema::{ComposedSchema, FieldKind};
use value::{value, ConstValue, Name};

fn schema() -> ComposedSchema {
    ComposedSchema::parse(include_str!("test.graphql")).unwrap()
}

fn is_compiled(schema: &ComposedSchema, type_name: &str, field_name: &str) -> bool {
    schema
        .field(type_name, field_name)
        .unwrap()
        .has_extension(CONDITION_RESOLVERS)
}

#[test]
fn literal_enums_become_strings() {
    let literal = ConstValue::Object(
        [
            (Name::new("direction"), ConstValue::Enum(Name::new("desc"))),
            (
                Name::new("nested"),
                ConstValue::List(vec![ConstValue::Enum(Name::new("ASC")), value!(1)]),
            ),
        ]
        .into_iter()
        .collect(),
    );
    assert_eq!(
        parse_literal(&literal),
        value!({ "direction": "desc", "nested": ["ASC", 1] })
    );
}

#[test]
fn compile_in_declaration_order() {
    let mut schema = schema();
    let conditions = DirectiveCompiler::default().compile(&mut schema).unwrap();

    assert_eq!(
        conditions
            .iter()
            .map(|condition| format!("{}.{}", condition.type_name, condition.field_name))
            .collect::<Vec<_>>(),
        vec![
            "Subscription.bookAdded",
            "Book.author",
            "Author.books",
            "Author.favoriteBook",
            "Author.translations",
            "Author.searchResults",
            "Author.node",
        ]
    );

    let books = &conditions[2];
    assert_eq!(books.field_kind, FieldKind::List);
    let args = books.resolvers[0].args();
    assert_eq!(args.source_name, "Books");
    assert_eq!(args.order_by_direction, OrderDirection::Desc);
    assert_eq!(args.target_type_name, "Author");
    assert_eq!(args.target_field_name, "books");
    assert_eq!(args.target_field_node_type, FieldNodeType::ListType);
    assert_eq!(args.source_args, Some(value!({ "authorId": "{root.id}" })));

    let favorite_book = &conditions[3];
    assert_eq!(favorite_book.field_kind, FieldKind::Single);
    assert_eq!(favorite_book.resolvers.len(), 2);
    assert_eq!(
        favorite_book.resolvers[1].args().key_field.as_deref(),
        Some("favoriteBookId")
    );
    assert_eq!(
        favorite_book.resolvers[0].args().target_field_node_type,
        FieldNodeType::NamedType
    );
    assert_eq!(
        favorite_book.resolvers[1].args().order_by_direction,
        OrderDirection::Asc
    );
}

#[test]
fn compiled_fields_are_marked() {
    let mut schema = schema();
    DirectiveCompiler::default().compile(&mut schema).unwrap();

    assert!(is_compiled(&schema, "Author", "favoriteBook"));
    assert!(!is_compiled(&schema, "Author", "name"));

    let marker = schema
        .field("Author", "favoriteBook")
        .unwrap()
        .extensions
        .get(CONDITION_RESOLVERS)
        .unwrap();
    match marker {
        ConstValue::List(occurrences) => {
            assert_eq!(occurrences.len(), 2);
            match &occurrences[0] {
                ConstValue::Object(args) => {
                    assert_eq!(args.get("sourceFieldName"), Some(&value!("book")));
                    assert_eq!(args.get("targetFieldNodeType"), Some(&value!("NamedType")));
                }
                _ => panic!("expected an object"),
            }
        }
        _ => panic!("expected a list"),
    }

    // A second pass leaves marked fields alone.
    let conditions = DirectiveCompiler::default().compile(&mut schema).unwrap();
    assert!(conditions.is_empty());
}

#[test]
fn missing_required_argument() {
    let mut schema = ComposedSchema::parse(
        r#"
        type Query { a: Int }
        type T { f: Int @resolveToBy(sourceTypeName: "Query", sourceFieldName: "a") }
        "#,
    )
    .unwrap();
    let err = DirectiveCompiler::default().compile(&mut schema).unwrap_err();
    match err {
        CompileError::InvalidArguments {
            type_name,
            field_name,
            ..
        } => {
            assert_eq!(type_name, "T");
            assert_eq!(field_name, "f");
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn source_args_must_be_strings() {
    let mut schema = ComposedSchema::parse(
        r#"
        type Query { a(input: Int): Int }
        type T {
          f: Int @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "a", sourceArgs: { input: { id: 1 } })
        }
        "#,
    )
    .unwrap();
    let err = DirectiveCompiler::default().compile(&mut schema).unwrap_err();
    match err {
        CompileError::InvalidSourceArg { path, value, .. } => {
            assert_eq!(path, "input.id");
            assert_eq!(value, value!(1));
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn invalid_condition() {
    let mut schema = ComposedSchema::parse(
        r#"
        type Query { a: Int }
        type T {
          f: Int @resolveToBy(condition: "root. ==", sourceName: "S", sourceTypeName: "Query", sourceFieldName: "a")
        }
        "#,
    )
    .unwrap();
    let err = DirectiveCompiler::default().compile(&mut schema).unwrap_err();
    match err {
        CompileError::Expression { source_text, .. } => assert_eq!(source_text, "root. =="),
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn transform_without_stitching_info() {
    let plan = ResolveToByTransform.transform_schema(schema(), None).unwrap();
    assert!(plan.resolvers.is_empty());
    assert!(!is_compiled(&plan.schema, "Author", "books"));
}

#[test]
fn transform_builds_resolvers() {
    let plan = ResolveToByTransform
        .transform_schema(schema(), Some(StitchingInfo::default()))
        .unwrap();
    assert_eq!(plan.resolvers.len(), 7);
    assert!(is_compiled(&plan.schema, "Author", "books"));

    let selection_set = |type_name: &str, field_name: &str| {
        plan.resolvers
            .get(type_name, field_name)
            .unwrap()
            .selection_set()
            .map(ToString::to_string)
    };
    assert_eq!(selection_set("Author", "books").as_deref(), Some("{ id }"));
    assert_eq!(
        selection_set("Author", "favoriteBook").as_deref(),
        Some("{ country favoriteBookId }")
    );
    assert_eq!(selection_set("Book", "author").as_deref(), Some("{ authorId }"));
    assert_eq!(selection_set("Author", "translations"), None);

    let field_nodes = |type_name: &str, field_name: &str| {
        plan.stitching_info
            .field_nodes(type_name, field_name)
            .iter()
            .map(|field| print_field(&field.node))
            .collect::<Vec<_>>()
    };
    assert_eq!(
        field_nodes("Author", "favoriteBook"),
        vec!["country", "favoriteBookId"]
    );
    assert_eq!(field_nodes("Book", "author"), vec!["authorId"]);
    assert!(field_nodes("Author", "translations").is_empty());
    assert!(plan
        .stitching_info
        .field_nodes_by_type
        .get("Query")
        .unwrap()
        .iter()
        .any(|field| field.node.name.node.as_str() == "__typename"));
}

#[test]
fn plan_versions_increase() {
    let first = ResolveToByTransform
        .transform_schema(schema(), Some(StitchingInfo::default()))
        .unwrap();
    let second = ResolveToByTransform
        .transform_schema(schema(), Some(StitchingInfo::default()))
        .unwrap();
    assert!(second.version > first.version);
}

#[test]
fn invalid_required_selection_set() {
    let err = ResolveToByTransform
        .transform_schema(
            ComposedSchema::parse(
                r#"
                type Query { a: Int }
                type T {
                  id: ID
                  f: Int @resolveToBy(requiredSelectionSet: "{ id", sourceName: "S", sourceTypeName: "Query", sourceFieldName: "a")
                }
                "#,
            )
            .unwrap(),
            Some(StitchingInfo::default()),
        )
        .unwrap_err();
    assert!(matches!(err, CompileError::Plan(PlanError::Syntax(_))));
}

#[test]
fn merge_resolver_maps() {
    let compile = |source_field_name: &str| {
        let mut schema = ComposedSchema::parse(&format!(
            r#"
            type Query {{ a: Int b: Int }}
            type T {{
              f: Int @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "{}")
              g: Int @resolveToBy(sourceName: "S", sourceTypeName: "Query", sourceFieldName: "a")
            }}
            "#,
            source_field_name
        ))
        .unwrap();
        let mut resolvers = ResolverMap::new();
        for condition in DirectiveCompiler::default().compile(&mut schema).unwrap() {
            resolvers.insert(resolvegate_handler::FieldResolver::new(condition).unwrap());
        }
        resolvers
    };

    let mut resolvers = compile("a");
    resolvers.merge(compile("b"));
    assert_eq!(resolvers.len(), 2);
    assert_eq!(
        resolvers.get("T", "f").unwrap().condition().resolvers[0]
            .args()
            .source_field_name,
        "b"
    );
    assert!(resolvers.get("T", "h").is_none());
}
