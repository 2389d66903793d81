use std::sync::Arc;

use indexmap::IndexMap;
use resolvegate_planner::{
    empty_selection_set, new_field, parse_selection_set, print_selection_set, DelegationTarget,
    PlanError, SelectionSetFactory, StitchingInfo,
};
use resolvegate_schema::{ComposedSchema, SchemaError, ValuePath};
use value::Name;

fn target<'a>(source_field_name: &'a str, result: Option<&'a ValuePath>) -> DelegationTarget<'a> {
    DelegationTarget {
        source_type_name: "Query",
        source_field_name,
        source_selection_set: None,
        result,
        result_type: None,
        target_type_name: "Author",
        target_field_name: "books",
    }
}

fn build(factory: &SelectionSetFactory, subtree: &str) -> String {
    print_selection_set(&factory.build(parse_selection_set(subtree).unwrap()))
}

#[test]
fn merge_source_selection_set() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let factory = SelectionSetFactory::new(
        &schema,
        &StitchingInfo::default(),
        DelegationTarget {
            source_selection_set: Some("{ id author { id } }"),
            ..target("books", None)
        },
    )
    .unwrap();

    assert_eq!(
        build(&factory, "{ title author { name } }"),
        "{ id author { id name } title }"
    );
}

#[test]
fn wrap_along_result_path() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let path = ValuePath::parse("edges[0].node");
    let factory = SelectionSetFactory::new(
        &schema,
        &StitchingInfo::default(),
        target("bookConnection", Some(&path)),
    )
    .unwrap();

    assert_eq!(
        build(&factory, "{ title }"),
        "{ edges { node { ... on Book { title } } } }"
    );
}

#[test]
fn explicit_result_type() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let path = ValuePath::parse("edges.node");
    let factory = SelectionSetFactory::new(
        &schema,
        &StitchingInfo::default(),
        DelegationTarget {
            result_type: Some("Author"),
            ..target("bookConnection", Some(&path))
        },
    )
    .unwrap();
    assert_eq!(
        build(&factory, "{ name }"),
        "{ edges { node { ... on Author { name } } } }"
    );

    let path = ValuePath::parse("edges.cursor");
    let factory = SelectionSetFactory::new(
        &schema,
        &StitchingInfo::default(),
        target("bookConnection", Some(&path)),
    )
    .unwrap();
    assert_eq!(build(&factory, "{ title }"), "{ edges { cursor { title } } }");
}

#[test]
fn result_type_must_implement_abstract_type() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let path = ValuePath::parse("edges.node");
    let err = SelectionSetFactory::new(
        &schema,
        &StitchingInfo::default(),
        DelegationTarget {
            result_type: Some("Publisher"),
            ..target("bookConnection", Some(&path))
        },
    )
    .unwrap_err();

    assert!(matches!(
        &err,
        PlanError::Schema(SchemaError::NotImplemented { type_name, .. }) if type_name == "Publisher"
    ));
    assert_eq!(
        err.to_string(),
        "Query.bookConnection.edges.node doesn't implement Publisher."
    );
}

#[test]
fn stitch_required_fields() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let isbn = Arc::new(new_field("isbn", empty_selection_set()));
    let mut fields = IndexMap::new();
    fields.insert(Name::new("title"), vec![isbn]);
    let mut stitching_info = StitchingInfo::default();
    stitching_info
        .field_nodes_by_field
        .insert(Name::new("Book"), fields);

    let factory =
        SelectionSetFactory::new(&schema, &stitching_info, target("books", None)).unwrap();
    assert_eq!(build(&factory, "{ id title }"), "{ id title isbn }");
    assert_eq!(build(&factory, "{ title isbn }"), "{ title isbn }");
    assert_eq!(build(&factory, "{ id }"), "{ id }");
}

#[test]
fn unknown_source_field() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    assert!(matches!(
        SelectionSetFactory::new(&schema, &StitchingInfo::default(), target("authors", None)),
        Err(PlanError::Schema(SchemaError::UnknownField { .. }))
    ));
}
