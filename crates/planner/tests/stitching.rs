use std::sync::Arc;

use indexmap::IndexMap;
use resolvegate_planner::{
    complete_stitching_info, field_selection_set, parse_selection_set, print_field,
    DynamicSelectionSet, FieldNode, FieldSelectionSet, MergedTypeInfo, StitchingInfo, Subschema,
};
use resolvegate_schema::ComposedSchema;
use value::Name;

const BOOKS_SCHEMA: &str = r#"
    type Book {
        id: ID!
        title: String
        isbn: String
        author: Author
    }

    type Author {
        id: ID!
    }
"#;

fn printed(nodes: &[FieldNode]) -> Vec<String> {
    nodes.iter().map(|node| print_field(&node.node)).collect()
}

fn stitching_info() -> StitchingInfo {
    let books = Arc::new(Subschema {
        name: "Books".to_string(),
        schema: Arc::new(ComposedSchema::parse(BOOKS_SCHEMA).unwrap()),
    });
    let mut field_selection_sets = IndexMap::new();
    field_selection_sets.insert(
        Name::new("title"),
        parse_selection_set("{ isbn }").unwrap(),
    );

    let mut info = StitchingInfo::default();
    info.merged_types.insert(
        Name::new("Book"),
        MergedTypeInfo {
            selection_sets: vec![(books.clone(), parse_selection_set("{ id }").unwrap())],
            field_selection_sets: vec![(books, field_selection_sets)],
        },
    );
    info
}

#[test]
fn index_merged_types() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let no_resolvers: Vec<(&str, &str, &FieldSelectionSet)> = Vec::new();
    let info = complete_stitching_info(stitching_info(), no_resolvers, &schema).unwrap();

    assert_eq!(
        info.field_nodes_by_type.keys().map(|name| name.as_str()).collect::<Vec<_>>(),
        vec!["Query", "Mutation"]
    );
    assert_eq!(printed(info.field_nodes("Book", "id")), Vec::<String>::new());
    assert_eq!(
        printed(info.field_nodes("Book", "title")),
        vec!["__typename", "id", "isbn"]
    );
    assert_eq!(
        printed(info.field_nodes("Book", "author")),
        vec!["__typename", "id"]
    );
    assert!(Arc::ptr_eq(
        &info.field_nodes("Book", "title")[1],
        &info.field_nodes("Book", "author")[1]
    ));
}

#[test]
fn index_resolver_selection_sets() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let static_selection_set = FieldSelectionSet::Static("{ id name id }".to_string());
    let dynamic_selection_set =
        FieldSelectionSet::Dynamic(DynamicSelectionSet::new(|_| field_selection_set("id")));
    let unknown = FieldSelectionSet::Static("{ id }".to_string());

    let info = complete_stitching_info(
        stitching_info(),
        vec![
            ("Author", "books", &static_selection_set),
            ("Author", "name", &dynamic_selection_set),
            ("Missing", "field", &unknown),
            ("SearchResult", "field", &unknown),
        ],
        &schema,
    )
    .unwrap();

    assert_eq!(printed(info.field_nodes("Author", "books")), vec!["id", "name"]);
    assert!(Arc::ptr_eq(
        &info.field_nodes("Author", "books")[0],
        &info.field_nodes("Book", "title")[1]
    ));
    assert_eq!(info.dynamic_selection_sets_by_field["Author"]["name"].len(), 1);
    assert!(!info.field_nodes_by_field.contains_key("Missing"));
    assert!(!info.field_nodes_by_field.contains_key("SearchResult"));
}

#[test]
fn invalid_resolver_selection_set() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let invalid = FieldSelectionSet::Static("{ id".to_string());
    assert!(complete_stitching_info(
        StitchingInfo::default(),
        vec![("Author", "books", &invalid)],
        &schema
    )
    .is_err());
}
