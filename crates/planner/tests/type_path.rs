use resolvegate_planner::type_by_path;
use resolvegate_schema::{ComposedSchema, SchemaError, ValuePath};

#[test]
fn follow_paths() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let connection = schema.field("Query", "bookConnection").unwrap();

    let ty = type_by_path(&schema, &connection.ty, &ValuePath::parse("edges[0].node")).unwrap();
    assert_eq!(ty.name.as_str(), "Node");

    let ty = type_by_path(&schema, &connection.ty, &ValuePath::parse("edges.cursor")).unwrap();
    assert_eq!(ty.name.as_str(), "String");

    let books = schema.field("Query", "books").unwrap();
    let ty = type_by_path(&schema, &books.ty, &ValuePath::parse("0.author")).unwrap();
    assert_eq!(ty.name.as_str(), "Author");
}

#[test]
fn invalid_paths() {
    let schema = ComposedSchema::parse(include_str!("test.graphql")).unwrap();
    let book = schema.field("Query", "book").unwrap();

    assert_eq!(
        type_by_path(&schema, &book.ty, &ValuePath::parse("publisher")).unwrap_err(),
        SchemaError::UnknownField {
            type_name: "Book".to_string(),
            field_name: "publisher".to_string(),
        }
    );
    assert_eq!(
        type_by_path(&schema, &book.ty, &ValuePath::parse("author.id.value")).unwrap_err(),
        SchemaError::InvalidPath {
            type_name: "ID".to_string(),
            path: "value".to_string(),
        }
    );
}
