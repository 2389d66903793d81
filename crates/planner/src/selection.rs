use std::fmt::{self, Display, Formatter, Write};

use parser::types::{
    DocumentOperations, Field, InlineFragment, Selection, SelectionSet, TypeCondition,
};
use parser::{Pos, Positioned};
use value::{Name, Value};

use crate::PlanError;

/// Parses selection-set text such as `{ id author { name } }`.
pub fn parse_selection_set(source: &str) -> Result<SelectionSet, PlanError> {
    let document = parser::parse_query(source)?;
    match document.operations {
        DocumentOperations::Single(operation) => Ok(operation.node.selection_set.node),
        DocumentOperations::Multiple(_) => Err(PlanError::NotASelectionSet {
            source_text: source.to_string(),
        }),
    }
}

#[inline]
pub fn empty_selection_set() -> SelectionSet {
    SelectionSet { items: Vec::new() }
}

/// Builds a selection set with a single field, e.g. `{ id }`.
pub fn field_selection_set(name: &str) -> SelectionSet {
    wrap_in_field(name, empty_selection_set())
}

/// Returns `{ name <selection_set> }`.
pub fn wrap_in_field(name: &str, selection_set: SelectionSet) -> SelectionSet {
    SelectionSet {
        items: vec![Positioned::new(
            Selection::Field(new_field(name, selection_set)),
            Pos::default(),
        )],
    }
}

pub fn new_field(name: &str, selection_set: SelectionSet) -> Positioned<Field> {
    Positioned::new(
        Field {
            alias: None,
            name: Positioned::new(Name::new(name), Pos::default()),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: Positioned::new(selection_set, Pos::default()),
        },
        Pos::default(),
    )
}

/// Returns `{ ... on TypeName <selection_set> }`.
pub fn wrap_in_inline_fragment(type_name: &str, selection_set: SelectionSet) -> SelectionSet {
    SelectionSet {
        items: vec![Positioned::new(
            Selection::InlineFragment(Positioned::new(
                InlineFragment {
                    type_condition: Some(Positioned::new(
                        TypeCondition {
                            on: Positioned::new(Name::new(type_name), Pos::default()),
                        },
                        Pos::default(),
                    )),
                    directives: Vec::new(),
                    selection_set: Positioned::new(selection_set, Pos::default()),
                },
                Pos::default(),
            )),
            Pos::default(),
        )],
    }
}

/// Union of two selection sets. Fields with the same response key are merged
/// recursively, inline fragments with the same type condition likewise.
pub fn merge_selection_sets(a: &SelectionSet, b: &SelectionSet) -> SelectionSet {
    let mut merged = a.clone();
    for selection in &b.items {
        merge_selection(&mut merged.items, selection);
    }
    merged
}

fn merge_selection(items: &mut Vec<Positioned<Selection>>, selection: &Positioned<Selection>) {
    let existing = items.iter_mut().find_map(|item| match (&mut item.node, &selection.node) {
        (Selection::Field(existing), Selection::Field(field))
            if existing.node.response_key().node == field.node.response_key().node =>
        {
            Some(&mut existing.node.selection_set.node)
        }
        (Selection::InlineFragment(existing), Selection::InlineFragment(fragment))
            if type_condition(&existing.node) == type_condition(&fragment.node) =>
        {
            Some(&mut existing.node.selection_set.node)
        }
        _ => None,
    });

    match (existing, &selection.node) {
        (Some(existing), Selection::Field(field)) => {
            for sub_selection in &field.node.selection_set.node.items {
                merge_selection(&mut existing.items, sub_selection);
            }
        }
        (Some(existing), Selection::InlineFragment(fragment)) => {
            for sub_selection in &fragment.node.selection_set.node.items {
                merge_selection(&mut existing.items, sub_selection);
            }
        }
        (_, Selection::FragmentSpread(spread)) => {
            let duplicated = items.iter().any(|item| {
                matches!(&item.node, Selection::FragmentSpread(existing)
                    if existing.node.fragment_name.node == spread.node.fragment_name.node)
            });
            if !duplicated {
                items.push(selection.clone());
            }
        }
        (_, _) => items.push(selection.clone()),
    }
}

fn type_condition(fragment: &InlineFragment) -> Option<&str> {
    fragment
        .type_condition
        .as_ref()
        .map(|condition| condition.node.on.node.as_str())
}

pub fn selection_set_contains_top_level_field(selection_set: &SelectionSet, name: &str) -> bool {
    selection_set.items.iter().any(|selection| {
        matches!(&selection.node, Selection::Field(field) if field.node.name.node.as_str() == name)
    })
}

/// Displays a selection set as compact GraphQL text.
pub struct PrintSelectionSet<'a>(pub &'a SelectionSet);

impl<'a> Display for PrintSelectionSet<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_selection_set(f, self.0)
    }
}

#[inline]
pub fn print_selection_set(selection_set: &SelectionSet) -> String {
    PrintSelectionSet(selection_set).to_string()
}

/// Prints a single field node; used as its textual identity.
pub fn print_field(field: &Field) -> String {
    let mut output = String::new();
    let _ = write_field(&mut output, field);
    output
}

fn write_selection_set<W: Write>(w: &mut W, selection_set: &SelectionSet) -> fmt::Result {
    w.write_char('{')?;
    for selection in &selection_set.items {
        w.write_char(' ')?;
        match &selection.node {
            Selection::Field(field) => write_field(w, &field.node)?,
            Selection::FragmentSpread(spread) => {
                write!(w, "...{}", spread.node.fragment_name.node)?;
                write_directives(w, &spread.node.directives)?;
            }
            Selection::InlineFragment(fragment) => {
                w.write_str("...")?;
                if let Some(type_condition) = type_condition(&fragment.node) {
                    write!(w, " on {}", type_condition)?;
                }
                write_directives(w, &fragment.node.directives)?;
                w.write_char(' ')?;
                write_selection_set(w, &fragment.node.selection_set.node)?;
            }
        }
    }
    w.write_str(" }")
}

fn write_field<W: Write>(w: &mut W, field: &Field) -> fmt::Result {
    if let Some(alias) = &field.alias {
        write!(w, "{}: ", alias.node)?;
    }
    w.write_str(&field.name.node)?;
    write_arguments(w, &field.arguments)?;
    write_directives(w, &field.directives)?;
    if !field.selection_set.node.items.is_empty() {
        w.write_char(' ')?;
        write_selection_set(w, &field.selection_set.node)?;
    }
    Ok(())
}

fn write_arguments<W: Write>(
    w: &mut W,
    arguments: &[(Positioned<Name>, Positioned<Value>)],
) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    w.write_char('(')?;
    for (idx, (name, value)) in arguments.iter().enumerate() {
        if idx > 0 {
            w.write_str(", ")?;
        }
        write!(w, "{}: {}", name.node, value.node)?;
    }
    w.write_char(')')
}

fn write_directives<W: Write>(
    w: &mut W,
    directives: &[Positioned<parser::types::Directive>],
) -> fmt::Result {
    for directive in directives {
        write!(w, " @{}", directive.node.name.node)?;
        write_arguments(w, &directive.node.arguments)?;
    }
    Ok(())
}
