#![forbid(unsafe_code)]

mod collect;
mod error;
mod factory;
mod selection;
mod stitching;
mod type_path;

pub use collect::{collect_fields, Fragments};
pub use error::PlanError;
pub use factory::{DelegationTarget, SelectionSetFactory};
pub use selection::{
    empty_selection_set, field_selection_set, merge_selection_sets, new_field,
    parse_selection_set, print_field, print_selection_set, selection_set_contains_top_level_field,
    wrap_in_field, wrap_in_inline_fragment, PrintSelectionSet,
};
pub use stitching::{
    complete_stitching_info, DynamicSelectionSet, FieldNode, FieldSelectionSet, MergedTypeInfo,
    StitchingInfo, Subschema,
};
pub use type_path::type_by_path;
