use parser::types::{BaseType, Type};

/// Whether a field yields one value or a list of values.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FieldKind {
    Single,
    List,
}

impl FieldKind {
    #[inline]
    pub fn is_list(self) -> bool {
        matches!(self, FieldKind::List)
    }
}

pub trait TypeExt {
    fn concrete_typename(&self) -> &str;
    fn is_list(&self) -> bool;
    fn field_kind(&self) -> FieldKind;
}

impl TypeExt for Type {
    fn concrete_typename(&self) -> &str {
        match &self.base {
            BaseType::Named(name) => name.as_str(),
            BaseType::List(ty) => ty.concrete_typename(),
        }
    }

    /// Nullability is not part of the kind: `[T]!` is a list just like `[T]`.
    fn is_list(&self) -> bool {
        matches!(self.base, BaseType::List(_))
    }

    fn field_kind(&self) -> FieldKind {
        if self.is_list() {
            FieldKind::List
        } else {
            FieldKind::Single
        }
    }
}
