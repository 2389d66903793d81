use indexmap::{IndexMap, IndexSet};
use parser::types::{
    ConstDirective, FieldDefinition, SchemaDefinition, ServiceDocument, Type, TypeDefinition,
    TypeSystemDefinition,
};
use value::{ConstValue, Name};

use super::error::SchemaError;
use super::type_ext::TypeExt;

/// A field of an object or interface type.
#[derive(Debug, Clone)]
pub struct MetaField {
    pub name: Name,
    pub ty: Type,
    pub directives: Vec<ConstDirective>,

    /// Arbitrary per-field data attached by schema transforms.
    pub extensions: IndexMap<String, ConstValue>,
}

impl MetaField {
    /// Occurrences of a directive, in the order they are written.
    pub fn directives_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ConstDirective> + 'a {
        self.directives
            .iter()
            .filter(move |directive| directive.name.node.as_str() == name)
    }

    #[inline]
    pub fn has_extension(&self, key: &str) -> bool {
        self.extensions.contains_key(key)
    }
}

impl From<FieldDefinition> for MetaField {
    fn from(definition: FieldDefinition) -> Self {
        Self {
            name: definition.name.node,
            ty: definition.ty.node,
            directives: definition
                .directives
                .into_iter()
                .map(|directive| directive.node)
                .collect(),
            extensions: IndexMap::new(),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

#[derive(Debug, Clone)]
pub struct MetaType {
    pub name: Name,
    pub kind: TypeKind,
    pub implements: IndexSet<Name>,
    pub fields: IndexMap<Name, MetaField>,

    /// Union members, or the object types implementing an interface.
    pub possible_types: IndexSet<Name>,
}

impl MetaType {
    fn new(name: Name, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            implements: IndexSet::new(),
            fields: IndexMap::new(),
            possible_types: IndexSet::new(),
        }
    }

    fn from_definition(definition: TypeDefinition) -> Self {
        use parser::types::TypeKind as Kind;

        let name = definition.name.node;
        let fields = |fields: Vec<parser::Positioned<FieldDefinition>>| {
            fields
                .into_iter()
                .map(|field| (field.node.name.node.clone(), MetaField::from(field.node)))
                .collect::<IndexMap<_, _>>()
        };
        let names = |names: Vec<parser::Positioned<Name>>| {
            names.into_iter().map(|name| name.node).collect::<IndexSet<_>>()
        };

        match definition.kind {
            Kind::Object(object) => Self {
                implements: names(object.implements),
                fields: fields(object.fields),
                ..Self::new(name, TypeKind::Object)
            },
            Kind::Interface(interface) => Self {
                implements: names(interface.implements),
                fields: fields(interface.fields),
                ..Self::new(name, TypeKind::Interface)
            },
            Kind::Union(union) => Self {
                possible_types: names(union.members),
                ..Self::new(name, TypeKind::Union)
            },
            Kind::Scalar => Self::new(name, TypeKind::Scalar),
            Kind::Enum(_) => Self::new(name, TypeKind::Enum),
            Kind::InputObject(_) => Self::new(name, TypeKind::InputObject),
        }
    }

    /// Folds an `extend type` definition into this type.
    fn extend(&mut self, extension: MetaType) {
        self.implements.extend(extension.implements);
        self.fields.extend(extension.fields);
        self.possible_types.extend(extension.possible_types);
    }

    #[inline]
    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, TypeKind::Enum | TypeKind::Scalar)
    }

    /// Object and interface types expose fields; unions and leaves do not.
    #[inline]
    pub fn has_fields(&self) -> bool {
        matches!(self.kind, TypeKind::Object | TypeKind::Interface)
    }

    /// Whether a value of `type_name` can appear where this type is expected.
    pub fn is_possible_type(&self, type_name: &str) -> bool {
        match self.kind {
            TypeKind::Object => self.name == type_name,
            TypeKind::Interface | TypeKind::Union => self.possible_types.contains(type_name),
            _ => false,
        }
    }
}

const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

/// The merged schema handed over by the stitching runtime.
#[derive(Debug, Default, Clone)]
pub struct ComposedSchema {
    pub(crate) query_type: Option<Name>,
    pub(crate) mutation_type: Option<Name>,
    pub(crate) subscription_type: Option<Name>,
    pub(crate) types: IndexMap<Name, MetaType>,
}

impl ComposedSchema {
    pub fn parse(document: &str) -> parser::Result<ComposedSchema> {
        Ok(Self::new(parser::parse_schema(document)?))
    }

    pub fn new(document: ServiceDocument) -> ComposedSchema {
        let mut schema = ComposedSchema::default();
        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(definition) => schema.set_root_types(definition.node),
                TypeSystemDefinition::Type(definition) => {
                    let extend = definition.node.extend;
                    schema.add_type(MetaType::from_definition(definition.node), extend);
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }
        schema.add_builtin_scalars();
        schema.link_interfaces();
        schema
    }

    fn set_root_types(&mut self, definition: SchemaDefinition) {
        let root = |name: Option<parser::Positioned<Name>>| name.map(|name| name.node);
        self.query_type = root(definition.query).or(self.query_type.take());
        self.mutation_type = root(definition.mutation).or(self.mutation_type.take());
        self.subscription_type = root(definition.subscription).or(self.subscription_type.take());
    }

    fn add_type(&mut self, ty: MetaType, extend: bool) {
        match self.types.get_mut(&ty.name) {
            Some(existing) if extend => existing.extend(ty),
            _ => {
                self.types.insert(ty.name.clone(), ty);
            }
        }
    }

    fn add_builtin_scalars(&mut self) {
        for name in BUILTIN_SCALARS {
            self.types
                .entry(Name::new(name))
                .or_insert_with(|| MetaType::new(Name::new(name), TypeKind::Scalar));
        }
    }

    /// Records every implementing type as a possible type of its interfaces.
    fn link_interfaces(&mut self) {
        let implementations = self
            .types
            .values()
            .filter(|ty| ty.has_fields())
            .flat_map(|ty| {
                ty.implements
                    .iter()
                    .map(move |interface| (interface.clone(), ty.name.clone()))
            })
            .collect::<Vec<_>>();

        for (interface, implementation) in implementations {
            if let Some(ty) = self.types.get_mut(&interface) {
                if ty.kind == TypeKind::Interface {
                    ty.possible_types.insert(implementation);
                }
            }
        }
    }

    fn root_type_or<'a>(&'a self, root: &'a Option<Name>, default: &'static str) -> Option<&'a str> {
        match root {
            Some(name) => Some(name.as_str()),
            None => self.types.contains_key(default).then_some(default),
        }
    }

    #[inline]
    pub fn query_type(&self) -> &str {
        self.query_type.as_ref().map_or("Query", Name::as_str)
    }

    #[inline]
    pub fn mutation_type(&self) -> Option<&str> {
        self.root_type_or(&self.mutation_type, "Mutation")
    }

    #[inline]
    pub fn subscription_type(&self) -> Option<&str> {
        self.root_type_or(&self.subscription_type, "Subscription")
    }

    #[inline]
    pub fn type_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    /// Types in declaration order, followed by the built-in scalars the
    /// document did not declare.
    #[inline]
    pub fn types(&self) -> impl Iterator<Item = &MetaType> {
        self.types.values()
    }

    /// The named type at the bottom of `ty`'s list and non-null wrappers.
    pub fn concrete_type_by_name(&self, ty: &Type) -> Option<&MetaType> {
        self.types.get(ty.concrete_typename())
    }

    #[inline]
    pub fn is_leaf_type(&self, name: &str) -> bool {
        self.types.get(name).map_or(false, MetaType::is_leaf)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Result<&MetaField, SchemaError> {
        let ty = self
            .type_by_name(type_name)
            .ok_or_else(|| SchemaError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        ty.field_by_name(field_name)
            .ok_or_else(|| SchemaError::UnknownField {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            })
    }

    /// Whether `maybe_sub_type` is a possible runtime type of `abstract_type`.
    pub fn is_sub_type(&self, abstract_type: &MetaType, maybe_sub_type: &MetaType) -> bool {
        match abstract_type.kind {
            TypeKind::Union => abstract_type.possible_types.contains(&maybe_sub_type.name),
            TypeKind::Interface => {
                abstract_type.possible_types.contains(&maybe_sub_type.name)
                    || maybe_sub_type.implements.contains(&abstract_type.name)
            }
            _ => false,
        }
    }

    /// Visits every field of every object and interface type in declaration
    /// order, allowing the visitor to rewrite it in place.
    pub fn map_composite_fields<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Name, &mut MetaField) -> Result<(), E>,
    {
        for ty in self.types.values_mut().filter(|ty| ty.has_fields()) {
            for field in ty.fields.values_mut() {
                f(&ty.name, field)?;
            }
        }
        Ok(())
    }
}
