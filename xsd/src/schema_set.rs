use std::collections::HashSet;

use indexmap::IndexMap;

use super::{
    attribute_decl::AttributeDeclaration,
    attribute_group_def::AttributeGroupDefinition,
    element_decl::ElementDeclaration,
    error::XsdError,
    import::{Import, ImportError, ImportResolver},
    model_group_def::ModelGroupDefinition,
    schema::{Schema, TopLevelComponent},
    xstypes::{AnyURI, QName},
    ComplexTypeDefinition, SimpleTypeDefinition,
};

/// The global components of a schema and everything it imports or includes, keyed by their
/// qualified names. Each table keeps declaration order.
#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    pub target_namespace: Option<AnyURI>,
    simple_types: IndexMap<QName, SimpleTypeDefinition>,
    complex_types: IndexMap<QName, ComplexTypeDefinition>,
    elements: IndexMap<QName, ElementDeclaration>,
    attributes: IndexMap<QName, AttributeDeclaration>,
    attribute_groups: IndexMap<QName, AttributeGroupDefinition>,
    groups: IndexMap<QName, ModelGroupDefinition>,
    resolved_locations: HashSet<String>,
}

/// Access to the lookup table of one kind of global component. Intended for internal use.
pub trait Lookup<C> {
    const KIND: &'static str;

    fn table(&self) -> &IndexMap<QName, C>;
    fn table_mut(&mut self) -> &mut IndexMap<QName, C>;
}

macro_rules! lookup_impl {
    ($type_name:ty, $field_name:ident, $kind:literal) => {
        impl Lookup<$type_name> for SchemaSet {
            const KIND: &'static str = $kind;

            fn table(&self) -> &IndexMap<QName, $type_name> {
                &self.$field_name
            }

            fn table_mut(&mut self) -> &mut IndexMap<QName, $type_name> {
                &mut self.$field_name
            }
        }
    };
}

lookup_impl!(SimpleTypeDefinition, simple_types, "simple type");
lookup_impl!(ComplexTypeDefinition, complex_types, "complex type");
lookup_impl!(ElementDeclaration, elements, "element");
lookup_impl!(AttributeDeclaration, attributes, "attribute");
lookup_impl!(AttributeGroupDefinition, attribute_groups, "attribute group");
lookup_impl!(ModelGroupDefinition, groups, "group");

impl SchemaSet {
    /// Collects the components of `schema` and, recursively, of its imports and includes.
    ///
    /// Every import is offered to the resolvers in order; imports that no resolver supports are
    /// skipped with a warning.
    pub fn compile(schema: Schema, resolvers: &[&dyn ImportResolver]) -> Result<Self, XsdError> {
        let mut set = Self {
            target_namespace: schema.target_namespace.clone(),
            ..Default::default()
        };
        set.add_schema(schema, resolvers)?;
        Ok(set)
    }

    /// A schema set without import resolution
    pub fn from_schema(schema: Schema) -> Result<Self, XsdError> {
        Self::compile(schema, &[])
    }

    fn add_schema(
        &mut self,
        schema: Schema,
        resolvers: &[&dyn ImportResolver],
    ) -> Result<(), XsdError> {
        let Schema {
            imports,
            components,
            ..
        } = schema;

        for component in components {
            match component {
                TopLevelComponent::SimpleType(c) => {
                    let name = c.qualified_name();
                    self.insert_type(name, c)?
                }
                TopLevelComponent::ComplexType(c) => {
                    let name = c.qualified_name();
                    self.insert_type(name, c)?
                }
                TopLevelComponent::Element(c) => {
                    let name = c.qualified_name();
                    self.insert(name, c)?
                }
                TopLevelComponent::Attribute(c) => {
                    let name = c.qualified_name();
                    self.insert(name, c)?
                }
                TopLevelComponent::AttributeGroup(c) => self.insert(Some(c.qualified_name()), c)?,
                TopLevelComponent::Group(c) => self.insert(Some(c.qualified_name()), c)?,
            }
        }

        for import in imports {
            self.resolve(&import, resolvers)?;
        }
        Ok(())
    }

    fn resolve(
        &mut self,
        import: &Import,
        resolvers: &[&dyn ImportResolver],
    ) -> Result<(), XsdError> {
        let location = import
            .schema_location
            .clone()
            .or_else(|| import.namespace.clone())
            .unwrap_or_default();
        if !self.resolved_locations.insert(location.clone()) {
            return Ok(());
        }

        for resolver in resolvers {
            match resolver.resolve_import(import) {
                Ok(schema) => return self.add_schema(schema, resolvers),
                Err(ImportError::UnsupportedImport) => {}
                Err(source) => return Err(XsdError::Import { location, source }),
            }
        }
        tracing::warn!("failed to resolve {:?}", import);
        Ok(())
    }

    fn insert<C>(&mut self, name: Option<QName>, component: C) -> Result<(), XsdError>
    where
        Self: Lookup<C>,
    {
        let Some(name) = name else {
            return Ok(());
        };
        if <Self as Lookup<C>>::table(self).contains_key(&name) {
            return Err(XsdError::DuplicateComponent {
                kind: <Self as Lookup<C>>::KIND,
                name: name.to_string(),
            });
        }
        <Self as Lookup<C>>::table_mut(self).insert(name, component);
        Ok(())
    }

    /// Simple and complex types share one symbol space.
    fn insert_type<C>(&mut self, name: Option<QName>, component: C) -> Result<(), XsdError>
    where
        Self: Lookup<C>,
    {
        if let Some(name) = name.as_ref() {
            if self.simple_types.contains_key(name) || self.complex_types.contains_key(name) {
                return Err(XsdError::DuplicateComponent {
                    kind: "type definition",
                    name: name.to_string(),
                });
            }
        }
        self.insert(name, component)
    }

    pub fn get<C>(&self, name: &QName) -> Option<&C>
    where
        Self: Lookup<C>,
    {
        <Self as Lookup<C>>::table(self).get(name)
    }

    /// All components of one kind, in declaration order.
    pub fn iter<'a, C: 'a>(&'a self) -> impl Iterator<Item = (&'a QName, &'a C)>
    where
        Self: Lookup<C>,
    {
        <Self as Lookup<C>>::table(self).iter()
    }

    /// Position of a component in the declaration order of its kind
    pub fn index_of<C>(&self, name: &QName) -> Option<usize>
    where
        Self: Lookup<C>,
    {
        <Self as Lookup<C>>::table(self).get_index_of(name)
    }
}
