//! Type descriptors and their builder.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{MemberBuilder, MemberDescriptor, SchemaContext, TypeName, Visibility};
use crate::error::{BoxedCause, Error, Result};
use crate::value::{Converter, PrimitiveKind, Value, ValueConverter};

// =============================================================================
// Collection capabilities
// =============================================================================

/// A collection interface a type declares.
///
/// A type may declare several; the effective [`CollectionKind`] is chosen by
/// precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Items can be enumerated, but not added.
    Enumerable,
    /// Generic collection with add.
    Collection,
    /// Indexed list with add.
    List,
    /// Keyed dictionary.
    Dictionary,
}

/// Resolved collection behaviour of a type. Always exactly one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionKind {
    /// Not a collection.
    #[default]
    None,
    /// Enumerable only; read back but never populated from markup.
    Enumerable,
    /// Generic collection.
    Collection,
    /// List.
    List,
    /// Dictionary.
    Dictionary,
}

impl CollectionKind {
    /// Pick one kind: dictionary > list > collection > enumerable.
    pub fn from_capabilities(capabilities: &[Capability]) -> Self {
        let has = |c| capabilities.contains(&c);
        if has(Capability::Dictionary) {
            Self::Dictionary
        } else if has(Capability::List) {
            Self::List
        } else if has(Capability::Collection) {
            Self::Collection
        } else if has(Capability::Enumerable) {
            Self::Enumerable
        } else {
            Self::None
        }
    }

    /// Whether the type holds items of any kind.
    pub fn is_collection(self) -> bool {
        self != Self::None
    }

    /// Whether items can be added.
    pub fn accepts_items(self) -> bool {
        matches!(self, Self::Collection | Self::List | Self::Dictionary)
    }

    /// Whether items are keyed.
    pub fn is_dictionary(self) -> bool {
        self == Self::Dictionary
    }
}

/// How a dictionary compares keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyComparison {
    /// Exact equality.
    #[default]
    Ordinal,
    /// String keys compare without regard to case.
    IgnoreCase,
}

// =============================================================================
// Construction
// =============================================================================

/// Constructor signature: parameters bound to members, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    params: Vec<String>,
}

impl Constructor {
    /// Member names bound to each parameter.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Parameter count.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Native factory function: receives decoded arguments, returns the instance.
pub type FactoryFn =
    Arc<dyn Fn(&SchemaContext, &[Value]) -> std::result::Result<Value, BoxedCause> + Send + Sync>;

/// Named factory method, selected by `x:FactoryMethod` and argument count.
#[derive(Clone)]
pub struct FactoryMethod {
    name: String,
    params: Vec<TypeName>,
    call: FactoryFn,
}

impl FactoryMethod {
    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types.
    pub fn params(&self) -> &[TypeName] {
        &self.params
    }

    /// Call the factory.
    pub fn invoke(
        &self,
        ctx: &SchemaContext,
        args: &[Value],
    ) -> std::result::Result<Value, BoxedCause> {
        (self.call)(ctx, args)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TypeDescriptor
// =============================================================================

/// Resolved description of a native type. Immutable once built.
pub struct TypeDescriptor {
    name: TypeName,
    ancestors: Vec<TypeName>,
    members: Vec<Arc<MemberDescriptor>>,
    index: FxHashMap<String, usize>,
    content_property: Option<usize>,
    capabilities: Vec<Capability>,
    collection: CollectionKind,
    item_type: TypeName,
    key_type: TypeName,
    key_comparison: KeyComparison,
    bound_ctor: Option<Constructor>,
    constructors: Vec<Constructor>,
    default_constructible: bool,
    factories: Vec<FactoryMethod>,
    converter: Option<Converter>,
    primitive: Option<PrimitiveKind>,
    visibility: Visibility,
    tolerate_unknown: bool,
}

impl TypeDescriptor {
    /// An intrinsic descriptor. Its only member, if any, is the content
    /// property and may be bound as the single constructor argument.
    pub(super) fn intrinsic(
        name: TypeName,
        primitive: Option<PrimitiveKind>,
        content: Option<MemberBuilder>,
    ) -> Self {
        let members: Vec<Arc<MemberDescriptor>> = content
            .into_iter()
            .map(|builder| {
                let mut member = builder.build(&name);
                member.content = true;
                Arc::new(member)
            })
            .collect();
        let bound_ctor = members
            .iter()
            .find(|m| m.ctor_arg.is_some())
            .map(|m| Constructor {
                params: vec![m.name.clone()],
            });
        Self {
            index: members
                .iter()
                .enumerate()
                .map(|(i, m)| (m.name.clone(), i))
                .collect(),
            content_property: (!members.is_empty()).then_some(0),
            constructors: bound_ctor.iter().cloned().collect(),
            default_constructible: bound_ctor.is_none(),
            bound_ctor,
            name,
            ancestors: Vec::new(),
            members,
            capabilities: Vec::new(),
            collection: CollectionKind::None,
            item_type: TypeName::xaml("Object"),
            key_type: TypeName::xaml("Object"),
            key_comparison: KeyComparison::Ordinal,
            factories: Vec::new(),
            converter: None,
            primitive,
            visibility: Visibility::Public,
            tolerate_unknown: false,
        }
    }

    /// Full type name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Base types, nearest first.
    pub fn ancestors(&self) -> &[TypeName] {
        &self.ancestors
    }

    /// Whether a value of this type can be stored where `target` is declared.
    pub fn is_assignable_to(&self, target: &TypeName) -> bool {
        target.is_xaml("Object") || &self.name == target || self.ancestors.contains(target)
    }

    /// Flattened members in declaration order, inherited members first.
    pub fn members(&self) -> &[Arc<MemberDescriptor>] {
        &self.members
    }

    /// Position of a member in [`members`](Self::members).
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Member by name.
    pub fn member(&self, name: &str) -> Option<&Arc<MemberDescriptor>> {
        self.member_index(name).map(|i| &self.members[i])
    }

    /// Member by name, or `UnknownMember`.
    pub fn resolve_member(&self, name: &str) -> Result<Arc<MemberDescriptor>> {
        self.member(name)
            .cloned()
            .ok_or_else(|| Error::unknown_member(self.name.to_string(), name))
    }

    /// Resolve `Owner.Member`, where `Owner` is this type or an ancestor.
    pub fn resolve_qualified_member(&self, owner: &str, name: &str) -> Result<Arc<MemberDescriptor>> {
        let owner_matches = self.name.name() == owner || self.ancestors.iter().any(|a| a.name() == owner);
        if !owner_matches {
            return Err(Error::unknown_member(self.name.to_string(), format!("{owner}.{name}")));
        }
        self.resolve_member(name)
    }

    /// Content property.
    pub fn content_property(&self) -> Option<&Arc<MemberDescriptor>> {
        self.content_property.map(|i| &self.members[i])
    }

    /// Resolved collection kind.
    pub fn collection_kind(&self) -> CollectionKind {
        self.collection
    }

    /// Item type (dictionary value type). `x:Object` when undeclared.
    pub fn item_type(&self) -> &TypeName {
        &self.item_type
    }

    /// Dictionary key type. `x:Object` when undeclared.
    pub fn key_type(&self) -> &TypeName {
        &self.key_type
    }

    /// Dictionary key comparison.
    pub fn key_comparison(&self) -> KeyComparison {
        self.key_comparison
    }

    /// Constructor formed by members with a constructor-argument index.
    pub fn bound_constructor(&self) -> Option<&Constructor> {
        self.bound_ctor.as_ref()
    }

    /// All argument constructors, the bound one first.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Constructor with the given arity.
    pub fn constructor_with_arity(&self, arity: usize) -> Option<&Constructor> {
        self.constructors.iter().find(|c| c.arity() == arity)
    }

    /// Whether an instance can be created without arguments.
    pub fn is_default_constructible(&self) -> bool {
        self.default_constructible
    }

    /// Factory by name and argument count.
    pub fn factory(&self, name: &str, arity: usize) -> Option<&FactoryMethod> {
        self.factories
            .iter()
            .find(|f| f.name == name && f.params.len() == arity)
    }

    /// Type-level converter.
    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    /// Primitive kind for intrinsic scalar types.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        self.primitive
    }

    /// Visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether unknown members are skipped instead of rejected.
    pub fn tolerates_unknown_members(&self) -> bool {
        self.tolerate_unknown
    }

    /// Whether this is the intrinsic type `x:<name>`.
    pub fn is_intrinsic(&self, name: &str) -> bool {
        self.name.is_xaml(name)
    }

    /// Whether instances can be created from initialization text.
    pub fn is_text_initializable(&self) -> bool {
        self.primitive.is_some() || self.converter.is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("members", &self.members.len())
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TypeBuilder
// =============================================================================

/// Fluent builder for a [`TypeDescriptor`].
///
/// # Example
///
/// ```ignore
/// let person = ctx.register(
///     TypeBuilder::new(NS, "Person")
///         .member(MemberBuilder::new("Name", TypeName::xaml("String")).ctor_arg(0))
///         .member(MemberBuilder::new("Age", TypeName::xaml("Int32")).default_value(0))
///         .content_property("Name"),
/// )?;
/// ```
#[derive(Clone)]
pub struct TypeBuilder {
    name: TypeName,
    base: Option<Arc<TypeDescriptor>>,
    members: Vec<MemberBuilder>,
    content_property: Option<String>,
    capabilities: Vec<Capability>,
    item_type: Option<TypeName>,
    key_type: Option<TypeName>,
    key_comparison: Option<KeyComparison>,
    constructors: Vec<Vec<String>>,
    default_constructible: Option<bool>,
    factories: Vec<FactoryMethod>,
    converter: Option<Converter>,
    visibility: Visibility,
    tolerate_unknown: bool,
}

impl TypeBuilder {
    /// Start a type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::named(TypeName::new(namespace, name))
    }

    /// Start a type with a full name.
    pub fn named(name: TypeName) -> Self {
        Self {
            name,
            base: None,
            members: Vec::new(),
            content_property: None,
            capabilities: Vec::new(),
            item_type: None,
            key_type: None,
            key_comparison: None,
            constructors: Vec::new(),
            default_constructible: None,
            factories: Vec::new(),
            converter: None,
            visibility: Visibility::Public,
            tolerate_unknown: false,
        }
    }

    /// The name being built.
    pub fn type_name(&self) -> &TypeName {
        &self.name
    }

    pub(crate) fn rename(mut self, name: TypeName) -> Self {
        self.name = name;
        self
    }

    /// Inherit members, content property, capabilities and converter.
    pub fn extends(mut self, base: &Arc<TypeDescriptor>) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Declare a member. A member named like an inherited one overrides it.
    pub fn member(mut self, member: MemberBuilder) -> Self {
        self.members.push(member);
        self
    }

    /// Set the content property.
    pub fn content_property(mut self, name: impl Into<String>) -> Self {
        self.content_property = Some(name.into());
        self
    }

    /// Declare a collection capability.
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Set the item type.
    pub fn item_type(mut self, item: TypeName) -> Self {
        self.item_type = Some(item);
        self
    }

    /// Make the type a dictionary with the given key and value types.
    pub fn dictionary(mut self, key: TypeName, value: TypeName) -> Self {
        self.capabilities.push(Capability::Dictionary);
        self.key_type = Some(key);
        self.item_type = Some(value);
        self
    }

    /// Compare string keys without regard to case.
    pub fn ignore_case_keys(mut self) -> Self {
        self.key_comparison = Some(KeyComparison::IgnoreCase);
        self
    }

    /// Declare an argument constructor, selectable by `x:Arguments` arity.
    pub fn constructor<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructors
            .push(params.into_iter().map(Into::into).collect());
        self
    }

    /// Forbid construction without arguments.
    pub fn no_default_constructor(mut self) -> Self {
        self.default_constructible = Some(false);
        self
    }

    /// Register a factory method.
    pub fn factory<F>(
        mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = TypeName>,
        call: F,
    ) -> Self
    where
        F: Fn(&SchemaContext, &[Value]) -> std::result::Result<Value, BoxedCause>
            + Send
            + Sync
            + 'static,
    {
        self.factories.push(FactoryMethod {
            name: name.into(),
            params: params.into_iter().collect(),
            call: Arc::new(call),
        });
        self
    }

    /// Attach a type-level converter.
    pub fn converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converter = Some(Converter::new(converter));
        self
    }

    /// Attach an already shared type-level converter.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Make the type internal.
    pub fn internal(mut self) -> Self {
        self.visibility = Visibility::Internal;
        self
    }

    /// Skip unknown members in markup instead of failing.
    pub fn tolerate_unknown_members(mut self) -> Self {
        self.tolerate_unknown = true;
        self
    }

    /// Validate and build the descriptor.
    pub fn build(self) -> Result<TypeDescriptor> {
        let name = self.name;
        let base = self.base;

        // Flatten members: inherited first, overrides replace in place.
        let mut members: Vec<Arc<MemberDescriptor>> = base
            .as_ref()
            .map(|b| b.members.clone())
            .unwrap_or_default();
        let mut explicit_content: Vec<String> = self.content_property.into_iter().collect();
        for builder in self.members {
            if builder.content && !explicit_content.contains(&builder.name) {
                explicit_content.push(builder.name.clone());
            }
            let member = Arc::new(builder.build(&name));
            match members.iter().position(|m| m.name == member.name) {
                Some(i) => members[i] = member,
                None => members.push(member),
            }
        }

        let content_name = match explicit_content.len() {
            0 => base
                .as_ref()
                .and_then(|b| b.content_property())
                .map(|m| m.name.clone()),
            1 => explicit_content.pop(),
            _ => {
                return Err(Error::invalid_schema(format!(
                    "type '{name}' declares more than one content property: {}",
                    explicit_content.join(", ")
                )));
            }
        };
        let content_property = match &content_name {
            Some(content) => Some(members.iter().position(|m| &m.name == content).ok_or_else(
                || {
                    Error::invalid_schema(format!(
                        "content property '{content}' is not a member of '{name}'"
                    ))
                },
            )?),
            None => None,
        };
        for (i, member) in members.iter_mut().enumerate() {
            let is_content = Some(i) == content_property;
            if member.content != is_content {
                Arc::make_mut(member).content = is_content;
            }
        }

        let mut capabilities = base
            .as_ref()
            .map(|b| b.capabilities.clone())
            .unwrap_or_default();
        capabilities.extend(self.capabilities);
        let collection = CollectionKind::from_capabilities(&capabilities);
        if collection.is_collection() && content_property.is_some() {
            return Err(Error::invalid_schema(format!(
                "collection type '{name}' cannot declare a content property"
            )));
        }

        let inherited = |f: fn(&TypeDescriptor) -> &TypeName| base.as_deref().map(|b| f(b).clone());
        let item_type = self
            .item_type
            .or_else(|| inherited(TypeDescriptor::item_type))
            .unwrap_or_else(|| TypeName::xaml("Object"));
        let key_type = self
            .key_type
            .or_else(|| inherited(TypeDescriptor::key_type))
            .unwrap_or_else(|| TypeName::xaml("Object"));
        let key_comparison = self
            .key_comparison
            .or_else(|| base.as_ref().map(|b| b.key_comparison))
            .unwrap_or_default();

        let bound_ctor = bound_constructor(&name, &members)?;
        let mut constructors: Vec<Constructor> = bound_ctor.iter().cloned().collect();
        for params in self.constructors {
            if let Some(missing) = params.iter().find(|p| !members.iter().any(|m| &m.name == *p)) {
                return Err(Error::invalid_schema(format!(
                    "constructor parameter '{missing}' is not a member of '{name}'"
                )));
            }
            constructors.push(Constructor { params });
        }

        let index = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let ancestors = base
            .as_ref()
            .map(|b| {
                std::iter::once(b.name.clone())
                    .chain(b.ancestors.iter().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(TypeDescriptor {
            default_constructible: self.default_constructible.unwrap_or(bound_ctor.is_none()),
            converter: self
                .converter
                .or_else(|| base.as_ref().and_then(|b| b.converter.clone())),
            tolerate_unknown: self.tolerate_unknown
                || base.as_ref().is_some_and(|b| b.tolerate_unknown),
            name,
            ancestors,
            members,
            index,
            content_property,
            capabilities,
            collection,
            item_type,
            key_type,
            key_comparison,
            bound_ctor,
            constructors,
            factories: self.factories,
            primitive: None,
            visibility: self.visibility,
        })
    }
}

/// Collect constructor-argument members; indices must be `0..n` without gaps.
fn bound_constructor(
    name: &TypeName,
    members: &[Arc<MemberDescriptor>],
) -> Result<Option<Constructor>> {
    let mut bound: Vec<(usize, &str)> = members
        .iter()
        .filter_map(|m| m.ctor_arg.map(|i| (i, m.name.as_str())))
        .collect();
    if bound.is_empty() {
        return Ok(None);
    }
    bound.sort_by_key(|(i, _)| *i);
    for (expected, (index, member)) in bound.iter().enumerate() {
        if *index != expected {
            return Err(Error::invalid_schema(format!(
                "constructor argument indices of '{name}' must be contiguous from 0 (member '{member}' has {index})"
            )));
        }
    }
    Ok(Some(Constructor {
        params: bound.into_iter().map(|(_, m)| m.to_string()).collect(),
    }))
}
