//! Statically declared type metadata used for autowiring.
//!
//! Rust has no runtime reflection, so every type the container may build on
//! its own is described once with a [`TypeInfo`]: its kind, its constructor
//! parameters, its injectable properties and setter methods, and the
//! interfaces it can be served as.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::FastMap;
use crate::key::ServiceId;
use crate::params::{downcast_arc, downcast_trait, AnyArc, Arguments};

pub(crate) mod analyzer;

pub use analyzer::{classify, Classification};

/// Builds a concrete value from resolved constructor arguments.
pub type Constructor = Arc<dyn Fn(&Arguments) -> DiResult<AnyArc> + Send + Sync>;
/// Produces a parameter's default value.
pub type DefaultValue = Arc<dyn Fn() -> AnyArc + Send + Sync>;
/// Writes a resolved dependency into a property of a built instance.
pub type PropertyWriter = Arc<dyn Fn(&AnyArc, AnyArc) -> DiResult<()> + Send + Sync>;
/// Invokes a setter method on a built instance.
pub type MethodInvoker = Arc<dyn Fn(&AnyArc, &Arguments) -> DiResult<()> + Send + Sync>;

type Caster = Arc<dyn Fn(AnyArc) -> Option<AnyArc> + Send + Sync>;

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Instantiable type
    Concrete,
    /// Abstract base: declared, but never instantiated directly
    Abstract,
    /// Interface (trait object)
    Interface,
}

/// Declared type of a constructor or setter parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// No type hint
    Untyped,
    /// Built-in/primitive type such as `string`, `int`, `bool`, `array`
    Builtin(&'static str),
    /// Class or interface dependency
    Service(ServiceId),
    /// Union of several member types
    Union(Vec<ParamType>),
}

impl ParamType {
    pub fn type_name(&self) -> String {
        match self {
            ParamType::Untyped => "mixed".to_string(),
            ParamType::Builtin(name) => (*name).to_string(),
            ParamType::Service(id) => id.to_string(),
            ParamType::Union(members) => members
                .iter()
                .map(ParamType::type_name)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// A constructor or setter parameter.
#[derive(Clone)]
pub struct Parameter {
    name: &'static str,
    ty: ParamType,
    default: Option<DefaultValue>,
    nullable: bool,
}

impl Parameter {
    fn new(name: &'static str, ty: ParamType) -> Self {
        Self { name, ty, default: None, nullable: false }
    }

    /// Dependency on a class or interface type.
    pub fn service<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::new(name, ParamType::Service(ServiceId::of::<T>()))
    }

    /// Dependency on an arbitrary service id.
    pub fn service_id(name: &'static str, id: impl Into<ServiceId>) -> Self {
        Self::new(name, ParamType::Service(id.into()))
    }

    pub fn builtin(name: &'static str, type_name: &'static str) -> Self {
        Self::new(name, ParamType::Builtin(type_name))
    }

    pub fn untyped(name: &'static str) -> Self {
        Self::new(name, ParamType::Untyped)
    }

    pub fn union(name: &'static str, members: impl IntoIterator<Item = ParamType>) -> Self {
        Self::new(name, ParamType::Union(members.into_iter().collect()))
    }

    /// Accepts null (an optional parameter or a union with a null member).
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default<T, F>(mut self, default: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(move || Arc::new(default()) as AnyArc));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> &ParamType {
        &self.ty
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Either a default exists or null is accepted.
    pub fn is_optional(&self) -> bool {
        self.nullable || self.default.is_some()
    }

    pub(crate) fn default_value(&self) -> Option<AnyArc> {
        self.default.as_ref().map(|make| make())
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("default", &self.default.is_some())
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Property injection point.
///
/// The explicit override set with [`Property::inject`] takes precedence over
/// the declared property type.
#[derive(Clone)]
pub struct Property {
    name: &'static str,
    declared: Option<ServiceId>,
    explicit: Option<ServiceId>,
    public: bool,
    writer: PropertyWriter,
}

impl Property {
    /// Property of concrete type `D` on `S`.
    pub fn new<S, D, F>(name: &'static str, write: F) -> Self
    where
        S: Any + Send + Sync,
        D: Any + Send + Sync,
        F: Fn(&S, Arc<D>) + Send + Sync + 'static,
    {
        let writer: PropertyWriter = Arc::new(move |target: &AnyArc, value: AnyArc| {
            let owner = ServiceId::of::<S>();
            let svc = target_ref::<S>(target, &owner)?;
            write(svc, downcast_arc::<D>(value, &owner, name)?);
            Ok(())
        });
        Self::with_writer(name, Some(ServiceId::of::<D>()), writer)
    }

    /// Property holding an interface (`dyn Trait`) on `S`.
    pub fn of_trait<S, D, F>(name: &'static str, write: F) -> Self
    where
        S: Any + Send + Sync,
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&S, Arc<D>) + Send + Sync + 'static,
    {
        let writer: PropertyWriter = Arc::new(move |target: &AnyArc, value: AnyArc| {
            let owner = ServiceId::of::<S>();
            let svc = target_ref::<S>(target, &owner)?;
            write(svc, downcast_trait::<D>(value, &owner, name)?);
            Ok(())
        });
        Self::with_writer(name, Some(ServiceId::of::<D>()), writer)
    }

    /// Property without a declared type; needs [`Property::inject`].
    pub fn untyped<S, F>(name: &'static str, write: F) -> Self
    where
        S: Any + Send + Sync,
        F: Fn(&S, AnyArc) -> DiResult<()> + Send + Sync + 'static,
    {
        let writer: PropertyWriter = Arc::new(move |target: &AnyArc, value: AnyArc| {
            let owner = ServiceId::of::<S>();
            write(target_ref::<S>(target, &owner)?, value)
        });
        Self::with_writer(name, None, writer)
    }

    fn with_writer(name: &'static str, declared: Option<ServiceId>, writer: PropertyWriter) -> Self {
        Self { name, declared, explicit: None, public: true, writer }
    }

    /// Explicit dependency override for this injection point.
    pub fn inject(mut self, id: impl Into<ServiceId>) -> Self {
        self.explicit = Some(id.into());
        self
    }

    /// Marks the property as not publicly writable.
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared(&self) -> Option<&ServiceId> {
        self.declared.as_ref()
    }

    pub fn explicit(&self) -> Option<&ServiceId> {
        self.explicit.as_ref()
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Dependency to resolve: explicit override first, then declared type.
    pub fn target(&self) -> Option<&ServiceId> {
        self.explicit.as_ref().or(self.declared.as_ref())
    }

    pub(crate) fn write(&self, target: &AnyArc, value: AnyArc) -> DiResult<()> {
        (self.writer)(target, value)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("explicit", &self.explicit)
            .field("public", &self.public)
            .finish()
    }
}

/// A method that may be used for setter injection.
#[derive(Clone)]
pub struct Method {
    name: &'static str,
    public: bool,
    params: Vec<Parameter>,
    invoker: MethodInvoker,
}

impl Method {
    pub fn new<S, F>(name: &'static str, invoke: F) -> Self
    where
        S: Any + Send + Sync,
        F: Fn(&S, &Arguments) -> DiResult<()> + Send + Sync + 'static,
    {
        let invoker: MethodInvoker = Arc::new(move |target: &AnyArc, args: &Arguments| {
            let owner = ServiceId::of::<S>();
            invoke(target_ref::<S>(target, &owner)?, args)
        });
        Self { name, public: true, params: Vec::new(), invoker }
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub(crate) fn invoke(&self, target: &AnyArc, args: &Arguments) -> DiResult<()> {
        (self.invoker)(target, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("public", &self.public)
            .field("params", &self.params)
            .finish()
    }
}

fn target_ref<'a, S: Any>(target: &'a AnyArc, owner: &ServiceId) -> DiResult<&'a S> {
    target
        .downcast_ref::<S>()
        .ok_or_else(|| DiError::injection(owner, "injection target has an unexpected type"))
}

/// Metadata describing one type to the container.
///
/// # Examples
///
/// ```rust
/// use ferrous_autowire::{Container, Parameter, Resolver, TypeInfo};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db: Arc<Database> }
///
/// let mut container = Container::new();
/// container.declare(
///     TypeInfo::concrete::<Database>()
///         .param(Parameter::builtin("url", "string").with_default(|| "sqlite::memory:".to_string()))
///         .constructor(|args| Ok(Database { url: args.value("url")? })),
/// );
/// container.declare(
///     TypeInfo::concrete::<Repository>()
///         .param(Parameter::service::<Database>("db"))
///         .constructor(|args| Ok(Repository { db: args.get("db")? })),
/// );
///
/// let repo = container.get::<Repository>().unwrap();
/// assert_eq!(repo.db.url, "sqlite::memory:");
/// ```
pub struct TypeInfo {
    id: ServiceId,
    type_id: Option<TypeId>,
    kind: TypeKind,
    constructor: Option<Constructor>,
    params: Vec<Parameter>,
    properties: Vec<Property>,
    methods: Vec<Method>,
    casts: Vec<(ServiceId, Caster)>,
}

impl TypeInfo {
    fn bare(id: ServiceId, type_id: Option<TypeId>, kind: TypeKind) -> Self {
        Self {
            id,
            type_id,
            kind,
            constructor: None,
            params: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            casts: Vec::new(),
        }
    }

    /// Starts the declaration of an instantiable type.
    pub fn concrete<T: Any + Send + Sync>() -> Declaration<T> {
        Declaration {
            info: Self::bare(ServiceId::of::<T>(), Some(TypeId::of::<T>()), TypeKind::Concrete),
            _marker: PhantomData,
        }
    }

    pub fn interface<T: ?Sized + 'static>() -> Self {
        Self::bare(ServiceId::of::<T>(), None, TypeKind::Interface)
    }

    pub fn abstract_type(id: impl Into<ServiceId>) -> Self {
        Self::bare(id.into(), None, TypeKind::Abstract)
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Interfaces this type can be served as.
    pub fn interfaces(&self) -> impl Iterator<Item = &ServiceId> {
        self.casts.iter().map(|(id, _)| id)
    }

    pub(crate) fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    fn cast_to(&self, value: AnyArc, to: &ServiceId) -> Option<AnyArc> {
        self.casts
            .iter()
            .find(|(id, _)| id == to)
            .and_then(|(_, cast)| cast(value))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("constructor", &self.constructor.is_some())
            .field("params", &self.params)
            .field("properties", &self.properties)
            .field("methods", &self.methods)
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .finish()
    }
}

/// Typed builder for a concrete [`TypeInfo`].
pub struct Declaration<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Declaration<T> {
    /// Appends a constructor parameter (declaration order is call order).
    pub fn param(mut self, param: Parameter) -> Self {
        self.info.params.push(param);
        self
    }

    pub fn constructor<F>(mut self, build: F) -> Self
    where
        F: Fn(&Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        self.info.constructor = Some(Arc::new(move |args: &Arguments| build(args).map(|v| Arc::new(v) as AnyArc)));
        self
    }

    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(|_| Ok(T::default()))
    }

    pub fn property(mut self, property: Property) -> Self {
        self.info.properties.push(property);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.info.methods.push(method);
        self
    }

    /// Lets the container serve `T` under the id of interface `I`.
    ///
    /// ```rust
    /// use ferrous_autowire::{Container, Implementation, Resolver, TypeInfo};
    ///
    /// trait Logger: Send + Sync { fn name(&self) -> &'static str; }
    /// #[derive(Default)]
    /// struct ConsoleLogger;
    /// impl Logger for ConsoleLogger { fn name(&self) -> &'static str { "console" } }
    ///
    /// let mut container = Container::new();
    /// container.declare(
    ///     TypeInfo::concrete::<ConsoleLogger>()
    ///         .default_constructor()
    ///         .implements::<dyn Logger>(|c| c),
    /// );
    /// container.singleton(ferrous_autowire::id_of::<dyn Logger>(), Implementation::of::<ConsoleLogger>()).unwrap();
    ///
    /// assert_eq!(container.get_trait::<dyn Logger>().unwrap().name(), "console");
    /// ```
    pub fn implements<I: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self {
        let caster: Caster = Arc::new(move |value: AnyArc| {
            value
                .downcast::<T>()
                .ok()
                .map(|concrete| Arc::new(cast(concrete)) as AnyArc)
        });
        self.info.casts.push((ServiceId::of::<I>(), caster));
        self
    }
}

impl<T> From<Declaration<T>> for TypeInfo {
    fn from(declaration: Declaration<T>) -> Self {
        declaration.info
    }
}

/// Registry of declared types, indexed by id and by runtime `TypeId`.
#[derive(Default)]
pub(crate) struct TypeTable {
    types: FastMap<ServiceId, TypeInfo>,
    by_type_id: FastMap<TypeId, ServiceId>,
}

impl TypeTable {
    pub(crate) fn declare(&mut self, info: TypeInfo) {
        if let Some(type_id) = info.type_id {
            self.by_type_id.insert(type_id, info.id.clone());
        }
        self.types.insert(info.id.clone(), info);
    }

    pub(crate) fn get(&self, id: &ServiceId) -> Option<&TypeInfo> {
        self.types.get(id)
    }

    pub(crate) fn contains(&self, id: &ServiceId) -> bool {
        self.types.contains_key(id)
    }

    pub(crate) fn is_concrete(&self, id: &ServiceId) -> bool {
        matches!(self.types.get(id), Some(info) if info.kind == TypeKind::Concrete)
    }

    /// Metadata of the runtime type behind `value`.
    pub(crate) fn describe(&self, value: &AnyArc) -> Option<&TypeInfo> {
        let any: &dyn Any = &**value;
        self.by_type_id.get(&any.type_id()).and_then(|id| self.types.get(id))
    }

    /// Interface view of `value` (built as `from`) under `to`, if declared.
    pub(crate) fn cast(&self, value: &AnyArc, from: &ServiceId, to: &ServiceId) -> Option<AnyArc> {
        if from == to {
            return None;
        }
        self.types.get(from)?.cast_to(value.clone(), to)
    }

    pub(crate) fn coerce(&self, value: AnyArc, from: &ServiceId, to: &ServiceId) -> AnyArc {
        match self.cast(&value, from, to) {
            Some(view) => view,
            None => value,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.types.len()
    }
}
