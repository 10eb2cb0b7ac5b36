//! The type registry: decode and merge documents whose type is picked at
//! runtime.
//!
//! The typed entry points ([`from_str`](crate::from_str) and friends) resolve
//! everything at compile time and never touch the registry. The registry
//! serves the other case: a document arrives and only its root element name
//! says which registered type it is. Registered types are handled behind the
//! erased [`AnyGraph`] surface.
//!
//! Types annotated `#[xml(auto_register)]` submit themselves through the
//! [`inventory`] crate and are picked up by [`TypeRegistry::auto_register`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::decode::{self, DecodeError};
use crate::info::{Described, FieldValue};
use crate::merge::{Merge, MergeError};
use crate::tree::{self, Element};

// -----------------------------------------------------------------------------
// Graph

/// Everything a type needs to live in the registry.
///
/// Blanket-implemented; `#[derive(Bind)]` on a struct (together with the
/// usual `Clone`, `PartialEq`, `Default` derives) satisfies every bound.
pub trait Graph:
    Described + FieldValue + Merge + Default + fmt::Display + Send + Sync
{
}

impl<T> Graph for T where
    T: Described + FieldValue + Merge + Default + fmt::Display + Send + Sync
{
}

// -----------------------------------------------------------------------------
// AnyGraph

/// A type-erased object graph.
///
/// Dynamic decoding yields `Box<dyn AnyGraph>`; the concrete type is
/// recovered with the downcasting methods on `dyn AnyGraph`, or kept erased
/// and merged and re-encoded as is.
pub trait AnyGraph: Any + Send + Sync {
    /// The concrete type's identifier.
    fn type_name(&self) -> &'static str;

    /// The tag name wrapping the concrete type at the document root.
    fn root_element(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Merge `other` into `self` under the engine's precedence rules.
    ///
    /// Fails with [`MergeError::TypeMismatch`] when the two graphs are not
    /// the same concrete type.
    fn merge_from_any(&mut self, other: &dyn AnyGraph) -> Result<(), MergeError>;

    /// Encode the graph as a document, root wrapper included.
    fn to_xml(&self) -> String;

    fn clone_graph(&self) -> Box<dyn AnyGraph>;
}

impl<T: Graph> AnyGraph for T {
    fn type_name(&self) -> &'static str {
        T::descriptor().type_name()
    }

    fn root_element(&self) -> &'static str {
        T::descriptor().root_element()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn merge_from_any(&mut self, other: &dyn AnyGraph) -> Result<(), MergeError> {
        let Some(other) = other.as_any().downcast_ref::<T>() else {
            return Err(MergeError::TypeMismatch {
                first: T::descriptor().type_name(),
                second: other.type_name(),
            });
        };
        self.merge_from(other)
    }

    fn to_xml(&self) -> String {
        crate::encode::to_string(self)
    }

    fn clone_graph(&self) -> Box<dyn AnyGraph> {
        Box::new(self.clone())
    }
}

impl dyn AnyGraph {
    /// Whether the underlying value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the underlying value as a `T`, if it is one.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Mutably borrow the underlying value as a `T`, if it is one.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Take the underlying value as a `T`, handing the box back on mismatch.
    pub fn take<T: Any>(self: Box<Self>) -> Result<T, Box<dyn AnyGraph>> {
        if self.is::<T>() {
            // Checked just above.
            Ok(*self.into_any().downcast().unwrap_or_else(|_| unreachable!()))
        } else {
            Err(self)
        }
    }
}

impl fmt::Debug for dyn AnyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyGraph({})", self.type_name())
    }
}

// -----------------------------------------------------------------------------
// Registration

/// One registered type, reduced to names and capability pointers.
///
/// `Copy`, so lookups hand registrations out by value and no lock is held
/// while decoding.
#[derive(Clone, Copy)]
pub struct Registration {
    type_name: &'static str,
    root_element: &'static str,
    decode: fn(&Element) -> Result<Box<dyn AnyGraph>, DecodeError>,
    default: fn() -> Box<dyn AnyGraph>,
}

fn decode_erased<T: Graph>(element: &Element) -> Result<Box<dyn AnyGraph>, DecodeError> {
    decode::decode_element::<T>(element).map(|graph| Box::new(graph) as Box<dyn AnyGraph>)
}

fn default_erased<T: Graph>() -> Box<dyn AnyGraph> {
    Box::new(T::default())
}

impl Registration {
    /// Build the registration for `T`.
    pub fn of<T: Graph>() -> Self {
        Self {
            type_name: T::descriptor().type_name(),
            root_element: T::descriptor().root_element(),
            decode: decode_erased::<T>,
            default: default_erased::<T>,
        }
    }

    /// The registered type's identifier.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The root element tag the registered type decodes from.
    #[inline]
    pub fn root_element(&self) -> &'static str {
        self.root_element
    }

    /// Decode `element` into an erased graph of the registered type.
    #[inline]
    pub fn decode(&self, element: &Element) -> Result<Box<dyn AnyGraph>, DecodeError> {
        (self.decode)(element)
    }

    /// An erased default instance of the registered type.
    #[inline]
    pub fn default_graph(&self) -> Box<dyn AnyGraph> {
        (self.default)()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("type_name", &self.type_name)
            .field("root_element", &self.root_element)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// TypeRegistry

#[derive(Default)]
struct Tables {
    registrations: HashMap<TypeId, Registration>,
    name_to_id: HashMap<&'static str, TypeId>,
    root_to_id: HashMap<&'static str, TypeId>,
}

/// A registry of decodable types, keyed by type name and root element.
///
/// Interior-locked, so registration and lookup both take `&self` and the
/// registry can be shared behind a `static` or an `Arc` without wrapping.
///
/// # Example
///
/// ```
/// use xmlbind::derive::Bind;
/// use xmlbind::registry::TypeRegistry;
///
/// #[derive(Bind, Clone, Debug, Default, PartialEq)]
/// struct Cfg {
///     retries: u32,
/// }
///
/// let registry = TypeRegistry::new();
/// registry.register::<Cfg>();
///
/// let graph = registry.decode_str("<cfg><retries>3</retries></cfg>")?;
/// assert_eq!(graph.downcast_ref::<Cfg>().unwrap().retries, 3);
/// # Ok::<(), xmlbind::decode::DecodeError>(())
/// ```
#[derive(Default)]
pub struct TypeRegistry {
    tables: RwLock<Tables>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `T` if it has not been registered already.
    ///
    /// Idempotent. The first registration owns the type's name and root
    /// element in the lookup tables.
    pub fn register<T: Graph>(&self) {
        self.describe::<T>();
    }

    /// The registration of `T`, registering it first if needed.
    pub fn describe<T: Graph>(&self) -> Registration {
        let mut tables = self.write();
        let type_id = TypeId::of::<T>();
        if let Some(registration) = tables.registrations.get(&type_id) {
            return *registration;
        }
        let registration = Registration::of::<T>();
        tables
            .name_to_id
            .entry(registration.type_name)
            .or_insert(type_id);
        tables
            .root_to_id
            .entry(registration.root_element)
            .or_insert(type_id);
        tables.registrations.insert(type_id, registration);
        registration
    }

    /// Register every type annotated `#[xml(auto_register)]` in the linked
    /// program.
    ///
    /// Repeated calls are cheap and never insert duplicates.
    pub fn auto_register(&self) {
        for entry in inventory::iter::<AutoRegistration> {
            (entry.register)(self);
        }
    }

    /// Whether `T` has been registered.
    pub fn contains<T: Any>(&self) -> bool {
        self.read().registrations.contains_key(&TypeId::of::<T>())
    }

    /// The registration of `T`, if registered.
    pub fn get<T: Any>(&self) -> Option<Registration> {
        self.read().registrations.get(&TypeId::of::<T>()).copied()
    }

    /// Look a registration up by type name.
    pub fn get_by_name(&self, type_name: &str) -> Option<Registration> {
        let tables = self.read();
        let id = tables.name_to_id.get(type_name)?;
        tables.registrations.get(id).copied()
    }

    /// Look a registration up by root element tag.
    pub fn get_by_root(&self, root_element: &str) -> Option<Registration> {
        let tables = self.read();
        let id = tables.root_to_id.get(root_element)?;
        tables.registrations.get(id).copied()
    }

    /// The number of registered types.
    pub fn len(&self) -> usize {
        self.read().registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().registrations.is_empty()
    }

    /// Decode `element` as whichever registered type claims its tag name.
    ///
    /// Fails with [`DecodeError::Instantiation`] when no registered type
    /// does.
    pub fn decode_element(&self, element: &Element) -> Result<Box<dyn AnyGraph>, DecodeError> {
        let Some(registration) = self.get_by_root(element.name()) else {
            return Err(DecodeError::Instantiation {
                element: element.name().to_owned(),
            });
        };
        registration.decode(element)
    }

    /// Parse a document and decode its root as a registered type.
    pub fn decode_str(&self, xml: &str) -> Result<Box<dyn AnyGraph>, DecodeError> {
        let root = tree::parse_str(xml)?;
        self.decode_element(&root)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.read().registrations.values().map(Registration::type_name))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// AutoRegistration

/// One `#[xml(auto_register)]` submission, collected through [`inventory`].
pub struct AutoRegistration {
    /// Registers the submitting type into the given registry.
    pub register: fn(&TypeRegistry),
}

inventory::collect!(AutoRegistration);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::Bind;

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    #[xml(root = "settings")]
    struct Settings {
        retries: u32,
        name: String,
    }

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    struct Schema {
        input: String,
    }

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    #[xml(root = "autoCfg", auto_register)]
    struct AutoCfg {
        depth: u32,
    }

    #[test]
    fn lookups_by_name_and_root() {
        let registry = TypeRegistry::new();
        registry.register::<Settings>();

        assert!(registry.contains::<Settings>());
        assert!(!registry.contains::<Schema>());

        let by_name = registry.get_by_name("Settings").unwrap();
        assert_eq!(by_name.root_element(), "settings");

        let by_root = registry.get_by_root("settings").unwrap();
        assert_eq!(by_root.type_name(), "Settings");

        assert!(registry.get_by_name("Schema").is_none());
    }

    #[test]
    fn registration_is_idempotent() {
        let registry = TypeRegistry::new();
        registry.register::<Settings>();
        registry.register::<Settings>();
        assert_eq!(registry.len(), 1);

        // `describe` populates on demand and returns the same entry.
        let registration = registry.describe::<Settings>();
        assert_eq!(registration.type_name(), "Settings");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn dynamic_decode_picks_the_type_from_the_root_tag() {
        let registry = TypeRegistry::new();
        registry.register::<Settings>();
        registry.register::<Schema>();

        let graph = registry
            .decode_str("<settings><retries>3</retries></settings>")
            .unwrap();
        assert_eq!(graph.type_name(), "Settings");
        assert_eq!(graph.downcast_ref::<Settings>().unwrap().retries, 3);

        let graph = registry
            .decode_str("<schema><input>in</input></schema>")
            .unwrap();
        assert!(graph.is::<Schema>());
    }

    #[test]
    fn unknown_root_is_an_instantiation_error() {
        let registry = TypeRegistry::new();
        registry.register::<Settings>();

        let err = registry.decode_str("<mystery/>").unwrap_err();
        match err {
            DecodeError::Instantiation { element } => assert_eq!(element, "mystery"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn erased_merge_applies_the_engine_rules() {
        let registry = TypeRegistry::new();
        registry.register::<Settings>();

        let mut first = registry
            .decode_str("<settings><retries>3</retries></settings>")
            .unwrap();
        let second = registry
            .decode_str("<settings><retries>5</retries><name>a</name></settings>")
            .unwrap();

        first.merge_from_any(second.as_ref()).unwrap();
        let merged = first.downcast_ref::<Settings>().unwrap();
        assert_eq!(merged.retries, 3);
        assert_eq!(merged.name, "a");
    }

    #[test]
    fn erased_merge_rejects_mismatched_types() {
        let mut settings: Box<dyn AnyGraph> = Box::new(Settings::default());
        let schema: Box<dyn AnyGraph> = Box::new(Schema::default());

        let err = settings.merge_from_any(schema.as_ref()).unwrap_err();
        match err {
            MergeError::TypeMismatch { first, second } => {
                assert_eq!(first, "Settings");
                assert_eq!(second, "Schema");
            }
        }
    }

    #[test]
    fn take_recovers_the_concrete_value() {
        let graph: Box<dyn AnyGraph> = Box::new(Settings {
            retries: 7,
            ..Settings::default()
        });
        let settings = graph.take::<Settings>().unwrap();
        assert_eq!(settings.retries, 7);

        let graph: Box<dyn AnyGraph> = Box::new(Settings::default());
        let back = graph.take::<Schema>().unwrap_err();
        assert_eq!(back.type_name(), "Settings");
    }

    #[test]
    fn auto_registration_is_collected() {
        let registry = TypeRegistry::new();
        registry.auto_register();
        assert!(registry.contains::<AutoCfg>());
        assert!(registry.get_by_root("autoCfg").is_some());
    }

    #[test]
    fn concurrent_registration_settles_on_one_entry() {
        let registry = std::sync::Arc::new(TypeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry.register::<Settings>();
                    registry.register::<Schema>();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 2);
    }
}
