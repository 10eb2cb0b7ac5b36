//! The merge engine: layer one decoded graph on top of another.
//!
//! The rule set is small and field-local, applied to each field of the
//! override graph (`second`) against the base graph (`first`):
//!
//! * a list field concatenates, base items first;
//! * an absent override value changes nothing;
//! * a base value that is absent or still at the type's default is replaced
//!   by the override value;
//! * two present, non-default composites merge recursively in place;
//! * any other conflict keeps the base value.
//!
//! "Default" is judged against one throwaway `T::default()` baseline built
//! per composite, not per field. Enumerations never merge partially: they are
//! replaced whole or kept whole.

use std::fmt;

use crate::info::{Described, FieldValue};

// -----------------------------------------------------------------------------
// MergeError

/// A failure while merging two object graphs.
#[derive(Debug)]
pub enum MergeError {
    /// The two graphs are not the same concrete type.
    ///
    /// Typed merges rule this out at compile time; only the erased
    /// registry path ([`AnyGraph`](crate::registry::AnyGraph)) can hit it.
    TypeMismatch {
        first: &'static str,
        second: &'static str,
    },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { first, second } => {
                write!(f, "cannot merge `{second}` into `{first}`")
            }
        }
    }
}

impl std::error::Error for MergeError {}

// -----------------------------------------------------------------------------
// Merge

/// A type whose values can absorb an override value of the same type.
///
/// Implemented by `#[derive(Bind)]`: composites merge field by field through
/// their descriptor, enumerations are atomic and keep the base value.
pub trait Merge: Sized {
    /// Merge `other` into `self` under the engine's precedence rules.
    fn merge_from(&mut self, other: &Self) -> Result<(), MergeError>;
}

/// Merge two optional graphs, tolerating absence on either side.
///
/// # Example
///
/// ```
/// use xmlbind::derive::Bind;
///
/// #[derive(Bind, Clone, Debug, Default, PartialEq)]
/// struct Cfg {
///     retries: u32,
///     name: String,
/// }
///
/// let base = Cfg { retries: 3, name: String::new() };
/// let over = Cfg { retries: 5, name: "a".into() };
/// let merged = xmlbind::merge(Some(base), Some(over))?.unwrap();
/// assert_eq!(merged, Cfg { retries: 3, name: "a".into() });
/// # Ok::<(), xmlbind::merge::MergeError>(())
/// ```
pub fn merge<T: Merge>(first: Option<T>, second: Option<T>) -> Result<Option<T>, MergeError> {
    match (first, second) {
        (Some(mut first), Some(second)) => {
            first.merge_from(&second)?;
            Ok(Some(first))
        }
        (first, None) => Ok(first),
        (None, second) => Ok(second),
    }
}

/// Merge `second` into `first`, field by field, through `T`'s descriptor.
///
/// This is the body of every derived composite's [`Merge`] implementation.
/// One `T::default()` baseline serves the override-if-default test for all
/// fields of the composite.
pub fn merge_graphs<T: Described + Default>(first: &mut T, second: &T) -> Result<(), MergeError> {
    let baseline = T::default();
    for field in T::descriptor().fields() {
        field.merge_into(first, second, &baseline)?;
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Per-field operations
//
// Monomorphic helpers the derive macro points field descriptors at.

/// Merge one singular field slot.
///
/// Precedence: an absent override keeps the base; a base that is absent or
/// still at `baseline` takes the override; otherwise both sides are present
/// and non-default, and [`FieldValue::merge_nested`] decides (recursion for
/// derived composites, first wins for everything else).
pub fn merge_field<F: FieldValue>(
    first: &mut F,
    second: &F,
    baseline: &F,
) -> Result<(), MergeError> {
    if second.is_absent() {
        return Ok(());
    }
    if first.is_absent() || first == baseline {
        *first = second.clone();
        return Ok(());
    }
    first.merge_nested(second)
}

/// Merge one list field slot: concatenate, base items first.
#[inline]
pub fn merge_list<F: Clone>(first: &mut Vec<F>, second: &[F]) -> Result<(), MergeError> {
    first.extend(second.iter().cloned());
    Ok(())
}

/// Merge one adapted field slot.
///
/// Adapted values are opaque to the engine: override if the base is still at
/// `baseline`, keep the base otherwise. Never recurses.
pub fn merge_opaque<F: Clone + PartialEq>(
    first: &mut F,
    second: &F,
    baseline: &F,
) -> Result<(), MergeError> {
    if *first == *baseline {
        *first = second.clone();
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::Bind;

    #[derive(Bind, Clone, Copy, Debug, Default, PartialEq)]
    enum Mode {
        #[default]
        Plain,
        Strict,
        Loose,
    }

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    struct Schema {
        input: String,
        output: String,
    }

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    struct Cfg {
        retries: u32,
        name: String,
        mode: Mode,
        #[xml(element = "defaultSchema")]
        default_schema: Option<Schema>,
        limits: Limits,
        #[xml(wrap = "tags", element = "tag")]
        tags: Vec<String>,
    }

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    struct Limits {
        depth: u32,
        width: u32,
    }

    #[test]
    fn explicit_base_values_win_over_overrides() {
        let mut first = Cfg {
            retries: 3,
            ..Cfg::default()
        };
        let second = Cfg {
            retries: 5,
            name: "a".into(),
            ..Cfg::default()
        };
        first.merge_from(&second).unwrap();
        assert_eq!(first.retries, 3);
        assert_eq!(first.name, "a");
    }

    #[test]
    fn default_side_yields_field_by_field() {
        let mut first = Cfg {
            retries: 3,
            name: String::new(),
            ..Cfg::default()
        };
        let second = Cfg {
            retries: 0,
            name: "b".into(),
            ..Cfg::default()
        };
        first.merge_from(&second).unwrap();
        assert_eq!(first.retries, 3);
        assert_eq!(first.name, "b");
    }

    #[test]
    fn merging_into_an_all_default_base_yields_the_override() {
        let second = Cfg {
            retries: 4,
            name: "n".into(),
            mode: Mode::Strict,
            default_schema: Some(Schema {
                input: "i".into(),
                output: "o".into(),
            }),
            limits: Limits { depth: 1, width: 2 },
            tags: vec!["t".into()],
        };
        let mut first = Cfg::default();
        first.merge_from(&second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn lists_concatenate_base_first() {
        let mut first = Cfg {
            tags: vec!["x".into()],
            ..Cfg::default()
        };
        let second = Cfg {
            tags: vec!["y".into(), "z".into()],
            ..Cfg::default()
        };
        first.merge_from(&second).unwrap();
        assert_eq!(first.tags, ["x", "y", "z"]);
    }

    #[test]
    fn absent_override_leaves_base_untouched() {
        let mut first = Cfg {
            default_schema: Some(Schema {
                input: "in".into(),
                ..Schema::default()
            }),
            ..Cfg::default()
        };
        let second = Cfg::default();
        let expected = first.clone();
        first.merge_from(&second).unwrap();
        assert_eq!(first, expected);
    }

    #[test]
    fn default_base_takes_override_composite_whole() {
        let mut first = Cfg::default();
        let second = Cfg {
            default_schema: Some(Schema {
                input: "in".into(),
                output: "out".into(),
            }),
            ..Cfg::default()
        };
        first.merge_from(&second).unwrap();
        assert_eq!(first.default_schema, second.default_schema);
    }

    #[test]
    fn present_composites_merge_recursively_in_place() {
        let mut first = Cfg {
            default_schema: Some(Schema {
                input: "in".into(),
                ..Schema::default()
            }),
            ..Cfg::default()
        };
        let second = Cfg {
            default_schema: Some(Schema {
                input: "ignored".into(),
                output: "out".into(),
            }),
            ..Cfg::default()
        };
        first.merge_from(&second).unwrap();
        assert_eq!(
            first.default_schema,
            Some(Schema {
                input: "in".into(),
                output: "out".into(),
            })
        );
    }

    #[test]
    fn non_optional_composites_recurse_too() {
        let mut first = Cfg {
            limits: Limits {
                depth: 2,
                width: 0,
            },
            ..Cfg::default()
        };
        let second = Cfg {
            limits: Limits {
                depth: 9,
                width: 7,
            },
            ..Cfg::default()
        };
        first.merge_from(&second).unwrap();
        assert_eq!(first.limits, Limits { depth: 2, width: 7 });
    }

    #[test]
    fn enums_never_merge_partially() {
        let mut first = Cfg {
            mode: Mode::Strict,
            ..Cfg::default()
        };
        let second = Cfg {
            mode: Mode::Loose,
            ..Cfg::default()
        };
        first.merge_from(&second).unwrap();
        assert_eq!(first.mode, Mode::Strict);

        let mut first = Cfg::default();
        first.merge_from(&second).unwrap();
        assert_eq!(first.mode, Mode::Loose);
    }

    #[test]
    fn merging_an_all_default_override_is_identity() {
        let first = Cfg {
            retries: 3,
            name: "n".into(),
            mode: Mode::Loose,
            tags: vec!["t".into()],
            ..Cfg::default()
        };
        let mut merged = first.clone();
        merged.merge_from(&Cfg::default()).unwrap();
        assert_eq!(merged, first);
    }

    #[test]
    fn adapted_fields_override_only_a_default_base() {
        use crate::convert::{Adapter, ConversionError};

        #[derive(Default)]
        struct HexAdapter;

        impl Adapter for HexAdapter {
            type Value = u32;

            fn parse(&self, text: &str) -> Result<Self::Value, ConversionError> {
                u32::from_str_radix(text, 16).map_err(|_| ConversionError::new(text, "hex u32"))
            }

            fn format(&self, value: &Self::Value) -> String {
                format!("{value:x}")
            }
        }

        #[derive(Bind, Clone, Debug, Default, PartialEq)]
        struct Flags {
            #[xml(adapter = HexAdapter)]
            mask: u32,
        }

        let mut first = Flags { mask: 0xf0 };
        first.merge_from(&Flags { mask: 0x0f }).unwrap();
        assert_eq!(first.mask, 0xf0);

        let mut first = Flags::default();
        first.merge_from(&Flags { mask: 0x0f }).unwrap();
        assert_eq!(first.mask, 0x0f);
    }

    #[test]
    fn optional_graphs_tolerate_absence() {
        let cfg = Cfg {
            retries: 1,
            ..Cfg::default()
        };
        assert_eq!(merge(Some(cfg.clone()), None).unwrap(), Some(cfg.clone()));
        assert_eq!(merge(None, Some(cfg.clone())).unwrap(), Some(cfg));
        assert_eq!(merge::<Cfg>(None, None).unwrap(), None);
    }
}
