//! The field-visitor abstraction behind every settings struct.
//!
//! A settings struct implements [`Settings`]: it hands out one [`FieldSlot`]
//! per field, each slot being a `&mut dyn Setting` into the struct. Leaf
//! types (`u16`, `String`, `Duration`, ...) implement [`Setting`] here;
//! structs get both traits from `#[derive(Settings)]`, which is what lets
//! nesting work without any per-type glue.
//!
//! [`Setting`] is object safe on purpose: the collector walks an arbitrary
//! tree of `&mut dyn Settings` / `&mut dyn Setting` at runtime.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use num_complex::Complex;

use crate::cimap::Node;
use crate::coerce::{CoerceError, FromText};

/// The category of a setting's static type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Signed,
    Unsigned,
    Float,
    Complex,
    Bool,
    Duration,
    Timestamp,
    Text,
    StringList,
    StringMap,
    /// A type with its own text decoding (`FromStr`).
    Custom,
    /// A nested settings struct.
    Struct,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Signed => "signed integer",
            Kind::Unsigned => "unsigned integer",
            Kind::Float => "float",
            Kind::Complex => "complex number",
            Kind::Bool => "bool",
            Kind::Duration => "duration",
            Kind::Timestamp => "timestamp",
            Kind::Text => "string",
            Kind::StringList => "string list",
            Kind::StringMap => "string map",
            Kind::Custom => "custom",
            Kind::Struct => "nested settings",
        };
        f.write_str(name)
    }
}

/// A writable slot in a settings tree.
pub trait Setting {
    fn kind(&self) -> Kind;

    /// Parse `text` and store it. On error the slot keeps its old value.
    fn set_text(&mut self, text: &str) -> Result<(), CoerceError>;

    /// Structural decode of a value taken from a config file.
    fn set_node(&mut self, node: &Node) -> Result<(), CoerceError>;

    /// Reset to the zero value of the type.
    fn reset(&mut self);

    /// `Some` when this slot is a nested settings struct.
    fn as_settings_mut(&mut self) -> Option<&mut dyn Settings> {
        None
    }
}

/// A struct whose fields can be populated by the collector.
///
/// Usually derived. A manual impl must return the same fields, in the same
/// order, on every call.
pub trait Settings {
    fn fields_mut(&mut self) -> Vec<FieldSlot<'_>>;
}

/// One field of a [`Settings`] struct, borrowed mutably.
pub struct FieldSlot<'a> {
    pub name: &'static str,
    /// Raw `#[setting("...")]` annotation, empty when absent.
    pub annotation: &'static str,
    pub value: &'a mut dyn Setting,
}

impl<'a> FieldSlot<'a> {
    pub fn new(name: &'static str, annotation: &'static str, value: &'a mut dyn Setting) -> Self {
        Self {
            name,
            annotation,
            value,
        }
    }
}

impl fmt::Debug for FieldSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSlot")
            .field("name", &self.name)
            .field("annotation", &self.annotation)
            .field("kind", &self.value.kind())
            .finish()
    }
}

macro_rules! leaf_setting {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Setting for $ty {
                fn kind(&self) -> Kind {
                    $kind
                }

                fn set_text(&mut self, text: &str) -> Result<(), CoerceError> {
                    *self = <$ty as FromText>::from_text(text)?;
                    Ok(())
                }

                fn set_node(&mut self, node: &Node) -> Result<(), CoerceError> {
                    *self = node.decode::<$ty>().map_err(|e| CoerceError::Mismatch {
                        kind: $kind,
                        reason: e.to_string(),
                    })?;
                    Ok(())
                }

                fn reset(&mut self) {
                    *self = <$ty>::default();
                }
            }
        )+
    };
}

leaf_setting!(Kind::Signed => i8, i16, i32, i64, isize);
leaf_setting!(Kind::Unsigned => u8, u16, u32, u64, usize);
leaf_setting!(Kind::Float => f32, f64);
leaf_setting!(Kind::Complex => Complex<f32>, Complex<f64>);
leaf_setting!(Kind::Bool => bool);
leaf_setting!(Kind::Duration => Duration);
leaf_setting!(Kind::Timestamp => DateTime<Utc>, DateTime<FixedOffset>);
leaf_setting!(Kind::Text => String, PathBuf);
leaf_setting!(Kind::StringList => Vec<String>);
leaf_setting!(Kind::StringMap => HashMap<String, String>, BTreeMap<String, String>);

/// `None` is the zero value; a null file value or an empty string unsets it.
///
/// `Some(settings)` is looked through like a plain nested struct. `None`
/// has no fields to visit and stays a single slot. `T: Default` supplies the
/// value that a source writes into, so an optional nested struct has to
/// implement `Default` too.
impl<T: Setting + Default> Setting for Option<T> {
    fn kind(&self) -> Kind {
        match self {
            Some(inner) => inner.kind(),
            None => T::default().kind(),
        }
    }

    fn set_text(&mut self, text: &str) -> Result<(), CoerceError> {
        let mut inner = T::default();
        inner.set_text(text)?;
        *self = Some(inner);
        Ok(())
    }

    fn set_node(&mut self, node: &Node) -> Result<(), CoerceError> {
        if node.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = T::default();
        inner.set_node(node)?;
        *self = Some(inner);
        Ok(())
    }

    fn reset(&mut self) {
        *self = None;
    }

    fn as_settings_mut(&mut self) -> Option<&mut dyn Settings> {
        self.as_mut().and_then(|inner| inner.as_settings_mut())
    }
}

impl<T: Setting + ?Sized> Setting for Box<T> {
    fn kind(&self) -> Kind {
        (**self).kind()
    }

    fn set_text(&mut self, text: &str) -> Result<(), CoerceError> {
        (**self).set_text(text)
    }

    fn set_node(&mut self, node: &Node) -> Result<(), CoerceError> {
        (**self).set_node(node)
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn as_settings_mut(&mut self) -> Option<&mut dyn Settings> {
        (**self).as_settings_mut()
    }
}

/// Log levels decode through their own `FromStr`; the zero value is `INFO`.
impl Setting for tracing::Level {
    fn kind(&self) -> Kind {
        Kind::Custom
    }

    fn set_text(&mut self, text: &str) -> Result<(), CoerceError> {
        *self = text
            .parse()
            .map_err(|e| CoerceError::invalid(Kind::Custom, text, e))?;
        Ok(())
    }

    fn set_node(&mut self, node: &Node) -> Result<(), CoerceError> {
        match node.as_str() {
            Some(text) => self.set_text(text),
            None => Err(CoerceError::Mismatch {
                kind: Kind::Custom,
                reason: "expected a level name".to_string(),
            }),
        }
    }

    fn reset(&mut self) {
        *self = tracing::Level::INFO;
    }
}

/// Implement [`Setting`] for types that decode themselves from text.
///
/// The type must implement `FromStr` (with a displayable error) and
/// `Default`, which serves as its zero value.
///
/// ```ignore
/// #[derive(Debug, Default, PartialEq)]
/// enum Mode { #[default] Fast, Slow }
///
/// impl std::str::FromStr for Mode { /* ... */ }
///
/// layerfig::text_setting!(Mode);
/// ```
#[macro_export]
macro_rules! text_setting {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Setting for $ty {
                fn kind(&self) -> $crate::Kind {
                    $crate::Kind::Custom
                }

                fn set_text(&mut self, text: &str) -> ::std::result::Result<(), $crate::CoerceError> {
                    *self = <$ty as ::std::str::FromStr>::from_str(text).map_err(|e| {
                        $crate::CoerceError::Invalid {
                            kind: $crate::Kind::Custom,
                            value: text.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    ::std::result::Result::Ok(())
                }

                fn set_node(&mut self, node: &$crate::Node) -> ::std::result::Result<(), $crate::CoerceError> {
                    match node.as_str() {
                        ::std::option::Option::Some(text) => self.set_text(text),
                        ::std::option::Option::None => ::std::result::Result::Err(
                            $crate::CoerceError::Mismatch {
                                kind: $crate::Kind::Custom,
                                reason: "expected a string".to_string(),
                            },
                        ),
                    }
                }

                fn reset(&mut self) {
                    *self = <$ty as ::std::default::Default>::default();
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_kinds() {
        assert_eq!(0u16.kind(), Kind::Unsigned);
        assert_eq!((-1i8).kind(), Kind::Signed);
        assert_eq!(String::new().kind(), Kind::Text);
        assert_eq!(Duration::ZERO.kind(), Kind::Duration);
        assert_eq!(Vec::<String>::new().kind(), Kind::StringList);
        assert_eq!(None::<u8>.kind(), Kind::Unsigned);
        assert_eq!(tracing::Level::WARN.kind(), Kind::Custom);
    }

    #[test]
    fn set_node_decodes_structurally() {
        let mut port = 0u16;
        port.set_node(&Node::Value(json!(8080))).unwrap();
        assert_eq!(port, 8080);

        let mut tags: Vec<String> = vec![];
        tags.set_node(&Node::Value(json!(["a", "b"]))).unwrap();
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn set_node_rejects_mismatch() {
        let mut port = 7u16;
        let err = port.set_node(&Node::Value(json!("8080"))).unwrap_err();
        assert!(matches!(
            err,
            CoerceError::Mismatch {
                kind: Kind::Unsigned,
                ..
            }
        ));
        assert_eq!(port, 7);

        let mut small = 0u8;
        assert!(small.set_node(&Node::Value(json!(300))).is_err());
    }

    #[test]
    fn option_wraps_leaf() {
        let mut url: Option<String> = None;
        url.set_text("pg://").unwrap();
        assert_eq!(url.as_deref(), Some("pg://"));

        url.set_node(&Node::Value(serde_json::Value::Null)).unwrap();
        assert_eq!(url, None);

        let mut port: Option<u16> = Some(1);
        assert!(port.set_text("nope").is_err());
        assert_eq!(port, Some(1));
        port.reset();
        assert_eq!(port, None);
    }

    #[test]
    fn option_looks_through_to_nested_settings() {
        use crate::fixtures::test::PoolSettings;

        let mut pool: Option<PoolSettings> = None;
        assert_eq!(pool.kind(), Kind::Struct);
        assert!(pool.as_settings_mut().is_none());

        pool = Some(PoolSettings { size: 3 });
        let nested = pool.as_settings_mut().unwrap();
        assert_eq!(nested.fields_mut()[0].name, "size");

        let mut port: Option<u16> = Some(1);
        assert!(port.as_settings_mut().is_none());
    }

    #[test]
    fn box_delegates_to_inner_value() {
        use crate::fixtures::test::PoolSettings;

        let mut port = Box::new(1u16);
        assert_eq!(port.kind(), Kind::Unsigned);
        port.set_text("8080").unwrap();
        assert_eq!(*port, 8080);
        port.reset();
        assert_eq!(*port, 0);

        let mut pool = Box::new(PoolSettings { size: 3 });
        assert_eq!(pool.kind(), Kind::Struct);
        assert!(pool.as_settings_mut().is_some());
        pool.reset();
        assert_eq!(pool.size, 0);
    }

    #[test]
    fn tracing_level_decodes_from_text() {
        let mut level = tracing::Level::ERROR;
        level.set_text("debug").unwrap();
        assert_eq!(level, tracing::Level::DEBUG);
        level.set_node(&Node::Value(json!("WARN"))).unwrap();
        assert_eq!(level, tracing::Level::WARN);
        assert!(level.set_text("loud").is_err());
        level.reset();
        assert_eq!(level, tracing::Level::INFO);
    }
}
