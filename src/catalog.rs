//! Field catalog: the flat list of every settable field of a settings value.
//!
//! The catalog is built depth-first from [`Settings::fields_mut`]. Nested
//! structs are recorded before their children, so a reader that walks the
//! catalog in order writes a whole struct before refining its fields.
//!
//! A [`Field`] stores the path to its slot, not the slot itself: a struct slot
//! and its children cannot be borrowed mutably at the same time. Readers call
//! [`Field::slot`] to re-resolve the path for each assignment.

use crate::annotation::{self, ParameterConfig};
use crate::error::LayerfigError;
use crate::setting::{Kind, Setting, Settings};

/// One settable field, leaf or nested struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Names of the enclosing structs, outermost first.
    pub base: Vec<String>,
    pub name: String,
    pub kind: Kind,
    pub config: ParameterConfig,
}

impl Field {
    /// `base` and `name` joined with `separator`.
    pub fn full_name(&self, separator: &str) -> String {
        let mut full = String::new();
        for segment in &self.base {
            full.push_str(segment);
            full.push_str(separator);
        }
        full.push_str(&self.name);
        full
    }

    /// Dotted path, used in logs and error messages.
    pub fn path(&self) -> String {
        self.full_name(".")
    }

    /// Resolve this field to its writable slot in `root`.
    pub fn slot<'a>(&self, root: &'a mut dyn Settings) -> Result<&'a mut dyn Setting, LayerfigError> {
        let cant_set = || LayerfigError::CantSet(self.path());

        let mut current = root;
        for segment in &self.base {
            let slot = current
                .fields_mut()
                .into_iter()
                .find(|s| s.name == segment.as_str())
                .ok_or_else(cant_set)?;
            current = slot.value.as_settings_mut().ok_or_else(cant_set)?;
        }

        current
            .fields_mut()
            .into_iter()
            .find(|s| s.name == self.name.as_str())
            .map(|s| s.value)
            .ok_or_else(cant_set)
    }
}

/// Build the catalog of `root`. Fails on the first malformed annotation.
pub fn build(root: &mut dyn Settings) -> Result<Vec<Field>, LayerfigError> {
    let mut fields = Vec::new();
    collect(root, &mut Vec::new(), &mut fields)?;
    Ok(fields)
}

fn collect(
    settings: &mut dyn Settings,
    base: &mut Vec<String>,
    out: &mut Vec<Field>,
) -> Result<(), LayerfigError> {
    for slot in settings.fields_mut() {
        let field = Field {
            base: base.clone(),
            name: slot.name.to_string(),
            kind: slot.value.kind(),
            config: ParameterConfig::default(),
        };
        let config = annotation::parse(slot.annotation).map_err(|source| {
            LayerfigError::Annotation {
                field: field.path(),
                source,
            }
        })?;
        out.push(Field { config, ..field });

        if let Some(nested) = slot.value.as_settings_mut() {
            base.push(slot.name.to_string());
            collect(nested, base, out)?;
            base.pop();
        }
    }
    Ok(())
}
