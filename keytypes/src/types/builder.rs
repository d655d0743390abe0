use bitflags::bitflags;
use indexmap::IndexMap;
use log::Level;
use thiserror::Error;

use keytypes_core::{
    Atom, Context, ExprError, KeyType, KeyTypeEntry, LevelIndex, MergeMode, ModKinds, ModMask,
    ModSet,
};

use crate::ast::{Expr, FieldRef, VarDef};
use crate::expr::{resolve_level, resolve_mod_mask, resolve_text};

bitflags! {
    /// Fields a type body has touched, for reporting
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFields: u8 {
        const MASK       = 1 << 0;
        const MAP        = 1 << 1;
        const PRESERVE   = 1 << 2;
        const LEVEL_NAME = 1 << 3;
    }
}

/// A field assignment inside a type body that was abandoned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("The {field} field of key type {type_name} is not an array; Illegal array subscript")]
    ShouldNotBeArray {
        field: &'static str,
        type_name: String,
    },

    #[error("Missing subscript for {field} of key type {type_name}")]
    ShouldBeArray {
        field: &'static str,
        type_name: String,
    },

    #[error("The {field} field of key type {type_name} must be a {wanted}: {source}")]
    BadType {
        field: &'static str,
        type_name: String,
        wanted: &'static str,
        source: ExprError,
    },

    #[error("Key type mask field must be a modifier mask; Key type definition ignored: {source}")]
    BadMask { source: ExprError },

    #[error("Multiple modifier mask definitions for key type {type_name}; Using {used}, ignoring {ignored}")]
    MultipleModifierMasks {
        type_name: String,
        used: String,
        ignored: String,
    },

    #[error("Level specifications in a key type must be integer; Ignoring malformed level specification: {source}")]
    MalformedLevel { source: ExprError },

    #[error("Preserve value in a key type is not a modifier mask; Ignoring preserve[{mods}] in type {type_name}")]
    BadPreserveValue { mods: String, type_name: String },

    #[error("Non-string name for level {level} in key type {type_name}; Ignoring illegal level name definition")]
    NonStringLevelName { level: LevelIndex, type_name: String },

    #[error("Unknown field {field} in key type {type_name}; Definition ignored")]
    UnknownField { field: String, type_name: String },

    #[error("Support for changing the default type has been removed; Statement ignored")]
    DefaultTypeRemoved,
}

impl FieldError {
    /// Conflicting redefinitions are warnings; malformed input is an error
    pub fn level(&self) -> Level {
        match self {
            FieldError::MultipleModifierMasks { .. } => Level::Warn,
            _ => Level::Error,
        }
    }
}

/// One key type under construction from a `type "<name>" { ... }` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTypeBuilder {
    pub name: Atom,
    pub merge: MergeMode,
    pub defined: TypeFields,
    pub mods: ModMask,
    pub num_levels: LevelIndex,
    /// Keyed by the entry's modifier mask, in insertion order
    pub entries: IndexMap<ModMask, KeyTypeEntry>,
    pub level_names: Vec<Option<Atom>>,
    mods_assigned: bool,
}

impl KeyTypeBuilder {
    pub fn new(name: Atom, merge: MergeMode) -> Self {
        Self {
            name,
            merge,
            defined: TypeFields::empty(),
            mods: ModMask::empty(),
            num_levels: 1,
            entries: IndexMap::new(),
            level_names: Vec::new(),
            mods_assigned: false,
        }
    }

    pub(crate) fn type_text(&self, ctx: &Context) -> String {
        ctx.atom_text(self.name).to_string()
    }

    /// Applies every field of a type body. Returns how many assignments
    /// failed; a failure does not stop the remaining fields.
    pub fn apply_body(&mut self, ctx: &mut Context, mods: &ModSet, body: &[VarDef]) -> usize {
        let mut failed = 0;
        for def in body {
            if let Err(err) = self.set_field(ctx, mods, &def.lhs, &def.value) {
                ctx.emit(err.level(), 0, format_args!("{}", err));
                failed += 1;
            }
        }
        failed
    }

    pub fn set_field(
        &mut self,
        ctx: &mut Context,
        mods: &ModSet,
        lhs: &FieldRef,
        value: &Expr,
    ) -> Result<(), FieldError> {
        let is_type = |s: &str| s.eq_ignore_ascii_case("type");
        if lhs.element.as_deref().is_some_and(is_type) || is_type(&lhs.field) {
            return Err(FieldError::DefaultTypeRemoved);
        }
        if let Some(element) = &lhs.element {
            return Err(FieldError::UnknownField {
                field: format!("{}.{}", element, lhs.field),
                type_name: self.type_text(ctx),
            });
        }

        let index = lhs.index.as_ref();
        let field = lhs.field.as_str();
        let (kind, result) = if field.eq_ignore_ascii_case("modifiers") {
            (TypeFields::MASK, self.set_modifiers(ctx, mods, index, value))
        } else if field.eq_ignore_ascii_case("map") {
            (TypeFields::MAP, self.set_map_entry(ctx, mods, index, value))
        } else if field.eq_ignore_ascii_case("preserve") {
            (TypeFields::PRESERVE, self.set_preserve(ctx, mods, index, value))
        } else if field.eq_ignore_ascii_case("levelname") || field.eq_ignore_ascii_case("level_name") {
            (TypeFields::LEVEL_NAME, self.set_level_name(ctx, index, value))
        } else {
            (
                TypeFields::empty(),
                Err(FieldError::UnknownField {
                    field: lhs.field.clone(),
                    type_name: self.type_text(ctx),
                }),
            )
        };

        self.defined |= kind;
        result
    }

    fn set_modifiers(
        &mut self,
        ctx: &mut Context,
        mods: &ModSet,
        index: Option<&Expr>,
        value: &Expr,
    ) -> Result<(), FieldError> {
        if index.is_some() {
            return Err(FieldError::ShouldNotBeArray {
                field: "modifiers",
                type_name: self.type_text(ctx),
            });
        }
        let mask = resolve_mod_mask(ctx, value, ModKinds::BOTH, mods)
            .map_err(|source| FieldError::BadMask { source })?;

        if self.mods_assigned {
            if mask == self.mods {
                let type_name = self.type_text(ctx);
                ctx.vrb(10, format_args!(
                    "Identical modifier mask definitions for key type {}; Ignored",
                    type_name
                ));
                return Ok(());
            }
            return Err(FieldError::MultipleModifierMasks {
                type_name: self.type_text(ctx),
                used: mods.mask_text(ctx.atoms(), self.mods),
                ignored: mods.mask_text(ctx.atoms(), mask),
            });
        }

        self.mods = mask;
        self.mods_assigned = true;
        Ok(())
    }

    fn set_map_entry(
        &mut self,
        ctx: &mut Context,
        mods: &ModSet,
        index: Option<&Expr>,
        value: &Expr,
    ) -> Result<(), FieldError> {
        let Some(index) = index else {
            return Err(FieldError::ShouldBeArray {
                field: "map entry",
                type_name: self.type_text(ctx),
            });
        };
        let mask = resolve_mod_mask(ctx, index, ModKinds::BOTH, mods).map_err(|source| {
            FieldError::BadType {
                field: "map entry",
                type_name: self.type_text(ctx),
                wanted: "modifier mask",
                source,
            }
        })?;
        let level = resolve_level(value).map_err(|source| FieldError::MalformedLevel { source })?;

        self.add_map_entry(ctx, mods, mask, level, true);
        Ok(())
    }

    fn set_preserve(
        &mut self,
        ctx: &mut Context,
        mods: &ModSet,
        index: Option<&Expr>,
        value: &Expr,
    ) -> Result<(), FieldError> {
        let Some(index) = index else {
            return Err(FieldError::ShouldBeArray {
                field: "preserve entry",
                type_name: self.type_text(ctx),
            });
        };
        let mask = resolve_mod_mask(ctx, index, ModKinds::BOTH, mods).map_err(|source| {
            FieldError::BadType {
                field: "preserve entry",
                type_name: self.type_text(ctx),
                wanted: "modifier mask",
                source,
            }
        })?;
        let preserve = resolve_mod_mask(ctx, value, ModKinds::BOTH, mods).map_err(|_| {
            FieldError::BadPreserveValue {
                mods: mods.mask_text(ctx.atoms(), mask & self.mods),
                type_name: self.type_text(ctx),
            }
        })?;

        self.add_preserve(ctx, mods, mask, preserve);
        Ok(())
    }

    fn set_level_name(
        &mut self,
        ctx: &mut Context,
        index: Option<&Expr>,
        value: &Expr,
    ) -> Result<(), FieldError> {
        let Some(index) = index else {
            return Err(FieldError::ShouldBeArray {
                field: "level name",
                type_name: self.type_text(ctx),
            });
        };
        let level = resolve_level(index).map_err(|source| FieldError::BadType {
            field: "level name",
            type_name: self.type_text(ctx),
            wanted: "integer",
            source,
        })?;
        let name = resolve_text(ctx, value).map_err(|_| FieldError::NonStringLevelName {
            level: level + 1,
            type_name: self.type_text(ctx),
        })?;

        self.add_level_name(ctx, level, name, true);
        Ok(())
    }

    /// Finalizes into the keymap record, moving entries and names
    pub fn build(self) -> KeyType {
        KeyType {
            name: self.name,
            mods: self.mods,
            num_levels: self.num_levels,
            entries: self.entries.into_values().collect(),
            level_names: self.level_names,
        }
    }
}
