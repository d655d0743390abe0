use super::atom::{Atom, AtomTable};
use super::modifiers::{ModMask, ModSet};

/// Zero-based shift level
pub type LevelIndex = u32;

/// Highest level number accepted in source (1-based)
pub const MAX_LEVEL: LevelIndex = 2048;

/// Name of the implicit type installed when a keymap declares none
pub const DEFAULT_TYPE_NAME: &str = "default";

/// How a definition interacts with an earlier one of the same name
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    #[default]
    Default,
    Augment,
    Override,
    Replace,
}

impl MergeMode {
    /// True when a new definition displaces an existing one
    pub fn replaces(self) -> bool {
        matches!(self, MergeMode::Override | MergeMode::Replace)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MergeMode::Default => "default",
            MergeMode::Augment => "augment",
            MergeMode::Override => "override",
            MergeMode::Replace => "replace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTypeEntry {
    pub mods: ModMask,
    pub level: LevelIndex,
    /// Always a subset of `mods`
    pub preserve: ModMask,
}

/// A finalized key type as installed into a [`Keymap`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyType {
    pub name: Atom,
    pub mods: ModMask,
    pub num_levels: LevelIndex,
    pub entries: Vec<KeyTypeEntry>,
    pub level_names: Vec<Option<Atom>>,
}

impl KeyType {
    pub fn entry_for(&self, mods: ModMask) -> Option<&KeyTypeEntry> {
        self.entries.iter().find(|e| e.mods == mods)
    }

    pub fn level_name(&self, level: LevelIndex) -> Option<Atom> {
        self.level_names.get(level as usize).copied().flatten()
    }
}

/// The part of a keymap the key type stage reads and writes
#[derive(Debug, Clone)]
pub struct Keymap {
    pub mods: ModSet,
    pub types: Vec<KeyType>,
    pub types_section_name: Option<String>,
}

impl Keymap {
    pub fn new(atoms: &mut AtomTable) -> Self {
        Self {
            mods: ModSet::new(atoms),
            types: Vec::new(),
            types_section_name: None,
        }
    }

    pub fn find_type(&self, name: Atom) -> Option<&KeyType> {
        self.types.iter().find(|t| t.name == name)
    }
}

/// Replaces characters not allowed in an XKB map name with `_`
pub fn escape_map_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_-+()%./".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}
