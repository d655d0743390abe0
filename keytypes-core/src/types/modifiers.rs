use bitflags::bitflags;

use super::atom::{Atom, AtomTable};
use super::errors::VModError;

/// Upper bound on real plus virtual modifiers in one set
pub const MAX_MODS: usize = 32;

bitflags! {
    /// Mask over the modifier set. The low eight bits are the real
    /// modifiers; higher bits index virtual modifiers by their position
    /// in the owning [`ModSet`].
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ModMask: u32 {
        const SHIFT   = 1 << 0;
        const LOCK    = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1    = 1 << 3;
        const MOD2    = 1 << 4;
        const MOD3    = 1 << 5;
        const MOD4    = 1 << 6;
        const MOD5    = 1 << 7;

        const _ = !0;
    }
}

impl ModMask {
    /// Every real modifier
    pub const REAL: Self = Self::from_bits_retain(0xff);

    /// Mask with only the modifier at `index` set
    pub fn from_index(index: usize) -> Self {
        Self::from_bits_retain(1u32 << index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModKind {
    Real,
    Virtual,
}

bitflags! {
    /// Kinds of modifiers an expression is allowed to name
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModKinds: u8 {
        const REAL    = 1 << 0;
        const VIRTUAL = 1 << 1;
        const BOTH    = Self::REAL.bits() | Self::VIRTUAL.bits();
    }
}

impl ModKinds {
    pub fn allows(self, kind: ModKind) -> bool {
        match kind {
            ModKind::Real => self.contains(ModKinds::REAL),
            ModKind::Virtual => self.contains(ModKinds::VIRTUAL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mod {
    pub name: Atom,
    pub kind: ModKind,
    /// Real modifiers a virtual modifier is bound to; empty for real ones
    pub mapping: ModMask,
}

const REAL_MOD_NAMES: [&str; 8] = [
    "Shift", "Lock", "Control", "Mod1", "Mod2", "Mod3", "Mod4", "Mod5",
];

/// Ordered modifier set. A modifier's bit in a [`ModMask`] is its index
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModSet {
    mods: Vec<Mod>,
}

impl ModSet {
    /// A set holding only the eight real modifiers, in canonical order
    pub fn new(atoms: &mut AtomTable) -> Self {
        let mods = REAL_MOD_NAMES
            .iter()
            .map(|name| Mod {
                name: atoms.intern(name),
                kind: ModKind::Real,
                mapping: ModMask::empty(),
            })
            .collect();
        Self { mods }
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Mod)> {
        self.mods.iter().enumerate()
    }

    pub fn get(&self, index: usize) -> Option<&Mod> {
        self.mods.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Mod> {
        self.mods.get_mut(index)
    }

    pub fn find(&self, name: Atom) -> Option<usize> {
        self.mods.iter().position(|m| m.name == name)
    }

    /// Looks a modifier up by name. Real modifier names match
    /// case-insensitively, virtual ones exactly.
    pub fn find_by_name(&self, atoms: &AtomTable, name: &str, kinds: ModKinds) -> Option<usize> {
        self.mods.iter().position(|m| {
            if !kinds.allows(m.kind) {
                return false;
            }
            let text = atoms.text(m.name);
            match m.kind {
                ModKind::Real => text.eq_ignore_ascii_case(name),
                ModKind::Virtual => text == name,
            }
        })
    }

    /// Mask of every modifier of the given kinds
    pub fn mask_of_kinds(&self, kinds: ModKinds) -> ModMask {
        self.iter()
            .filter(|(_, m)| kinds.allows(m.kind))
            .fold(ModMask::empty(), |acc, (i, _)| acc | ModMask::from_index(i))
    }

    pub fn add_virtual(&mut self, name: Atom, mapping: ModMask) -> Result<usize, VModError> {
        if self.mods.len() >= MAX_MODS {
            return Err(VModError::TooMany { max: MAX_MODS });
        }
        self.mods.push(Mod {
            name,
            kind: ModKind::Virtual,
            mapping,
        });
        Ok(self.mods.len() - 1)
    }

    /// Human-readable form of a mask: `none`, `all`, or modifier names
    /// joined by `+`. Bits with no modifier behind them trail as hex.
    pub fn mask_text(&self, atoms: &AtomTable, mask: ModMask) -> String {
        if mask.is_empty() {
            return "none".to_string();
        }
        if mask == ModMask::REAL {
            return "all".to_string();
        }

        let mut parts = Vec::new();
        let mut rest = mask.bits();
        for (i, m) in self.iter() {
            let bit = 1u32 << i;
            if rest & bit != 0 {
                parts.push(atoms.text(m.name).to_string());
                rest &= !bit;
            }
        }
        if rest != 0 {
            parts.push(format!("0x{:x}", rest));
        }
        parts.join("+")
    }
}
