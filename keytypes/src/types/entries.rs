// Map, preserve and level name tables of a key type under construction.

use keytypes_core::{Atom, Context, KeyTypeEntry, LevelIndex, ModMask, ModSet};

use super::builder::KeyTypeBuilder;

impl KeyTypeBuilder {
    /// Adds `map[mask] = level`. `mask` is clipped to the type's
    /// modifiers first. With `clobber` a conflicting level replaces the
    /// existing one, otherwise the existing one is kept.
    pub fn add_map_entry(
        &mut self,
        ctx: &mut Context,
        mods: &ModSet,
        mask: ModMask,
        level: LevelIndex,
        clobber: bool,
    ) {
        let mask = self.clip_to_type(ctx, mods, mask, "Map entry");
        let type_name = self.type_text(ctx);

        match self.entries.get_mut(&mask) {
            Some(old) if old.level == level => {
                let mask_text = mods.mask_text(ctx.atoms(), mask);
                ctx.vrb(10, format_args!(
                    "Multiple occurrences of map[{}]= {} in {}; Ignored",
                    mask_text,
                    level + 1,
                    type_name
                ));
            }
            Some(old) => {
                let (used, ignored) = if clobber {
                    (level, old.level)
                } else {
                    (old.level, level)
                };
                let mask_text = mods.mask_text(ctx.atoms(), mask);
                ctx.warn(format_args!(
                    "Multiple map entries for {} in {}; Using {}, ignoring {}",
                    mask_text,
                    type_name,
                    used + 1,
                    ignored + 1
                ));
                if clobber {
                    old.level = level;
                    self.num_levels = self.num_levels.max(level + 1);
                }
            }
            None => {
                self.num_levels = self.num_levels.max(level + 1);
                self.entries.insert(
                    mask,
                    KeyTypeEntry {
                        mods: mask,
                        level,
                        preserve: ModMask::empty(),
                    },
                );
            }
        }
    }

    /// Adds `preserve[mask] = preserve`. A preserve declared before its
    /// map entry creates that entry at the first level.
    pub fn add_preserve(&mut self, ctx: &mut Context, mods: &ModSet, mask: ModMask, preserve: ModMask) {
        let mask = self.clip_to_type(ctx, mods, mask, "Preserve entry");
        let type_name = self.type_text(ctx);
        let mask_text = mods.mask_text(ctx.atoms(), mask);

        let mut preserve = preserve;
        if !(preserve - mask).is_empty() {
            let before = mods.mask_text(ctx.atoms(), preserve);
            preserve &= mask;
            let after = mods.mask_text(ctx.atoms(), preserve);
            ctx.vrb(1, format_args!(
                "Illegal value for preserve[{}] in type {}; Converted {} to {}",
                mask_text, type_name, before, after
            ));
        }

        match self.entries.get_mut(&mask) {
            Some(entry) if entry.preserve.is_empty() => {
                entry.preserve = preserve;
            }
            Some(entry) if entry.preserve == preserve => {
                ctx.vrb(10, format_args!(
                    "Identical definitions for preserve[{}] in {}; Ignored",
                    mask_text, type_name
                ));
            }
            Some(entry) => {
                let used = mods.mask_text(ctx.atoms(), preserve);
                let ignored = mods.mask_text(ctx.atoms(), entry.preserve);
                ctx.vrb(1, format_args!(
                    "Multiple definitions for preserve[{}] in {}; Using {}, ignoring {}",
                    mask_text, type_name, used, ignored
                ));
                entry.preserve = preserve;
            }
            None => {
                // A later map[] may still set the level.
                self.entries.insert(
                    mask,
                    KeyTypeEntry {
                        mods: mask,
                        level: 0,
                        preserve,
                    },
                );
            }
        }
    }

    /// Names `level`, growing the name table as needed.
    pub fn add_level_name(&mut self, ctx: &mut Context, level: LevelIndex, name: Atom, clobber: bool) {
        let slot = level as usize;
        if slot >= self.level_names.len() {
            self.level_names.resize(slot + 1, None);
            self.level_names[slot] = Some(name);
            return;
        }

        let type_name = self.type_text(ctx);
        match self.level_names[slot] {
            Some(old) if old == name => {
                ctx.vrb(10, format_args!(
                    "Duplicate names for level {} of key type {}; Ignored",
                    level + 1,
                    type_name
                ));
            }
            Some(old) => {
                let old_text = ctx.atom_text(old).to_string();
                let new_text = ctx.atom_text(name).to_string();
                let (used, ignored) = if clobber {
                    (new_text, old_text)
                } else {
                    (old_text, new_text)
                };
                ctx.vrb(1, format_args!(
                    "Multiple names for level {} of key type {}; Using {}, ignoring {}",
                    level + 1,
                    type_name,
                    used,
                    ignored
                ));
                if clobber {
                    self.level_names[slot] = Some(name);
                }
            }
            None => self.level_names[slot] = Some(name),
        }
    }

    fn clip_to_type(&self, ctx: &mut Context, mods: &ModSet, mask: ModMask, what: &str) -> ModMask {
        if (mask - self.mods).is_empty() {
            return mask;
        }
        let clipped = mask & self.mods;
        let type_name = self.type_text(ctx);
        let before = mods.mask_text(ctx.atoms(), mask);
        let after = mods.mask_text(ctx.atoms(), clipped);
        ctx.vrb(1, format_args!(
            "{} for unused modifiers in {}; Using {} instead of {}",
            what, type_name, after, before
        ));
        clipped
    }
}
