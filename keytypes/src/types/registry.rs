use indexmap::map::Entry;
use indexmap::IndexMap;

use keytypes_core::keymap::escape_map_name;
use keytypes_core::{Atom, Context, KeyType, Keymap, MergeMode, ModMask, ModSet, DEFAULT_TYPE_NAME};

use super::builder::KeyTypeBuilder;

/// Named key types collected from one file (or one include), together
/// with the modifier set they were resolved against.
#[derive(Debug, Clone)]
pub struct KeyTypeRegistry {
    pub name: Option<String>,
    pub error_count: usize,
    pub types: IndexMap<Atom, KeyTypeBuilder>,
    pub mods: ModSet,
}

impl KeyTypeRegistry {
    pub fn new(mods: ModSet) -> Self {
        Self {
            name: None,
            error_count: 0,
            types: IndexMap::new(),
            mods,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, name: Atom) -> Option<&KeyTypeBuilder> {
        self.types.get(&name)
    }

    /// Registers a finished type. An existing type of the same name is
    /// replaced only when the new one's merge mode is replace or
    /// override; otherwise the new one is dropped.
    pub fn add_key_type(&mut self, ctx: &mut Context, new: KeyTypeBuilder, same_file: bool) {
        let mut slot = match self.types.entry(new.name) {
            Entry::Vacant(slot) => {
                slot.insert(new);
                return;
            }
            Entry::Occupied(slot) => slot,
        };

        let type_name = ctx.atom_text(new.name).to_string();
        if new.merge.replaces() {
            ctx.vrb(if same_file { 1 } else { 10 }, format_args!(
                "Multiple definitions of the {} key type; Earlier definition ignored",
                type_name
            ));
            slot.insert(new);
            return;
        }

        if same_file {
            ctx.warn(format_args!(
                "Multiple definitions of the {} key type; Later definition ignored",
                type_name
            ));
        }
    }

    /// Folds the types compiled from an included file into this
    /// registry. A failed include only contributes its error count.
    pub fn merge_included(&mut self, ctx: &mut Context, from: KeyTypeRegistry, merge: MergeMode) {
        if from.error_count > 0 {
            self.error_count += from.error_count;
            return;
        }

        self.mods = from.mods;
        if self.name.is_none() {
            self.name = from.name;
        }

        for (_, mut key_type) in from.types {
            if key_type.merge == MergeMode::Default {
                key_type.merge = merge;
            }
            self.add_key_type(ctx, key_type, false);
        }
    }

    /// Installs the collected types into `keymap`. A registry with no
    /// types installs the single implicit `default` type.
    pub fn install(self, ctx: &mut Context, keymap: &mut Keymap) {
        let types: Vec<KeyType> = if self.types.is_empty() {
            vec![KeyType {
                name: ctx.intern(DEFAULT_TYPE_NAME),
                mods: ModMask::empty(),
                num_levels: 1,
                entries: Vec::new(),
                level_names: Vec::new(),
            }]
        } else {
            self.types.into_values().map(KeyTypeBuilder::build).collect()
        };

        ctx.info(format_args!(
            "Installed {} key type(s) from {}",
            types.len(),
            self.name.as_deref().unwrap_or("(unnamed)")
        ));

        keymap.types_section_name = self.name.as_deref().map(escape_map_name);
        keymap.types = types;
        keymap.mods = self.mods;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytypes_core::LevelIndex;
    use log::LevelFilter;
    use pretty_assertions::assert_eq;

    fn ctx() -> Context {
        Context::new().with_log_level(LevelFilter::Warn).with_verbosity(10)
    }

    fn two_level(ctx: &mut Context, mods: &ModSet, name: &str, merge: MergeMode, level: LevelIndex) -> KeyTypeBuilder {
        let atom = ctx.intern(name);
        let mut builder = KeyTypeBuilder::new(atom, merge);
        builder.mods = ModMask::SHIFT;
        builder.add_map_entry(ctx, mods, ModMask::SHIFT, level, true);
        builder
    }

    #[test]
    fn test_default_merge_keeps_first() {
        let mut ctx = ctx();
        let mods = ModSet::new(ctx.atoms_mut());
        let mut registry = KeyTypeRegistry::new(mods.clone());

        let first = two_level(&mut ctx, &mods, "TWO_LEVEL", MergeMode::Default, 1);
        let second = two_level(&mut ctx, &mods, "TWO_LEVEL", MergeMode::Default, 1);
        registry.add_key_type(&mut ctx, first.clone(), true);
        registry.add_key_type(&mut ctx, second, true);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.types[0], first);
        assert_eq!(
            ctx.diagnostics().last().map(|d| d.message.as_str()),
            Some("Multiple definitions of the TWO_LEVEL key type; Later definition ignored")
        );
    }

    #[test]
    fn test_replace_takes_second_in_place() {
        let mut ctx = ctx();
        let mods = ModSet::new(ctx.atoms_mut());
        let mut registry = KeyTypeRegistry::new(mods.clone());

        let other = two_level(&mut ctx, &mods, "ONE_LEVEL", MergeMode::Default, 0);
        let first = two_level(&mut ctx, &mods, "TWO_LEVEL", MergeMode::Default, 1);
        let second = two_level(&mut ctx, &mods, "TWO_LEVEL", MergeMode::Replace, 2);
        registry.add_key_type(&mut ctx, other, true);
        registry.add_key_type(&mut ctx, first, true);
        registry.add_key_type(&mut ctx, second.clone(), true);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.types[1], second);
        assert_eq!(registry.types[1].num_levels, 3);
    }

    #[test]
    fn test_cross_file_augment_is_quiet() {
        let mut ctx = ctx();
        let mods = ModSet::new(ctx.atoms_mut());
        let mut registry = KeyTypeRegistry::new(mods.clone());

        let first = two_level(&mut ctx, &mods, "T", MergeMode::Default, 1);
        let second = two_level(&mut ctx, &mods, "T", MergeMode::Augment, 2);
        registry.add_key_type(&mut ctx, first, false);
        registry.add_key_type(&mut ctx, second, false);

        assert_eq!(registry.types[0].num_levels, 2);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_cross_file_override_only_at_high_verbosity() {
        let mut quiet = Context::new().with_log_level(LevelFilter::Warn).with_verbosity(9);
        let mods = ModSet::new(quiet.atoms_mut());
        let mut registry = KeyTypeRegistry::new(mods.clone());

        let first = two_level(&mut quiet, &mods, "T", MergeMode::Default, 1);
        let second = two_level(&mut quiet, &mods, "T", MergeMode::Override, 2);
        registry.add_key_type(&mut quiet, first, false);
        registry.add_key_type(&mut quiet, second, false);

        assert_eq!(registry.types[0].num_levels, 3);
        assert!(quiet.diagnostics().is_empty());
    }

    #[test]
    fn test_same_file_replace_reported_at_verbosity_one() {
        for (verbosity, expected) in [
            (0, vec![]),
            (1, vec!["Multiple definitions of the T key type; Earlier definition ignored"]),
        ] {
            let mut ctx = Context::new().with_log_level(LevelFilter::Warn).with_verbosity(verbosity);
            let mods = ModSet::new(ctx.atoms_mut());
            let mut registry = KeyTypeRegistry::new(mods.clone());

            let first = two_level(&mut ctx, &mods, "T", MergeMode::Default, 1);
            let second = two_level(&mut ctx, &mods, "T", MergeMode::Replace, 2);
            registry.add_key_type(&mut ctx, first, true);
            registry.add_key_type(&mut ctx, second, true);

            let messages: Vec<&str> = ctx.diagnostics().iter().map(|d| d.message.as_str()).collect();
            assert_eq!(messages, expected, "verbosity {}", verbosity);
            assert_eq!(registry.types[0].num_levels, 3);
        }
    }

    #[test]
    fn test_merge_included_propagates_errors_only() {
        let mut ctx = ctx();
        let mods = ModSet::new(ctx.atoms_mut());
        let mut into = KeyTypeRegistry::new(mods.clone());
        let mut from = KeyTypeRegistry::new(mods.clone());
        from.name = Some("broken".to_string());
        from.error_count = 2;
        let t = two_level(&mut ctx, &mods, "T", MergeMode::Default, 1);
        from.add_key_type(&mut ctx, t, true);

        into.merge_included(&mut ctx, from, MergeMode::Default);

        assert_eq!(into.error_count, 2);
        assert!(into.is_empty());
        assert_eq!(into.name, None);
    }

    #[test]
    fn test_merge_included_mode_applies_to_default_types_only() {
        let mut ctx = ctx();
        let mods = ModSet::new(ctx.atoms_mut());
        let mut into = KeyTypeRegistry::new(mods.clone());
        for name in ["A", "B"] {
            let t = two_level(&mut ctx, &mods, name, MergeMode::Default, 1);
            into.add_key_type(&mut ctx, t, true);
        }

        let mut from = KeyTypeRegistry::new(mods.clone());
        from.name = Some("extra".to_string());
        let a = two_level(&mut ctx, &mods, "A", MergeMode::Default, 2);
        let b = two_level(&mut ctx, &mods, "B", MergeMode::Augment, 2);
        from.add_key_type(&mut ctx, a, true);
        from.add_key_type(&mut ctx, b, true);

        into.merge_included(&mut ctx, from, MergeMode::Override);

        let a = ctx.intern("A");
        let b = ctx.intern("B");
        assert_eq!(into.get(a).map(|t| t.num_levels), Some(3));
        assert_eq!(into.get(b).map(|t| t.num_levels), Some(2));
        assert_eq!(into.name.as_deref(), Some("extra"));
    }

    #[test]
    fn test_install_empty_registry_synthesizes_default() {
        let mut ctx = ctx();
        let mut keymap = Keymap::new(ctx.atoms_mut());
        let registry = KeyTypeRegistry::new(keymap.mods.clone());

        registry.install(&mut ctx, &mut keymap);

        assert_eq!(keymap.types.len(), 1);
        let default = &keymap.types[0];
        assert_eq!(ctx.atom_text(default.name), DEFAULT_TYPE_NAME);
        assert_eq!(default.mods, ModMask::empty());
        assert_eq!(default.num_levels, 1);
        assert!(default.entries.is_empty());
        assert!(default.level_names.is_empty());
    }

    #[test]
    fn test_install_preserves_order_and_escapes_name() {
        let mut ctx = ctx();
        let mut keymap = Keymap::new(ctx.atoms_mut());
        let mods = keymap.mods.clone();
        let mut registry = KeyTypeRegistry::new(mods.clone());
        registry.name = Some("my types".to_string());
        for name in ["ONE", "TWO", "THREE"] {
            let t = two_level(&mut ctx, &mods, name, MergeMode::Default, 1);
            registry.add_key_type(&mut ctx, t, true);
        }

        registry.install(&mut ctx, &mut keymap);

        let names: Vec<_> = keymap.types.iter().map(|t| ctx.atom_text(t.name).to_string()).collect();
        assert_eq!(names, vec!["ONE", "TWO", "THREE"]);
        assert_eq!(keymap.types_section_name.as_deref(), Some("my_types"));
    }
}
