use keytypes_core::{Context, MergeMode, ModKind, ModKinds, ModMask, ModSet, VModError};

use crate::ast::VModDef;
use crate::expr::resolve_mod_mask;

/// Declares (or redeclares) a virtual modifier in `mods`
pub fn handle_vmod_def(
    ctx: &mut Context,
    mods: &mut ModSet,
    def: &VModDef,
    merge: MergeMode,
) -> Result<(), VModError> {
    let merge = if merge == MergeMode::Default { def.merge } else { merge };

    let mapping = match &def.value {
        Some(value) => resolve_mod_mask(ctx, value, ModKinds::REAL, mods).map_err(|source| {
            VModError::BadMapping {
                name: def.name.clone(),
                source,
            }
        })?,
        None => ModMask::empty(),
    };

    let name = ctx.intern(&def.name);
    let Some(index) = mods.find(name) else {
        mods.add_virtual(name, mapping)?;
        return Ok(());
    };

    let (kind, old_mapping) = match mods.get(index) {
        Some(m) => (m.kind, m.mapping),
        None => return Ok(()),
    };
    if kind != ModKind::Virtual {
        return Err(VModError::NotVirtual(def.name.clone()));
    }
    if old_mapping == mapping {
        return Ok(());
    }

    let mut new_mapping = mapping;
    if !old_mapping.is_empty() {
        let (used, ignored) = if merge == MergeMode::Override {
            (mapping, old_mapping)
        } else {
            (old_mapping, mapping)
        };
        let used_text = mods.mask_text(ctx.atoms(), used);
        let ignored_text = mods.mask_text(ctx.atoms(), ignored);
        ctx.warn(format_args!(
            "Virtual modifier {} defined multiple times; Using {}, ignoring {}",
            def.name, used_text, ignored_text
        ));
        new_mapping = used;
    }

    if let Some(m) = mods.get_mut(index) {
        m.mapping = new_mapping;
    }
    Ok(())
}
