use std::fmt::{self, Write};

use keytypes_core::{Context, KeyType, Keymap, ModKind, ModSet};

/// Writes the installed key types of `keymap` as an `xkb_types` section
pub fn write_types<W: Write>(out: &mut W, ctx: &Context, keymap: &Keymap) -> fmt::Result {
    match &keymap.types_section_name {
        Some(name) => writeln!(out, "xkb_types \"{}\" {{", name)?,
        None => writeln!(out, "xkb_types {{")?,
    }

    let vmods: Vec<&str> = keymap
        .mods
        .iter()
        .filter(|(_, m)| m.kind == ModKind::Virtual)
        .map(|(_, m)| ctx.atom_text(m.name))
        .collect();
    if !vmods.is_empty() {
        writeln!(out, "    virtual_modifiers {};", vmods.join(","))?;
        writeln!(out)?;
    }

    for key_type in &keymap.types {
        write_type(out, ctx, &keymap.mods, key_type)?;
    }

    writeln!(out, "}};")
}

fn write_type<W: Write>(out: &mut W, ctx: &Context, mods: &ModSet, key_type: &KeyType) -> fmt::Result {
    let atoms = ctx.atoms();

    writeln!(out, "    type \"{}\" {{", ctx.atom_text(key_type.name))?;
    writeln!(out, "        modifiers= {};", mods.mask_text(atoms, key_type.mods))?;

    for entry in &key_type.entries {
        let mask = mods.mask_text(atoms, entry.mods);
        writeln!(out, "        map[{}]= {};", mask, entry.level + 1)?;
        if !entry.preserve.is_empty() {
            writeln!(out, "        preserve[{}]= {};", mask, mods.mask_text(atoms, entry.preserve))?;
        }
    }

    for (level, name) in key_type.level_names.iter().enumerate() {
        if let Some(name) = name {
            writeln!(out, "        level_name[{}]= \"{}\";", level + 1, ctx.atom_text(*name))?;
        }
    }

    writeln!(out, "    }};")
}

pub fn types_to_string(ctx: &Context, keymap: &Keymap) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_types(&mut out, ctx, keymap)?;
    Ok(out)
}
