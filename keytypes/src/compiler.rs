use keytypes_core::{CompileError, Context, Keymap, MergeMode, ModSet};

use crate::ast::{FileKind, IncludeStmt, KeyTypeDef, Stmt, XkbFile};
use crate::include_processor::IncludeLoader;
use crate::types::{KeyTypeBuilder, KeyTypeRegistry};
use crate::vmod::handle_vmod_def;

/// A file with more errors than this is abandoned
pub const MAX_ERRORS: usize = 10;

/// Errors charged to the includer when an include cannot be loaded
pub const INCLUDE_FAILURE_PENALTY: usize = 10;

pub fn exceeds_error_limit(error_count: usize) -> bool {
    error_count > MAX_ERRORS
}

/// Compiles key type sections, resolving includes through `loader`
pub struct Compiler<'a> {
    ctx: &'a mut Context,
    loader: &'a mut dyn IncludeLoader,
}

impl<'a> Compiler<'a> {
    pub fn new(ctx: &'a mut Context, loader: &'a mut dyn IncludeLoader) -> Self {
        Self { ctx, loader }
    }

    /// Compiles `file` and installs its types into `keymap`. On failure
    /// the keymap is left as it was.
    pub fn compile(
        &mut self,
        file: &XkbFile,
        keymap: &mut Keymap,
        merge: MergeMode,
    ) -> Result<(), CompileError> {
        let registry = self.compile_file(file, keymap.mods.clone(), merge);

        if registry.error_count != 0 {
            return Err(CompileError::Failed {
                section: registry.name,
                errors: registry.error_count,
            });
        }

        registry.install(self.ctx, keymap);
        Ok(())
    }

    /// Compiles one file into a fresh registry seeded with `mods`
    pub fn compile_file(&mut self, file: &XkbFile, mods: ModSet, merge: MergeMode) -> KeyTypeRegistry {
        let mut registry = KeyTypeRegistry::new(mods);
        self.handle_file(&mut registry, file, merge);
        registry
    }

    fn handle_file(&mut self, info: &mut KeyTypeRegistry, file: &XkbFile, merge: MergeMode) {
        info.name = file.name.clone();

        for stmt in &file.defs {
            let ok = match stmt {
                Stmt::Include(include) => self.handle_include(info, include),
                Stmt::KeyType(def) => self.handle_key_type_def(info, def, merge),
                Stmt::Var(_) => {
                    self.ctx.error(format_args!(
                        "Support for changing the default type has been removed; Statement ignored"
                    ));
                    false
                }
                Stmt::VMod(def) => match handle_vmod_def(self.ctx, &mut info.mods, def, merge) {
                    Ok(()) => true,
                    Err(err) => {
                        self.ctx.error(format_args!("{}", err));
                        false
                    }
                },
                Stmt::Other(kind) => {
                    self.ctx.error(format_args!(
                        "Key type files may not include other declarations; Ignoring {}",
                        kind.as_str()
                    ));
                    false
                }
            };

            if !ok {
                info.error_count += 1;
            }

            if exceeds_error_limit(info.error_count) {
                self.ctx.error(format_args!(
                    "Abandoning keytypes file \"{}\"",
                    file.name.as_deref().unwrap_or("")
                ));
                break;
            }
        }
    }

    fn handle_include(&mut self, info: &mut KeyTypeRegistry, include: &IncludeStmt) -> bool {
        let mut included = KeyTypeRegistry::new(info.mods.clone());
        included.name = Some(include.stmt.clone());

        for link in &include.links {
            let file = match self.loader.load(self.ctx, link, FileKind::Types) {
                Ok(file) => file,
                Err(err) => {
                    self.ctx.error(format_args!("{}", err));
                    info.error_count += INCLUDE_FAILURE_PENALTY;
                    return false;
                }
            };

            let mut next = KeyTypeRegistry::new(included.mods.clone());
            self.handle_file(&mut next, &file, link.merge);
            self.loader.release(&file);

            included.merge_included(self.ctx, next, link.merge);
        }

        let failed = included.error_count;
        info.merge_included(self.ctx, included, include.merge);
        failed == 0
    }

    fn handle_key_type_def(&mut self, info: &mut KeyTypeRegistry, def: &KeyTypeDef, merge: MergeMode) -> bool {
        let merge = if def.merge == MergeMode::Default { merge } else { def.merge };
        let name = self.ctx.intern(&def.name);

        let mut key_type = KeyTypeBuilder::new(name, merge);
        if key_type.apply_body(self.ctx, &info.mods, &def.body) > 0 {
            return false;
        }

        info.add_key_type(self.ctx, key_type, true);
        true
    }
}

/// Compiles the key types section `file` into `keymap`
pub fn compile_key_types(
    ctx: &mut Context,
    loader: &mut dyn IncludeLoader,
    file: &XkbFile,
    keymap: &mut Keymap,
    merge: MergeMode,
) -> Result<(), CompileError> {
    Compiler::new(ctx, loader).compile(file, keymap, merge)
}
