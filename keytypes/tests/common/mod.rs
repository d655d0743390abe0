use keytypes::ast::XkbFile;
use keytypes::*;
use log::LevelFilter;

/// Routes `log` output through the test harness
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A context that surfaces warnings up to `verbosity`
pub fn context(verbosity: i32) -> Context {
    init_logger();
    Context::new().with_log_level(LevelFilter::Warn).with_verbosity(verbosity)
}

/// Compiles `file` into a fresh keymap with default merge mode
pub fn compile(
    ctx: &mut Context,
    loader: &mut MemoryIncludeLoader,
    file: &XkbFile,
) -> (Keymap, Result<(), CompileError>) {
    let mut keymap = Keymap::new(ctx.atoms_mut());
    let result = compile_key_types(ctx, loader, file, &mut keymap, MergeMode::Default);
    (keymap, result)
}

/// Compiles a file that needs no includes and expects success
pub fn compile_ok(ctx: &mut Context, file: &XkbFile) -> Keymap {
    let mut loader = MemoryIncludeLoader::new();
    let (keymap, result) = compile(ctx, &mut loader, file);
    assert_eq!(result, Ok(()), "unexpected failure: {:?}", ctx.diagnostics());
    keymap
}

pub fn find_type<'a>(ctx: &mut Context, keymap: &'a Keymap, name: &str) -> &'a KeyType {
    let atom = ctx.intern(name);
    keymap
        .find_type(atom)
        .unwrap_or_else(|| panic!("type {} not installed", name))
}

pub fn mask(ctx: &Context, keymap: &Keymap, names: &[&str]) -> ModMask {
    names.iter().fold(ModMask::empty(), |acc, name| {
        let index = keymap
            .mods
            .find_by_name(ctx.atoms(), name, ModKinds::BOTH)
            .unwrap_or_else(|| panic!("modifier {} not declared", name));
        acc | ModMask::from_index(index)
    })
}

#[allow(dead_code)]
pub fn messages(ctx: &Context) -> Vec<&str> {
    ctx.diagnostics().iter().map(|d| d.message.as_str()).collect()
}

#[allow(dead_code)]
pub fn has_message(ctx: &Context, needle: &str) -> bool {
    ctx.diagnostics().iter().any(|d| d.message.contains(needle))
}
