pub mod types;
pub mod context;

pub use types::*;

// Re-export commonly used types
pub use types::atom::{Atom, AtomTable};
pub use types::modifiers::{Mod, ModKind, ModKinds, ModMask, ModSet, MAX_MODS};
pub use types::keymap::{KeyType, KeyTypeEntry, Keymap, LevelIndex, MergeMode, DEFAULT_TYPE_NAME, MAX_LEVEL};
pub use types::errors::{CompileError, ExprError, IncludeError, VModError};
pub use context::{Context, Diagnostic};
