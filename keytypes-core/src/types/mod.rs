pub mod atom;
pub mod modifiers;
pub mod keymap;
pub mod errors;

pub use atom::*;
pub use modifiers::*;
pub use keymap::*;
pub use errors::*;
