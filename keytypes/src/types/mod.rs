mod builder;
mod entries;
mod registry;

pub use builder::{FieldError, KeyTypeBuilder, TypeFields};
pub use registry::KeyTypeRegistry;
