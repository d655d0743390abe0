use thiserror::Error;

/// Failure to resolve an expression to the kind a field requires
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("Cannot resolve modifier name \"{0}\"")]
    UnknownModifier(String),

    #[error("Modifier \"{0}\" is not allowed here")]
    ModifierKindNotAllowed(String),

    #[error("Level index {0} is out of range (1..{max})", max = crate::MAX_LEVEL)]
    LevelOutOfRange(i64),

    #[error("Unknown level name \"{0}\"")]
    UnknownLevel(String),

    #[error("Found {found} where {wanted} was expected")]
    WrongType { wanted: &'static str, found: &'static str },

    #[error("The {0} operator cannot be applied to {1}")]
    IllegalOperator(&'static str, &'static str),

    #[error("Cannot divide by zero: {0} / 0")]
    DivideByZero(i64),

    #[error("Integer overflow in {0}")]
    IntegerOverflow(&'static str),
}

/// Failure to load a file named by an include statement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncludeError {
    #[error("Can't find file \"{0}\" for types include")]
    NotFound(String),

    #[error("No map named \"{map}\" in \"{file}\"")]
    MapNotFound { file: String, map: String },

    #[error("Include file \"{file}\" wrong type (expected {expected}, got {found}); Include file ignored")]
    WrongKind {
        file: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Recursive include of \"{0}\" detected")]
    Recursive(String),

    #[error("Exceeded include depth threshold ({0})")]
    TooDeep(usize),
}

/// Failure of a `virtual_modifiers` declaration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VModError {
    #[error("Declaration of {name} ignored: {source}")]
    BadMapping { name: String, source: ExprError },

    #[error("Can't add a virtual modifier named \"{0}\"; there is already a non-virtual modifier with this name! Ignored")]
    NotVirtual(String),

    #[error("Too many modifiers defined (maximum {max})")]
    TooMany { max: usize },
}

/// Outcome of compiling a key types section into a keymap
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Failed to compile key types{}: {errors} error(s)", section_suffix(.section))]
    Failed {
        section: Option<String>,
        errors: usize,
    },
}

fn section_suffix(section: &Option<String>) -> String {
    match section {
        Some(name) => format!(" \"{}\"", name),
        None => String::new(),
    }
}
