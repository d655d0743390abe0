// Statement tree for one parsed description file. Parsing itself happens
// elsewhere; this is the shape the key type stage consumes.

use keytypes_core::MergeMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Keycodes,
    Types,
    Compat,
    Symbols,
    Geometry,
    Keymap,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Keycodes => "xkb_keycodes",
            FileKind::Types => "xkb_types",
            FileKind::Compat => "xkb_compatibility",
            FileKind::Symbols => "xkb_symbols",
            FileKind::Geometry => "xkb_geometry",
            FileKind::Keymap => "xkb_keymap",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XkbFile {
    pub kind: FileKind,
    pub name: Option<String>,
    pub defs: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Include(IncludeStmt),
    KeyType(KeyTypeDef),
    Var(VarDef),
    VMod(VModDef),
    Other(StmtType),
}

/// Statement kinds the key type stage does not accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtType {
    Keycode,
    Alias,
    Interp,
    Group,
    Key,
    ModMap,
    GroupCompat,
    LedMap,
    LedName,
}

impl StmtType {
    pub fn as_str(self) -> &'static str {
        match self {
            StmtType::Keycode => "key name definition",
            StmtType::Alias => "key alias definition",
            StmtType::Interp => "symbol interpretation definition",
            StmtType::Group => "group name definition",
            StmtType::Key => "key symbols definition",
            StmtType::ModMap => "modifier map declaration",
            StmtType::GroupCompat => "group declaration",
            StmtType::LedMap => "indicator map declaration",
            StmtType::LedName => "indicator name declaration",
        }
    }
}

/// One `include` statement. `links` is the fallback chain; the first
/// link carries the statement's own merge mode.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeStmt {
    pub merge: MergeMode,
    pub stmt: String,
    pub links: Vec<IncludeLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeLink {
    pub merge: MergeMode,
    pub file: String,
    pub map: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyTypeDef {
    pub merge: MergeMode,
    pub name: String,
    pub body: Vec<VarDef>,
}

/// `element.field[index] = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub merge: MergeMode,
    pub lhs: FieldRef,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub element: Option<String>,
    pub field: String,
    pub index: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VModDef {
    pub merge: MergeMode,
    pub name: String,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Integer(i64),
    String(String),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Invert,
    Not,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Negate => "negation",
            UnaryOp::Invert => "bitwise inversion",
            UnaryOp::Not => "logical not",
            UnaryOp::Plus => "unary plus",
        }
    }
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "addition",
            BinaryOp::Subtract => "subtraction",
            BinaryOp::Multiply => "multiplication",
            BinaryOp::Divide => "division",
        }
    }
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    pub fn int(value: i64) -> Self {
        Expr::Integer(value)
    }

    pub fn string(value: &str) -> Self {
        Expr::String(value.to_string())
    }

    /// `a+b+c` over identifiers, the usual way masks are written
    pub fn mods(names: &[&str]) -> Self {
        let mut iter = names.iter();
        let first = match iter.next() {
            Some(name) => Expr::ident(name),
            None => return Expr::ident("none"),
        };
        iter.fold(first, |acc, name| Expr::add(acc, Expr::ident(name)))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn subtract(lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op: BinaryOp::Subtract,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Ident(_) => "identifier",
            Expr::Integer(_) => "integer",
            Expr::String(_) => "string",
            Expr::Unary { .. } => "unary expression",
            Expr::Binary { .. } => "binary expression",
        }
    }
}

impl VarDef {
    pub fn new(field: &str, index: Option<Expr>, value: Expr) -> Self {
        Self {
            merge: MergeMode::Default,
            lhs: FieldRef {
                element: None,
                field: field.to_string(),
                index,
            },
            value,
        }
    }
}

impl KeyTypeDef {
    pub fn new(name: &str) -> Self {
        Self {
            merge: MergeMode::Default,
            name: name.to_string(),
            body: Vec::new(),
        }
    }

    pub fn with_merge(mut self, merge: MergeMode) -> Self {
        self.merge = merge;
        self
    }

    pub fn field(mut self, field: &str, index: Option<Expr>, value: Expr) -> Self {
        self.body.push(VarDef::new(field, index, value));
        self
    }

    pub fn modifiers(self, mods: &[&str]) -> Self {
        self.field("modifiers", None, Expr::mods(mods))
    }

    pub fn map(self, mods: &[&str], level: i64) -> Self {
        self.field("map", Some(Expr::mods(mods)), Expr::ident(&format!("Level{}", level)))
    }

    pub fn preserve(self, mods: &[&str], preserve: &[&str]) -> Self {
        self.field("preserve", Some(Expr::mods(mods)), Expr::mods(preserve))
    }

    pub fn level_name(self, level: i64, name: &str) -> Self {
        self.field("level_name", Some(Expr::int(level)), Expr::string(name))
    }
}

impl IncludeStmt {
    /// Single-link include of `file` or `file(map)`
    pub fn new(merge: MergeMode, file: &str, map: Option<&str>) -> Self {
        let stmt = match map {
            Some(map) => format!("{}({})", file, map),
            None => file.to_string(),
        };
        Self {
            merge,
            stmt,
            links: vec![IncludeLink {
                merge,
                file: file.to_string(),
                map: map.map(str::to_string),
            }],
        }
    }

    /// Appends another link to the chain, joined with `merge`
    pub fn then(mut self, merge: MergeMode, file: &str, map: Option<&str>) -> Self {
        let separator = if merge == MergeMode::Augment { '|' } else { '+' };
        self.stmt.push(separator);
        self.stmt.push_str(file);
        if let Some(map) = map {
            self.stmt.push_str(&format!("({})", map));
        }
        self.links.push(IncludeLink {
            merge,
            file: file.to_string(),
            map: map.map(str::to_string),
        });
        self
    }
}

impl XkbFile {
    pub fn new(kind: FileKind, name: Option<&str>) -> Self {
        Self {
            kind,
            name: name.map(str::to_string),
            defs: Vec::new(),
        }
    }

    pub fn types(name: &str) -> Self {
        Self::new(FileKind::Types, Some(name))
    }

    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.defs.push(stmt);
        self
    }

    pub fn key_type(self, def: KeyTypeDef) -> Self {
        self.stmt(Stmt::KeyType(def))
    }

    pub fn include(self, include: IncludeStmt) -> Self {
        self.stmt(Stmt::Include(include))
    }

    pub fn virtual_mods(self, names: &[&str]) -> Self {
        names.iter().fold(self, |file, name| {
            file.stmt(Stmt::VMod(VModDef {
                merge: MergeMode::Default,
                name: name.to_string(),
                value: None,
            }))
        })
    }
}
