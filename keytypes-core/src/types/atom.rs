use indexmap::IndexSet;

/// Interned string handle. Two atoms compare equal exactly when their
/// texts are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// String interning table owned by the compilation context
#[derive(Debug, Default)]
pub struct AtomTable {
    strings: IndexSet<String>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(index) = self.strings.get_index_of(text) {
            return Atom(index as u32);
        }
        let (index, _) = self.strings.insert_full(text.to_string());
        Atom(index as u32)
    }

    pub fn lookup(&self, text: &str) -> Option<Atom> {
        self.strings.get_index_of(text).map(|index| Atom(index as u32))
    }

    /// Text of an atom. Atoms from another table yield an empty string.
    pub fn text(&self, atom: Atom) -> &str {
        self.strings
            .get_index(atom.index())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
