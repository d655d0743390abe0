use std::collections::HashMap;

use keytypes_core::{Context, IncludeError};

use crate::ast::{FileKind, IncludeLink, XkbFile};

/// Deepest include nesting a loader accepts
pub const MAX_INCLUDE_DEPTH: usize = 15;

/// Opens the file named by one link of an include chain. Every
/// successful `load` is paired with a `release` once the file has been
/// compiled; releases come in reverse order of loads.
pub trait IncludeLoader {
    fn load(
        &mut self,
        ctx: &mut Context,
        link: &IncludeLink,
        expected: FileKind,
    ) -> Result<XkbFile, IncludeError>;

    fn release(&mut self, file: &XkbFile);
}

/// Resolves includes against files registered in memory
#[derive(Debug, Default)]
pub struct MemoryIncludeLoader {
    /// Maps by file name; the first map registered is the default
    files: HashMap<String, Vec<XkbFile>>,
    /// `file(map)` references currently being compiled
    active: Vec<String>,
}

impl MemoryIncludeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `map` under `file_name`. The map is selected by its own
    /// `name`.
    pub fn add(&mut self, file_name: &str, map: XkbFile) {
        self.files.entry(file_name.to_string()).or_default().push(map);
    }

    pub fn with_file(mut self, file_name: &str, map: XkbFile) -> Self {
        self.add(file_name, map);
        self
    }

    pub fn depth(&self) -> usize {
        self.active.len()
    }

    fn find(&self, link: &IncludeLink) -> Result<&XkbFile, IncludeError> {
        let maps = self
            .files
            .get(&link.file)
            .ok_or_else(|| IncludeError::NotFound(link.file.clone()))?;

        match &link.map {
            Some(map) => maps
                .iter()
                .find(|m| m.name.as_deref() == Some(map.as_str()))
                .ok_or_else(|| IncludeError::MapNotFound {
                    file: link.file.clone(),
                    map: map.clone(),
                }),
            None => maps
                .first()
                .ok_or_else(|| IncludeError::NotFound(link.file.clone())),
        }
    }
}

fn reference(file: &str, map: Option<&str>) -> String {
    match map {
        Some(map) => format!("{}({})", file, map),
        None => file.to_string(),
    }
}

impl IncludeLoader for MemoryIncludeLoader {
    fn load(
        &mut self,
        ctx: &mut Context,
        link: &IncludeLink,
        expected: FileKind,
    ) -> Result<XkbFile, IncludeError> {
        if self.active.len() >= MAX_INCLUDE_DEPTH {
            return Err(IncludeError::TooDeep(MAX_INCLUDE_DEPTH));
        }

        let file = self.find(link)?.clone();
        let key = reference(&link.file, file.name.as_deref());

        // Check for circular includes
        if self.active.contains(&key) {
            return Err(IncludeError::Recursive(key));
        }

        if file.kind != expected {
            return Err(IncludeError::WrongKind {
                file: key,
                expected: expected.as_str(),
                found: file.kind.as_str(),
            });
        }

        ctx.info(format_args!("Including {}", key));
        self.active.push(key);
        Ok(file)
    }

    fn release(&mut self, _file: &XkbFile) {
        // Includes nest depth-first, so the released file is the most
        // recently loaded one.
        self.active.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytypes_core::MergeMode;

    fn link(file: &str, map: Option<&str>) -> IncludeLink {
        IncludeLink {
            merge: MergeMode::Default,
            file: file.to_string(),
            map: map.map(str::to_string),
        }
    }

    #[test]
    fn test_default_and_named_maps() {
        let mut ctx = Context::new();
        let mut loader = MemoryIncludeLoader::new()
            .with_file("pc", XkbFile::types("basic"))
            .with_file("pc", XkbFile::types("extra"));

        let file = loader.load(&mut ctx, &link("pc", None), FileKind::Types).unwrap();
        assert_eq!(file.name.as_deref(), Some("basic"));
        loader.release(&file);

        let file = loader.load(&mut ctx, &link("pc", Some("extra")), FileKind::Types).unwrap();
        assert_eq!(file.name.as_deref(), Some("extra"));
        loader.release(&file);
        assert_eq!(loader.depth(), 0);
    }

    #[test]
    fn test_missing_file_and_map() {
        let mut ctx = Context::new();
        let mut loader = MemoryIncludeLoader::new().with_file("pc", XkbFile::types("basic"));

        assert_eq!(
            loader.load(&mut ctx, &link("nope", None), FileKind::Types),
            Err(IncludeError::NotFound("nope".to_string()))
        );
        assert_eq!(
            loader.load(&mut ctx, &link("pc", Some("extra")), FileKind::Types),
            Err(IncludeError::MapNotFound {
                file: "pc".to_string(),
                map: "extra".to_string(),
            })
        );
    }

    #[test]
    fn test_wrong_kind() {
        let mut ctx = Context::new();
        let mut loader = MemoryIncludeLoader::new()
            .with_file("us", XkbFile::new(FileKind::Symbols, Some("basic")));

        let err = loader.load(&mut ctx, &link("us", None), FileKind::Types).unwrap_err();
        assert!(matches!(err, IncludeError::WrongKind { expected: "xkb_types", found: "xkb_symbols", .. }));
        assert_eq!(loader.depth(), 0);
    }

    #[test]
    fn test_recursive_include_detected() {
        let mut ctx = Context::new();
        let mut loader = MemoryIncludeLoader::new().with_file("pc", XkbFile::types("basic"));

        let _outer = loader.load(&mut ctx, &link("pc", None), FileKind::Types).unwrap();
        let err = loader.load(&mut ctx, &link("pc", Some("basic")), FileKind::Types).unwrap_err();
        assert_eq!(err, IncludeError::Recursive("pc(basic)".to_string()));
    }
}
