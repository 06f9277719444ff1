//! Class index: maps a class descriptor to the file that declares it.
//!
//! The index is built once per run from every discovered file and is only read afterwards, when
//! the [`TypeResolver`](crate::type_resolver::TypeResolver) needs the fields of an object type.
//! It does not have to be exhaustive: framework and library classes are usually absent from a
//! decompiled tree and a failed lookup is an expected outcome.

use crate::parser::SmaliFile;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `.class public final Lcom/example/Item;` with any number of modifiers.
static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\.class(?:\s+[\w-]+)*\s+(L[^\s;]+;?)").expect("Invalid regex")
});

/// Locates the class header in smali text and returns its descriptor, terminator included.
pub fn find_class_descriptor(content: &str) -> Option<String> {
    let caps = CLASS_HEADER.captures(content)?;
    let mut descriptor = caps[1].to_string();
    if !descriptor.ends_with(';') {
        descriptor.push(';');
    }
    Some(descriptor)
}

/// Descriptor → source file mapping.
#[derive(Debug, Default, Clone)]
pub struct ClassIndex {
    classes: HashMap<String, PathBuf>,
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from loaded files, in order.
    #[cfg(test)]
    pub(crate) fn build(files: &[SmaliFile]) -> Self {
        let mut index = Self::new();
        for file in files {
            index.add_file(file);
        }
        debug!("Class index holds {} classes", index.len());
        index
    }

    /// Registers the class a loaded file declares. Only the path is kept, not the text.
    ///
    /// Files without a class header are skipped. When two files declare the same descriptor the
    /// later one wins.
    pub fn add_file(&mut self, file: &SmaliFile) {
        if let Some(descriptor) = &file.class_descriptor {
            self.insert(descriptor.clone(), file.path.clone());
        }
    }

    pub fn insert(&mut self, descriptor: String, path: PathBuf) {
        if let Some(previous) = self.classes.insert(descriptor.clone(), path) {
            debug!(
                "Class {} re-registered, replacing {}",
                descriptor,
                previous.display()
            );
        }
    }

    pub fn lookup(&self, descriptor: &str) -> Option<&Path> {
        self.classes.get(descriptor).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> SmaliFile {
        SmaliFile::from_source(PathBuf::from(path), content.to_string())
    }

    #[test]
    fn test_find_class_descriptor_with_modifiers() {
        let content = ".class public final synthetic Lcom/example/Item;\n.super Ljava/lang/Object;";
        assert_eq!(
            find_class_descriptor(content).as_deref(),
            Some("Lcom/example/Item;")
        );
    }

    #[test]
    fn test_find_class_descriptor_plain() {
        assert_eq!(
            find_class_descriptor(".class LItem;").as_deref(),
            Some("LItem;")
        );
    }

    #[test]
    fn test_find_nested_class_descriptor() {
        let content = ".class public final Lcom/example/Item$Tag;\n";
        assert_eq!(
            find_class_descriptor(content).as_deref(),
            Some("Lcom/example/Item$Tag;")
        );
    }

    #[test]
    fn test_find_class_descriptor_missing() {
        assert!(find_class_descriptor(".super Ljava/lang/Object;").is_none());
        assert!(find_class_descriptor("").is_none());
    }

    #[test]
    fn test_build_skips_headerless_files() {
        let files = vec![
            file("a/Item.smali", ".class public Lcom/example/Item;"),
            file("a/Junk.smali", "not smali at all"),
        ];

        let index = ClassIndex::build(&files);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup("Lcom/example/Item;"),
            Some(Path::new("a/Item.smali"))
        );
        assert!(index.lookup("Lcom/example/Junk;").is_none());
    }

    #[test]
    fn test_build_later_file_wins() {
        let files = vec![
            file("smali/Item.smali", ".class public Lcom/example/Item;"),
            file("smali_classes2/Item.smali", ".class public Lcom/example/Item;"),
        ];

        let index = ClassIndex::build(&files);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup("Lcom/example/Item;"),
            Some(Path::new("smali_classes2/Item.smali"))
        );
    }

    #[test]
    fn test_empty_index() {
        let index = ClassIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.lookup("Ljava/lang/String;").is_none());
    }
}
