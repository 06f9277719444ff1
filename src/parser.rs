use crate::class_index::find_class_descriptor;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Loader for smali source files.
///
/// Smali is line oriented, so no syntax tree is built here: a file is kept as text together with
/// the class it declares. The extractors and the field reader work directly on that text.
///
/// # Example
///
/// ```no_run
/// use smali_swagger::parser::SmaliParser;
/// use std::path::Path;
///
/// let parsed = SmaliParser::parse_file(Path::new("smali/com/example/ItemsApi.smali")).unwrap();
/// println!("{:?}", parsed.class_descriptor);
/// ```
pub struct SmaliParser;

/// A loaded smali file.
#[derive(Debug, Clone)]
pub struct SmaliFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Full text of the file
    pub content: String,
    /// Descriptor from the `.class` header (e.g. `Lcom/example/Item;`), if one was found
    pub class_descriptor: Option<String>,
}

impl SmaliFile {
    /// Builds a `SmaliFile` from text that is already in memory.
    pub fn from_source(path: PathBuf, content: String) -> Self {
        let class_descriptor = find_class_descriptor(&content);
        Self {
            path,
            content,
            class_descriptor,
        }
    }
}

impl SmaliParser {
    /// Reads a single smali file and locates its class header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    pub fn parse_file(path: &Path) -> Result<SmaliFile> {
        debug!("Reading file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let parsed = SmaliFile::from_source(path.to_path_buf(), content);
        match &parsed.class_descriptor {
            Some(class) => debug!("Found class: {} => file: {}", class, path.display()),
            None => debug!("No class header in {}", path.display()),
        }

        Ok(parsed)
    }

    /// Reads smali files one at a time and hands each to `visit`, continuing even if some fail.
    ///
    /// Only the file being visited is held in memory. Unreadable files are logged as warnings
    /// and skipped. Returns the number of files visited.
    pub fn parse_each<F>(paths: &[PathBuf], mut visit: F) -> usize
    where
        F: FnMut(SmaliFile),
    {
        debug!("Reading {} files", paths.len());

        let mut loaded = 0;
        for path in paths {
            match Self::parse_file(path) {
                Ok(parsed) => {
                    visit(parsed);
                    loaded += 1;
                }
                Err(e) => warn!("Could not read {}: {:#}", path.display(), e),
            }
        }

        debug!(
            "Reading complete: {} succeeded, {} failed",
            loaded,
            paths.len() - loaded
        );
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_file_with_class_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Item.smali");
        fs::write(
            &path,
            ".class public final Lcom/example/model/Item;\n.super Ljava/lang/Object;\n",
        )
        .unwrap();

        let parsed = SmaliParser::parse_file(&path).unwrap();

        assert_eq!(parsed.path, path);
        assert_eq!(
            parsed.class_descriptor.as_deref(),
            Some("Lcom/example/model/Item;")
        );
        assert!(parsed.content.contains(".super"));
    }

    #[test]
    fn test_parse_file_without_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Broken.smali");
        fs::write(&path, "# nothing useful here\n").unwrap();

        let parsed = SmaliParser::parse_file(&path).unwrap();
        assert!(parsed.class_descriptor.is_none());
    }

    #[test]
    fn test_parse_missing_file() {
        let result = SmaliParser::parse_file(Path::new("/definitely/not/here.smali"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_each_continues_after_failure() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("Good.smali");
        fs::write(&good, ".class public LGood;\n").unwrap();
        let missing = temp_dir.path().join("Missing.smali");
        let other = temp_dir.path().join("Other.smali");
        fs::write(&other, ".class public LOther;\n").unwrap();

        let mut seen = Vec::new();
        let loaded = SmaliParser::parse_each(&[missing, good, other], |file| {
            seen.push(file.class_descriptor)
        });

        assert_eq!(loaded, 2);
        assert_eq!(
            seen,
            vec![Some("LGood;".to_string()), Some("LOther;".to_string())]
        );
    }
}
