use anyhow::Result;
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// File scanner for traversing a decompiled APK tree.
///
/// The `FileScanner` recursively walks through a directory (typically the output of `apktool d`
/// or `baksmali`) to find all `.smali` files. Hidden directories (those starting with `.`) are
/// skipped.
///
/// # Example
///
/// ```no_run
/// use smali_swagger::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./app-decompiled"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} smali files", result.smali_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths to all discovered `.smali` files, in walk order
    pub smali_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.smali` files.
    ///
    /// Entries are visited in file-name order so that repeated runs over the same tree discover
    /// files, and therefore endpoints, in the same sequence. Inaccessible entries are recorded as
    /// warnings and scanning continues.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` leaves room for a root-level access check.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut smali_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                !e.file_name().to_string_lossy().starts_with('.')
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("smali")
                    {
                        smali_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            smali_files,
            warnings,
        })
    }
}
