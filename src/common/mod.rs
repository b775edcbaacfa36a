//! Common types shared by the scanner, the workers and the archiver.
//!
//! [`FileList`] is the canonical, sorted list of input files. Its positions are
//! the indices the work distributor hands out and the order records appear in
//! the archive.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, TzipError};

/// File name suffix selected by the directory lister.
pub const TEXT_SUFFIX: &[u8] = b".txt";

/// Returns true if `name` ends with the literal bytes `.txt`.
///
/// Names shorter than the suffix simply do not match.
pub fn has_text_suffix(name: &OsStr) -> bool {
    name.as_encoded_bytes().ends_with(TEXT_SUFFIX)
}

/// Ordered, duplicate-free list of input file names relative to a source directory.
#[derive(Debug, Clone)]
pub struct FileList {
    root: PathBuf,
    names: Vec<OsString>,
}

impl FileList {
    /// Builds a list from arbitrary names, sorting them byte-wise and dropping duplicates.
    pub fn from_names<I, S>(root: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut names: Vec<OsString> = names.into_iter().map(Into::into).collect();
        names.sort_by(|a, b| a.as_encoded_bytes().cmp(b.as_encoded_bytes()));
        names.dedup();
        Self { root: root.into(), names }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name at `index`, if any.
    pub fn name(&self, index: usize) -> Option<&OsStr> {
        self.names.get(index).map(OsString::as_os_str)
    }

    /// Full path of the file at `index`, joined onto the source directory.
    pub fn path(&self, index: usize) -> Option<PathBuf> {
        self.name(index).map(|name| self.root.join(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &OsStr> {
        self.names.iter().map(OsString::as_os_str)
    }
}

/// Lists the direct children of `dir` whose name ends in `.txt`.
///
/// Directories are never selected, even when their name matches, and neither
/// are symlinks that resolve to one. A dangling symlink is kept so that the
/// read failure surfaces under the error policy. The result is sorted and
/// deduplicated, ready to be handed to the worker pool.
pub fn collect_text_files(dir: &Path) -> Result<FileList> {
    let unreadable = |source: std::io::Error| TzipError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    // Fail before walking so a missing directory or a plain file is reported as such.
    std::fs::read_dir(dir).map_err(unreadable)?;

    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| unreadable(e.into()))?;
        if entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir()) {
            continue;
        }
        if has_text_suffix(entry.file_name()) {
            names.push(entry.file_name().to_os_string());
        }
    }

    tracing::debug!(dir = %dir.display(), matched = names.len(), "scanned source directory");
    Ok(FileList::from_names(dir, names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_matches_only_exact_txt_ending() {
        assert!(has_text_suffix(OsStr::new("a.txt")));
        assert!(has_text_suffix(OsStr::new(".txt")));
        assert!(!has_text_suffix(OsStr::new("note.txtx")));
        assert!(!has_text_suffix(OsStr::new("a.TXT")));
        assert!(!has_text_suffix(OsStr::new("txt")));
    }

    #[test]
    fn short_names_do_not_match() {
        for name in ["", "a", "ab", "abc", "txt"] {
            assert!(!has_text_suffix(OsStr::new(name)), "{name:?}");
        }
    }

    #[test]
    fn file_list_sorts_bytewise_and_dedups() {
        let list = FileList::from_names("/src", ["b.txt", "a.txt", "B.txt", "a.txt"]);
        let names: Vec<_> = list.names().collect();
        assert_eq!(names, ["B.txt", "a.txt", "b.txt"]);
        assert_eq!(list.path(1), Some(PathBuf::from("/src/a.txt")));
        assert_eq!(list.path(3), None);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_selected() {
        let dir = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("plain.txt")).unwrap();
        std::os::unix::fs::symlink(target.path(), dir.path().join("linked.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("file-link.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling.txt")).unwrap();

        let list = collect_text_files(dir.path()).unwrap();
        let names: Vec<_> = list.names().collect();
        assert_eq!(names, ["a.txt", "dangling.txt", "file-link.txt"]);
    }
}
