//! Managed tree locations.
//! A `Tree` ties the managed root directory to its public base URL; every
//! `ManagedPath` is a normalized location inside it.

mod names;
mod path;

pub use names::{file_extension, file_stem, NameRules};
pub use path::{CreateError, ManagedPath};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::RelocateError;

/// Normalize a caller-supplied relative path.
///
/// Backslashes become `/`; empty, `.` and `..` segments are dropped. With
/// `sanitize`, characters forbidden in file names are stripped from each
/// segment (and surrounding whitespace trimmed) before it is kept.
pub fn clean_path(raw: &str, sanitize: bool) -> String {
    let unified = raw.replace('\\', "/");
    let rules = NameRules::native();
    unified
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .filter_map(|part| {
            if sanitize {
                let cleaned = rules.sanitize(part);
                if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
                    None
                } else {
                    Some(cleaned)
                }
            } else {
                Some(part.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug)]
struct TreeInner {
    root: PathBuf,
    base_url: String,
}

/// Handle to the managed root. Cheap to clone; paths keep one.
#[derive(Debug, Clone)]
pub struct Tree {
    inner: Arc<TreeInner>,
}

impl Tree {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(TreeInner {
                root: root.into(),
                base_url,
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Build a path from a relative string. The input is normalized first.
    pub fn path(&self, relative: &str) -> ManagedPath {
        ManagedPath::new(self.clone(), clean_path(relative, false))
    }

    /// The root of the tree itself.
    pub fn root_path(&self) -> ManagedPath {
        ManagedPath::new(self.clone(), String::new())
    }

    /// Accept user input that is either relative to the root or an absolute
    /// filesystem path located under it.
    pub fn locate(&self, raw: &str) -> Result<ManagedPath, RelocateError> {
        self.locate_with(raw, false)
    }

    /// `locate`, with forbidden characters stripped from every segment.
    /// Used for names the caller is choosing, not for existing items.
    pub fn locate_sanitized(&self, raw: &str) -> Result<ManagedPath, RelocateError> {
        self.locate_with(raw, true)
    }

    fn locate_with(&self, raw: &str, sanitize: bool) -> Result<ManagedPath, RelocateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RelocateError::Input("empty path".into()));
        }
        let as_path = Path::new(trimmed);
        let relative = if as_path.is_absolute() {
            let rel = as_path.strip_prefix(self.root()).map_err(|_| {
                RelocateError::Input(format!(
                    "{} is outside the managed root {}",
                    trimmed,
                    self.root().display()
                ))
            })?;
            rel.to_string_lossy().into_owned()
        } else {
            trimmed.to_string()
        };
        Ok(ManagedPath::new(self.clone(), clean_path(&relative, sanitize)))
    }

    fn same_root(&self, other: &Tree) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.root == other.inner.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_drops_traversal_and_empty_segments() {
        assert_eq!(clean_path("/2019//02/./../image.jpg/", false), "2019/02/image.jpg");
        assert_eq!(clean_path("..\\..\\etc\\passwd", false), "etc/passwd");
        assert_eq!(clean_path("", false), "");
        assert_eq!(clean_path("///", false), "");
    }

    #[cfg(unix)]
    #[test]
    fn clean_path_sanitize_strips_control_characters() {
        assert_eq!(clean_path("photos/new\u{7}dir", true), "photos/newdir");
        assert_eq!(clean_path("photos/\u{1}", true), "photos");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let tree = Tree::new("/srv/media", "https://example.test/uploads/");
        assert_eq!(tree.base_url(), "https://example.test/uploads");
        assert_eq!(tree.path("2019/a.jpg").url(), "https://example.test/uploads/2019/a.jpg");
        assert_eq!(tree.root_path().url(), "https://example.test/uploads");
    }

    #[test]
    fn locate_accepts_absolute_paths_under_root() {
        let tree = Tree::new("/srv/media", "https://example.test/uploads");
        let p = tree.locate("/srv/media/2019/a.jpg").unwrap();
        assert_eq!(p.relative(), "2019/a.jpg");
        let err = tree.locate("/etc/passwd").unwrap_err();
        assert!(matches!(err, RelocateError::Input(_)));
        assert!(matches!(tree.locate("  ").unwrap_err(), RelocateError::Input(_)));
    }

    #[test]
    fn locate_sanitized_strips_forbidden_characters() {
        let tree = Tree::new("/srv/media", "https://example.test/uploads");
        assert_eq!(tree.locate_sanitized("albums/new\u{7}dir").unwrap().relative(), "albums/newdir");
        assert_eq!(tree.locate("albums/new\u{7}dir").unwrap().relative(), "albums/new\u{7}dir");
        assert_eq!(tree.locate_sanitized("/srv/media/a/ b\u{1} ").unwrap().relative(), "a/b");
        assert!(tree.locate_sanitized("\u{7}").unwrap().is_root());
    }
}
