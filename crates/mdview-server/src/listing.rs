//! Filesystem lookups for the page handler.
//!
//! Resolves URL paths under the served root, finds directory READMEs, and
//! builds directory listings.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// README base names, in lookup order.
const README_NAMES: [&str; 3] = ["README", "Readme", "readme"];

/// Markdown extensions, in lookup order.
const MARKDOWN_EXTENSIONS: [&str; 2] = ["markdown", "md"];

/// Characters escaped in listing hrefs (one path segment).
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListingEntry {
    /// Display name.
    pub(crate) name: String,
    /// Root-relative URL.
    pub(crate) href: String,
    /// Whether the entry is a directory.
    pub(crate) is_dir: bool,
}

/// What a request path resolved to.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Target {
    /// A directory, with its README (if any) and listing.
    Directory {
        readme: Option<PathBuf>,
        entries: Vec<ListingEntry>,
    },
    /// A Markdown file.
    Markdown(PathBuf),
    /// Any other file, served raw.
    File(PathBuf),
}

/// Resolve `url_path` under `root` and gather what the page handler needs.
///
/// Touches the filesystem throughout, so callers on the runtime should run
/// it on a blocking thread. Returns `Ok(None)` when the path does not resolve.
pub(crate) fn lookup(root: &Path, url_path: &str) -> std::io::Result<Option<Target>> {
    let Some(resolved) = resolve_path(root, url_path) else {
        return Ok(None);
    };

    let target = if resolved.is_dir() {
        Target::Directory {
            readme: find_readme(&resolved),
            entries: list_dir(root, &resolved)?,
        }
    } else if is_markdown(&resolved) {
        Target::Markdown(resolved)
    } else {
        Target::File(resolved)
    };
    Ok(Some(target))
}

/// Whether `path` names a Markdown file (by extension).
pub(crate) fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| ext.eq_ignore_ascii_case(md))
        })
}

/// Map a request path to a file under `root`.
///
/// `root` must be canonical. Returns `None` when the path is not valid UTF-8
/// after decoding, does not exist, or resolves outside `root`.
pub(crate) fn resolve_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;

    let mut candidate = root.to_path_buf();
    for segment in decoded.split(['/', '\\']) {
        if !segment.is_empty() && segment != "." {
            candidate.push(segment);
        }
    }

    let resolved = candidate.canonicalize().ok()?;
    if resolved.starts_with(root) {
        Some(resolved)
    } else {
        tracing::warn!(path = url_path, "Rejected path outside served root");
        None
    }
}

/// First existing README in `dir`.
pub(crate) fn find_readme(dir: &Path) -> Option<PathBuf> {
    README_NAMES
        .iter()
        .flat_map(|name| {
            MARKDOWN_EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("{name}.{ext}")))
        })
        .find(|candidate| candidate.is_file())
}

/// List sub-directories and Markdown files of `dir`.
///
/// Directories come first, then files, each sorted by name. A `..` entry
/// leads the listing unless `dir` is `root`.
pub(crate) fn list_dir(root: &Path, dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            dirs.push(name);
        } else if path.is_file() && is_markdown(&path) {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();

    let base = url_path(root, dir);
    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);

    if dir != root {
        let parent = dir.parent().map_or_else(|| "/".to_owned(), |p| url_path(root, p));
        entries.push(ListingEntry {
            name: "..".to_owned(),
            href: parent,
            is_dir: true,
        });
    }

    let child = |name: String, is_dir: bool| {
        let encoded = utf8_percent_encode(&name, SEGMENT);
        let href = if base == "/" {
            format!("/{encoded}")
        } else {
            format!("{base}/{encoded}")
        };
        ListingEntry { name, href, is_dir }
    };
    entries.extend(dirs.into_iter().map(|name| child(name, true)));
    entries.extend(files.into_iter().map(|name| child(name, false)));

    Ok(entries)
}

/// Root-relative URL of `path` (`/` for the root itself).
fn url_path(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return "/".to_owned();
    };

    let mut url = String::new();
    for component in relative.components() {
        url.push('/');
        url.extend(utf8_percent_encode(&component.as_os_str().to_string_lossy(), SEGMENT));
    }
    if url.is_empty() {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, root)
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("README.md")));
        assert!(is_markdown(Path::new("notes.markdown")));
        assert!(is_markdown(Path::new("UPPER.MD")));
        assert!(!is_markdown(Path::new("mdbook.toml")));
        assert!(!is_markdown(Path::new("Makefile")));
    }

    #[test]
    fn test_resolve_path_inside_root() {
        let (_dir, root) = canonical_tempdir();
        std::fs::create_dir(root.join("guide")).unwrap();
        std::fs::write(root.join("guide/intro.md"), "# Intro").unwrap();

        assert_eq!(resolve_path(&root, "/"), Some(root.clone()));
        assert_eq!(
            resolve_path(&root, "/guide/intro.md"),
            Some(root.join("guide/intro.md"))
        );
        assert_eq!(
            resolve_path(&root, "/guide/../guide/./intro.md"),
            Some(root.join("guide/intro.md"))
        );
    }

    #[test]
    fn test_resolve_path_percent_decoded() {
        let (_dir, root) = canonical_tempdir();
        std::fs::write(root.join("my notes.md"), "text").unwrap();

        assert_eq!(
            resolve_path(&root, "/my%20notes.md"),
            Some(root.join("my notes.md"))
        );
    }

    #[test]
    fn test_resolve_path_rejects_traversal() {
        let (_dir, root) = canonical_tempdir();
        let served = root.join("served");
        std::fs::create_dir(&served).unwrap();
        std::fs::write(root.join("secret.md"), "secret").unwrap();

        assert_eq!(resolve_path(&served, "/../secret.md"), None);
        assert_eq!(resolve_path(&served, "/%2e%2e/secret.md"), None);
        assert_eq!(resolve_path(&served, "/..%2fsecret.md"), None);
    }

    #[test]
    fn test_resolve_path_missing() {
        let (_dir, root) = canonical_tempdir();

        assert_eq!(resolve_path(&root, "/nope.md"), None);
    }

    #[test]
    fn test_find_readme_order() {
        let (_dir, root) = canonical_tempdir();
        std::fs::write(root.join("readme.md"), "lower").unwrap();
        std::fs::write(root.join("README.md"), "upper md").unwrap();
        std::fs::write(root.join("README.markdown"), "upper markdown").unwrap();

        let found = find_readme(&root).unwrap();

        assert_eq!(std::fs::read_to_string(found).unwrap(), "upper markdown");
    }

    #[test]
    fn test_find_readme_lowercase() {
        let (_dir, root) = canonical_tempdir();
        std::fs::write(root.join("readme.md"), "lower").unwrap();

        let found = find_readme(&root).unwrap();

        assert_eq!(std::fs::read_to_string(found).unwrap(), "lower");
    }

    #[test]
    fn test_find_readme_none() {
        let (_dir, root) = canonical_tempdir();
        std::fs::write(root.join("notes.md"), "notes").unwrap();

        assert_eq!(find_readme(&root), None);
    }

    #[test]
    fn test_lookup_targets() {
        let (_dir, root) = canonical_tempdir();
        std::fs::create_dir(root.join("guide")).unwrap();
        std::fs::write(root.join("guide/README.md"), "# Guide").unwrap();
        std::fs::write(root.join("notes.md"), "notes").unwrap();
        std::fs::write(root.join("logo.png"), "png").unwrap();

        let Some(Target::Directory { readme, entries }) = lookup(&root, "/guide").unwrap() else {
            panic!("expected a directory");
        };
        assert_eq!(readme, Some(root.join("guide/README.md")));
        assert_eq!(entries[0].name, "..");

        assert_eq!(
            lookup(&root, "/notes.md").unwrap(),
            Some(Target::Markdown(root.join("notes.md")))
        );
        assert_eq!(
            lookup(&root, "/logo.png").unwrap(),
            Some(Target::File(root.join("logo.png")))
        );
        assert_eq!(lookup(&root, "/missing.md").unwrap(), None);
        assert_eq!(lookup(&root, "/../outside").unwrap(), None);
    }

    #[test]
    fn test_list_dir_root() {
        let (_dir, root) = canonical_tempdir();
        std::fs::create_dir(root.join("zeta")).unwrap();
        std::fs::create_dir(root.join("alpha")).unwrap();
        std::fs::write(root.join("b.md"), "").unwrap();
        std::fs::write(root.join("a.markdown"), "").unwrap();
        std::fs::write(root.join("image.png"), "").unwrap();

        let entries = list_dir(&root, &root).unwrap();

        let summary: Vec<_> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.href.as_str(), e.is_dir))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("alpha", "/alpha", true),
                ("zeta", "/zeta", true),
                ("a.markdown", "/a.markdown", false),
                ("b.md", "/b.md", false),
            ]
        );
    }

    #[test]
    fn test_list_dir_nested() {
        let (_dir, root) = canonical_tempdir();
        let nested = root.join("guide").join("deep dive");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("setup.md"), "").unwrap();

        let entries = list_dir(&root, &nested).unwrap();

        assert_eq!(
            entries,
            vec![
                ListingEntry {
                    name: "..".to_owned(),
                    href: "/guide".to_owned(),
                    is_dir: true,
                },
                ListingEntry {
                    name: "setup.md".to_owned(),
                    href: "/guide/deep%20dive/setup.md".to_owned(),
                    is_dir: false,
                },
            ]
        );
    }

    #[test]
    fn test_list_dir_parent_of_first_level_is_root() {
        let (_dir, root) = canonical_tempdir();
        let guide = root.join("guide");
        std::fs::create_dir(&guide).unwrap();

        let entries = list_dir(&root, &guide).unwrap();

        assert_eq!(entries[0].name, "..");
        assert_eq!(entries[0].href, "/");
    }
}
