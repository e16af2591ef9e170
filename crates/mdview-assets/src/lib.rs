//! Static assets bundled into the mdview binary.
//!
//! Holds the fallback GitHub-like stylesheet served under `/css/` when the
//! live GitHub stylesheets cannot be discovered.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

#[derive(rust_embed::RustEmbed)]
#[folder = "assets"]
#[prefix = ""]
struct Assets;

/// Get an asset by path (relative to `assets/`, e.g. `css/style.css`).
///
/// Returns the file contents if the asset exists, `None` otherwise.
#[must_use]
pub fn get(path: &str) -> Option<Cow<'static, [u8]>> {
    Assets::get(path).map(|f| f.data)
}

/// Return the MIME type string for the given file path.
#[must_use]
pub fn mime_for(path: &str) -> &'static str {
    static INTERNED: OnceLock<Mutex<HashMap<String, &'static str>>> = OnceLock::new();

    let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();
    let mut interned = INTERNED
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(known) = interned.get(&mime) {
        return known;
    }
    let leaked: &'static str = Box::leak(mime.clone().into_boxed_str());
    interned.insert(mime, leaked);
    leaked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_types() {
        assert_eq!(mime_for("style.css"), "text/css");
        assert_eq!(mime_for("notes.txt"), "text/plain");
        assert_eq!(mime_for("index.html"), "text/html");
        assert_eq!(mime_for("image.png"), "image/png");
    }

    #[test]
    fn test_mime_for_is_interned() {
        let first = mime_for("a.css");
        let second = mime_for("b.css");

        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_mime_for_unknown_type() {
        assert_eq!(mime_for("file.unknown_ext_xyz"), "application/octet-stream");
    }

    #[test]
    fn test_get_stylesheet() {
        let css = get("css/style.css").unwrap();

        assert!(std::str::from_utf8(&css).unwrap().contains(".markdown-body"));
    }

    #[test]
    fn test_get_nonexistent_asset() {
        assert!(get("nonexistent_file_that_does_not_exist.txt").is_none());
    }
}
