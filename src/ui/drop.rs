//! Drag-and-drop intake
//!
//! Dropped entries arrive as `file://` URLs or plain paths. Anything that
//! does not resolve to a regular file is ignored.

use std::path::PathBuf;

use percent_encoding::percent_decode_str;

/// Convert a dropped entry to a local path
///
/// Returns None for non-`file` URL schemes (http, smb, ...) and for
/// `file://` URLs that name a remote host.
pub fn url_to_local_path(entry: &str) -> Option<PathBuf> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    if let Some(rest) = strip_prefix_ignore_case(entry, "file://") {
        // file:///abs/path or file://localhost/abs/path
        let path_part = if rest.starts_with('/') {
            rest
        } else if let Some(after_host) = strip_prefix_ignore_case(rest, "localhost") {
            after_host
        } else {
            log::debug!("Ignoring remote file URL: {}", entry);
            return None;
        };
        return Some(decode_path(path_part));
    }

    if has_url_scheme(entry) {
        log::debug!("Ignoring non-file URL: {}", entry);
        return None;
    }

    Some(PathBuf::from(entry))
}

/// Resolve dropped entries to the regular files among them, in drop order
pub fn dropped_files<S: AsRef<str>>(entries: &[S]) -> Vec<PathBuf> {
    entries
        .iter()
        .filter_map(|entry| url_to_local_path(entry.as_ref()))
        .filter(|path| path.is_file())
        .collect()
}

/// Percent-decode the path part of a `file://` URL
///
/// On unix the escapes are raw filename bytes, which need not be UTF-8.
#[cfg(unix)]
fn decode_path(path_part: &str) -> PathBuf {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let bytes: Vec<u8> = percent_decode_str(path_part).collect();
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn decode_path(path_part: &str) -> PathBuf {
    PathBuf::from(percent_decode_str(path_part).decode_utf8_lossy().as_ref())
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// `scheme://...` with an RFC 3986 scheme name
fn has_url_scheme(entry: &str) -> bool {
    let Some((scheme, _)) = entry.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
