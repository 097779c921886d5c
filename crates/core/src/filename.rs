//! Client-supplied filename handling.
//!
//! Some browsers send the UTF-8 bytes of a non-ASCII filename in the
//! multipart header, and the bytes end up decoded one-per-character as
//! Latin-1. [`repair_display_name`] undoes that when it can. It is a
//! best-effort fallback: a name that was already correct, or that cannot be
//! reinterpreted, is returned unchanged, so an oddly encoded name may still
//! reach the listing as received.

/// Longest extension kept when naming stored files.
const MAX_EXTENSION_LEN: usize = 16;

/// Recover a filename whose UTF-8 bytes were misread as Latin-1.
///
/// Every character must fit in a single byte (U+0000..=U+00FF) and the
/// resulting byte string must be valid UTF-8; otherwise `name` is kept.
pub fn repair_display_name(name: &str) -> String {
    if name.is_ascii() {
        return name.to_string();
    }

    let bytes: Option<Vec<u8>> = name
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();

    match bytes.map(String::from_utf8) {
        Some(Ok(repaired)) => repaired,
        _ => name.to_string(),
    }
}

/// Extension of the client filename, dot included, safe for use in a
/// stored file name.
///
/// Returns an empty string when the name has no extension, is a dotfile,
/// or the extension contains anything but ASCII alphanumerics.
pub fn storage_extension(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let Some((stem, ext)) = base.rsplit_once('.') else {
        return String::new();
    };

    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return String::new();
    }

    format!(".{ext}")
}
