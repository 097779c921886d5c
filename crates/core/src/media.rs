//! Media type rules for uploads and previews.

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";

/// Media types accepted by the upload endpoint.
pub const ALLOWED_UPLOAD_TYPES: &[&str] = &[MIME_PDF, MIME_JPEG, MIME_PNG];

/// Whether a declared upload media type is accepted.
///
/// Parameters such as `; charset=binary` are ignored and the comparison is
/// case-insensitive.
pub fn is_allowed_upload(mime: &str) -> bool {
    let essence = essence(mime);
    ALLOWED_UPLOAD_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// Whether stored bytes of this type can be streamed back unmodified.
///
/// PDFs and any `image/*` type qualify. Nothing is ever converted.
pub fn is_previewable(mime: &str) -> bool {
    let essence = essence(mime);
    essence.eq_ignore_ascii_case(MIME_PDF)
        || essence
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Strip media-type parameters: `image/png; q=1` -> `image/png`.
pub fn essence(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}
