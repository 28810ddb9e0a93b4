use std::path::Path;

/// Hex MD5 of the content. Used only to detect changes between runs.
pub fn digest(content: &[u8]) -> String {
    format!("{:x}", md5::compute(content))
}

/// MIME type guessed from the file extension, `application/octet-stream`
/// when unknown.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
