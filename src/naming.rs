//! Filename helpers shared by every transform step.
//!
//! Derived files keep the user's original stem so the backend can still show
//! something recognizable:
//!
//! - resize appends a suffix before the extension: `dawn.jpg` → `dawn_resized.jpg`
//! - transcoding swaps the extension: `dawn.jpg` → `dawn.avif`
//!
//! Only the last dot counts as an extension separator, so `a.b.c.jpg` keeps
//! `a.b.c` as its stem.

/// Suffix appended to the stem of a downsampled image.
pub const RESIZED_SUFFIX: &str = "_resized";

/// Split `name` at its last dot into `(stem, extension)`.
///
/// Returns `None` for the extension when there is no dot or nothing follows it.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    }
}

/// Lowercased extension of `name`, if it has one.
pub fn extension(name: &str) -> Option<String> {
    split_extension(name).1.map(|e| e.to_ascii_lowercase())
}

/// Insert `suffix` between the stem and the extension.
///
/// - `"photo.jpg"` → `"photo_resized.jpg"`
/// - `"photo"` → `"photo_resized"`
pub fn append_suffix(name: &str, suffix: &str) -> String {
    match split_extension(name) {
        (stem, Some(ext)) => format!("{stem}{suffix}.{ext}"),
        (stem, None) => format!("{stem}{suffix}"),
    }
}

/// Replace the extension of `name` with `ext` (given without the dot).
///
/// Names without an extension get one appended, so the backend always sees
/// a filename that agrees with the declared content type.
pub fn replace_extension(name: &str, ext: &str) -> String {
    let (stem, _) = split_extension(name);
    let stem = stem.strip_suffix('.').unwrap_or(stem);
    format!("{stem}.{ext}")
}
