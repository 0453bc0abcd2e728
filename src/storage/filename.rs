use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Lower-cased extension after the last dot, if any.
pub fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

pub fn allowed_file(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Stem used when nothing of the client's stem survives sanitising.
pub const FALLBACK_STEM: &str = "image";

/// Reduce a client-supplied filename to a safe ASCII basename.
///
/// Directory components are dropped, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9._-]` is removed and leading/trailing `.`/`_` are
/// stripped. Stem and extension are cleaned separately so the extension
/// survives an all-foreign stem (`ñ.png` -> `image.png`). Returns `None`
/// when nothing usable is left.
pub fn secure_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (clean_part(stem), clean_part(ext)),
        None => (clean_part(base), String::new()),
    };
    match (stem.is_empty(), ext.is_empty()) {
        (true, true) => None,
        (false, true) => Some(stem),
        (true, false) => Some(format!("{FALLBACK_STEM}.{ext}")),
        (false, false) => Some(format!("{stem}.{ext}")),
    }
}

fn clean_part(part: &str) -> String {
    let joined = part.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Unique object name for an upload: `<uuid>_<sanitised name>`.
pub fn object_name(filename: &str) -> Option<String> {
    let safe = secure_filename(filename)?;
    Some(format!("{}_{}", Uuid::new_v4().simple(), safe))
}

pub fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
