//! Path intent classification
//!
//! Remote paths are plain strings. A trailing separator carries "directory
//! intent": the caller means a folder, whether or not it exists yet. Nothing in
//! here touches the remote; existence is always asked separately.

/// Path separator used by the remote namespace
pub const SEPARATOR: char = '/';

/// What a path string says about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathIntent {
    pub has_trailing_intent: bool,
    pub basename: String,
}

pub fn classify(path: &str) -> PathIntent {
    PathIntent {
        has_trailing_intent: has_trailing_intent(path),
        basename: basename(path).to_string(),
    }
}

pub fn has_trailing_intent(path: &str) -> bool {
    path.ends_with(SEPARATOR)
}

/// Remove exactly one trailing separator, if present.
pub fn strip_trailing(path: &str) -> &str {
    path.strip_suffix(SEPARATOR).unwrap_or(path)
}

/// Final segment after stripping one trailing separator.
pub fn basename(path: &str) -> &str {
    let stripped = strip_trailing(path);
    match stripped.rfind(SEPARATOR) {
        Some(idx) => &stripped[idx + 1..],
        None => stripped,
    }
}

/// Place `source`'s basename inside `dir`.
///
/// `dir` is expected to carry trailing intent; a separator is inserted when it
/// does not.
pub fn join_basename(dir: &str, source: &str) -> String {
    let name = basename(source);
    if has_trailing_intent(dir) {
        format!("{}{}", dir, name)
    } else {
        format!("{}{}{}", dir, SEPARATOR, name)
    }
}

/// Collapse doubled separators the way listing and open expect.
pub fn normalize(path: &str) -> String {
    path.replace("//", "/")
}
