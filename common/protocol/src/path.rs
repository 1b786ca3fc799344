//! Virtual path normalization.
//!
//! Paths on the wire are plain strings: absolute, `/`-separated, no
//! trailing slash except the root itself. The shell resolves relative
//! arguments against the working directory with [`resolve`] before an op
//! ships; the host normalizes again before lookup so both sides compare
//! equal strings.

/// Resolve `path` against an absolute working directory.
///
/// Relative paths are joined onto `cwd` before normalization; absolute
/// paths ignore `cwd`. The result is always normalized.
pub fn resolve(cwd: &str, path: &str) -> String {
    if path.starts_with('/') {
        normalize(path)
    } else {
        normalize(&format!("{cwd}/{path}"))
    }
}

/// Collapse `.`, `..`, and empty segments. `..` never climbs above root.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Parent of a normalized path. The root has none.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

/// Final component of a normalized path. The root has none.
pub fn file_name(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    path.rsplit('/').next()
}

/// Join a child name onto a normalized directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Whether `path` is strictly inside `dir` (not equal to it).
pub fn is_inside(dir: &str, path: &str) -> bool {
    if dir == "/" {
        return path != "/";
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

#[cfg(test)]
#[path = "path.test.rs"]
mod tests;
