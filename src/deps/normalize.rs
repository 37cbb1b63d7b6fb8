//! Lexical path normalization for dependency records.
//!
//! Records from different backends must compare equal when they name the
//! same file, so every path is rewritten to forward slashes, made absolute
//! against the action's working directory and cleaned of `.`/`..`
//! components. Nothing touches the filesystem: symlinks are not resolved.
//!
//! Windows paths are recognised on every host (`C:/x`, `C:\x`, `\\host\x`)
//! so records produced by an MSVC build can be processed anywhere.

use std::path::{Path, PathBuf};

/// Normalize `path`, resolving it against `working_dir` if relative.
pub fn normalize_path(path: &str, working_dir: &Path) -> PathBuf {
    let path = path.replace('\\', "/");

    let joined = if is_absolute(&path) {
        path
    } else {
        let base = working_dir.to_string_lossy().replace('\\', "/");
        let base = base.trim_end_matches('/');
        if base.is_empty() && working_dir.as_os_str().is_empty() {
            path
        } else {
            format!("{}/{}", base, path)
        }
    };

    PathBuf::from(clean(&joined))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Absolute in either POSIX or Windows terms. Expects forward slashes.
fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || (has_drive_prefix(path) && path[2..].starts_with('/'))
}

/// Split off the root (`//`, `/`, `C:/`, `C:`) from the rest of the path.
fn split_root(path: &str) -> (&str, &str) {
    if path.starts_with("//") {
        (&path[..2], &path[2..])
    } else if path.starts_with('/') {
        (&path[..1], &path[1..])
    } else if has_drive_prefix(path) && path[2..].starts_with('/') {
        (&path[..3], &path[3..])
    } else if has_drive_prefix(path) {
        (&path[..2], &path[2..])
    } else {
        ("", path)
    }
}

fn clean(path: &str) -> String {
    let (root, rest) = split_root(path);
    let mut parts: Vec<&str> = Vec::new();

    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // `..` above the root stays at the root
                _ if !root.is_empty() => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let cleaned = format!("{}{}", root, parts.join("/"));
    if cleaned.is_empty() {
        ".".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(path: &str, cwd: &str) -> String {
        normalize_path(path, Path::new(cwd)).display().to_string()
    }

    #[test]
    fn test_relative_joined_to_working_dir() {
        assert_eq!(norm("a.h", "/work"), "/work/a.h");
        assert_eq!(norm("./include/../a.h", "/work/"), "/work/a.h");
        assert_eq!(norm("../lib/b.h", "/work/src"), "/work/lib/b.h");
    }

    #[test]
    fn test_absolute_kept() {
        assert_eq!(norm("/usr/include/stdio.h", "/work"), "/usr/include/stdio.h");
        assert_eq!(norm("/usr//include/./stdio.h", "/work"), "/usr/include/stdio.h");
    }

    #[test]
    fn test_windows_paths() {
        assert_eq!(norm(r"C:\a.h", "/work"), "C:/a.h");
        assert_eq!(norm(r"C:\sdk\inc\..\um\windows.h", "/work"), "C:/sdk/um/windows.h");
        assert_eq!(norm(r"inc\a.h", r"C:\proj"), "C:/proj/inc/a.h");
        assert_eq!(norm(r"\\server\share\a.h", "/work"), "//server/share/a.h");
    }

    #[test]
    fn test_parent_above_root() {
        assert_eq!(norm("/../a.h", "/work"), "/a.h");
        assert_eq!(norm("../../a.h", "/work"), "/a.h");
    }

    #[test]
    fn test_relative_working_dir() {
        assert_eq!(norm("a.h", "build"), "build/a.h");
        assert_eq!(norm("../a.h", "build"), "a.h");
        assert_eq!(norm("../../a.h", "build"), "../a.h");
        assert_eq!(norm("a.h", ""), "a.h");
    }
}
