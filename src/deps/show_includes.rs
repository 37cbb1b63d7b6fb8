//! Scanning of `/showIncludes` output.

/// Split compiler stdout into include paths and everything else.
///
/// Lines starting with `prefix` yield the remainder, trimmed. All other
/// lines, including markers with no path, are returned unchanged (minus
/// their terminator) in their original order so the caller can forward them
/// as normal diagnostics.
pub fn scan_show_includes(stdout: &str, prefix: &str) -> (Vec<String>, Vec<String>) {
    let mut includes = Vec::new();
    let mut passthrough = Vec::new();

    for line in stdout.lines() {
        match line.strip_prefix(prefix).map(str::trim) {
            Some(path) if !path.is_empty() => includes.push(path.to_string()),
            _ => passthrough.push(line.to_string()),
        }
    }

    (includes, passthrough)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "Note: including file:";

    #[test]
    fn test_interleaved_output() {
        let stdout = "main.c\r\n\
                      Note: including file: C:\\inc\\a.h\r\n\
                      main.c(3): warning C4996: 'strcpy': This function may be unsafe\r\n\
                      Note: including file:  C:\\inc\\nested\\b.h\r\n";

        let (includes, passthrough) = scan_show_includes(stdout, PREFIX);
        assert_eq!(includes, vec!["C:\\inc\\a.h", "C:\\inc\\nested\\b.h"]);
        assert_eq!(
            passthrough,
            vec![
                "main.c",
                "main.c(3): warning C4996: 'strcpy': This function may be unsafe"
            ]
        );
    }

    #[test]
    fn test_localized_prefix() {
        let stdout = "Remarque : inclusion du fichier : C:\\a.h\nNote: including file: C:\\b.h\n";
        let (includes, passthrough) =
            scan_show_includes(stdout, "Remarque : inclusion du fichier :");
        assert_eq!(includes, vec!["C:\\a.h"]);
        assert_eq!(passthrough, vec!["Note: including file: C:\\b.h"]);
    }

    #[test]
    fn test_indented_marker_is_not_a_dependency() {
        let (includes, passthrough) = scan_show_includes("  Note: including file: a.h", PREFIX);
        assert!(includes.is_empty());
        assert_eq!(passthrough, vec!["  Note: including file: a.h"]);
    }

    #[test]
    fn test_marker_without_path_is_kept() {
        let (includes, passthrough) = scan_show_includes("Note: including file:   \nx\n", PREFIX);
        assert!(includes.is_empty());
        assert_eq!(passthrough, vec!["Note: including file:   ", "x"]);
    }

    #[test]
    fn test_empty_stdout() {
        let (includes, passthrough) = scan_show_includes("", PREFIX);
        assert!(includes.is_empty());
        assert!(passthrough.is_empty());
    }
}
