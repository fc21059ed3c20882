use serde::{Deserialize, Serialize};

/// One source file handed to the pipeline by the repository-acquisition
/// collaborator. The core never touches the filesystem itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the repository root
    pub path: String,

    /// Raw file text
    pub content: String,

    /// Language detected by the acquisition layer, e.g. "python"
    pub language: String,
}

impl SourceFile {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language: language.into(),
        }
    }
}

/// Derive the dotted module path for a file path
///
/// "pkg/util.py" becomes "pkg.util"; package markers ("__init__.py",
/// "mod.rs") collapse onto their directory.
pub fn module_path(file_path: &str) -> String {
    let no_ext = match file_path.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => file_path,
    };

    let mut segments: Vec<&str> = no_ext
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    if segments.len() > 1 {
        if let Some(last) = segments.last() {
            if *last == "__init__" || *last == "mod" {
                segments.pop();
            }
        }
    }

    if segments.is_empty() {
        return no_ext.to_string();
    }

    segments.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path_basic() {
        assert_eq!(module_path("a.py"), "a");
        assert_eq!(module_path("pkg/util.py"), "pkg.util");
        assert_eq!(module_path("src/core/graph.rs"), "src.core.graph");
    }

    #[test]
    fn test_module_path_package_markers() {
        assert_eq!(module_path("pkg/__init__.py"), "pkg");
        assert_eq!(module_path("src/core/mod.rs"), "src.core");
        // A bare marker at the root keeps its own name
        assert_eq!(module_path("__init__.py"), "__init__");
    }

    #[test]
    fn test_module_path_windows_separators() {
        assert_eq!(module_path("pkg\\sub\\util.py"), "pkg.sub.util");
    }
}
