//! The fixed asset manifest and the generation name it is cached under.
//!
//! The generation name is the sole invalidation signal: changing the manifest
//! without bumping the name does not re-populate an installed generation.

use serde::{Deserialize, Serialize};

/// Generation name used when none is configured.
pub const DEFAULT_VERSION: &str = "pocket-tools-v1";

/// Tool pages shipped with the hub. Each contributes an html/js/css triple.
pub const TOOL_PAGES: &[&str] = &[
    "unit-converter",
    "timezone-converter",
    "typing-speed-test",
    "character-counter",
    "percentage-calculator",
];

/// Ordered list of asset paths that must be present for a generation to be valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Manifest {
    paths: Vec<String>,
}

impl Manifest {
    /// Build a manifest, keeping first-occurrence order and dropping duplicates.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for path in paths {
            let path = path.into();
            if !out.contains(&path) {
                out.push(path);
            }
        }
        Self { paths: out }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Entries that are not absolute paths.
    pub fn invalid_paths(&self) -> Vec<&str> {
        self.paths
            .iter()
            .filter(|p| !p.starts_with('/'))
            .map(String::as_str)
            .collect()
    }
}

impl From<Vec<String>> for Manifest {
    fn from(paths: Vec<String>) -> Self {
        Self::new(paths)
    }
}

impl From<Manifest> for Vec<String> {
    fn from(manifest: Manifest) -> Self {
        manifest.paths
    }
}

impl Default for Manifest {
    /// The hub shell followed by every tool's html/js/css triple.
    fn default() -> Self {
        let shell = ["/", "/index.html", "/styles.css", "/script.js", "/icon.svg"];
        let tools = TOOL_PAGES.iter().flat_map(|tool| {
            ["html", "js", "css"]
                .into_iter()
                .map(move |ext| format!("/tools/{tool}.{ext}"))
        });
        Self::new(shell.into_iter().map(String::from).chain(tools))
    }
}
