use std::collections::HashMap;

use anyhow::anyhow;

include!(concat!(env!("OUT_DIR"), "/docs_generated.rs"));

/// Get help catalog content for a given command path.
///
/// Paths are normalized by stripping leading `/` characters.
/// Returns an error if the path is not found, listing available paths.
pub fn get(path: &str) -> anyhow::Result<&'static str> {
    let docs = get_docs();

    let normalized_path = path.trim_start_matches('/').to_lowercase();

    docs.get(normalized_path.as_str()).copied().ok_or_else(|| {
        let mut available: Vec<_> = docs.keys().copied().collect();
        available.sort();

        anyhow!(
            "No help entry for '{}'.\n\nAvailable topics:\n{}",
            path,
            available
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| format!("  {}", p))
                .collect::<Vec<_>>()
                .join("\n")
        )
    })
}
