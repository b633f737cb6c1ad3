const RECOGNIZED_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".json"];

/// Expands a resolved base id into the ordered candidate list the registry
/// tries in turn (§4.A "candidate expander"): a single candidate if the id
/// already carries a recognized extension, otherwise `[base/index.js, base.js]`.
pub fn expand_candidates(base: &str) -> Vec<String> {
    if RECOGNIZED_EXTENSIONS.iter().any(|ext| base.ends_with(ext)) {
        vec![base.to_owned()]
    } else {
        vec![format!("{base}/index.js"), format!("{base}.js")]
    }
}
