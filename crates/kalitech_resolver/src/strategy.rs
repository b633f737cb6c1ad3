use std::collections::HashMap;

use crate::module_id::{normalize, ModuleId};

/// One step of the resolver chain (§4.A). Returns `Some(base_id)` on a
/// match, `None` to let the next strategy try.
pub trait ResolveStrategy: Send + Sync {
    fn resolve(&self, parent: &ModuleId, request: &str) -> Option<ModuleId>;
}

/// `@builtin/...` requests pass through untouched — they are handled by the
/// builtin namespace loader, not the filesystem (§4.A #1).
pub struct BuiltinStrategy;

impl ResolveStrategy for BuiltinStrategy {
    fn resolve(&self, _parent: &ModuleId, request: &str) -> Option<ModuleId> {
        request.starts_with("@builtin/").then(|| request.to_owned())
    }
}

/// `<ns>:<path>` maps to `<mods_root>/<ns>/<path>` (§4.A #2).
pub struct NamespaceStrategy {
    pub mods_root: String,
}

impl ResolveStrategy for NamespaceStrategy {
    fn resolve(&self, _parent: &ModuleId, request: &str) -> Option<ModuleId> {
        let (ns, path) = request.split_once(':')?;
        // Avoid colliding with windows-drive-letter-shaped or scoped-builtin requests.
        if ns.is_empty() || ns.contains('/') || request.starts_with("@builtin/") {
            return None;
        }
        Some(normalize(&format!("{}/{}/{}", self.mods_root, ns, path)))
    }
}

/// Longest-matching-prefix alias map, e.g. `{"@core" -> "Scripts/core"}`
/// (§4.A #3). Mutable at runtime per §6 `MutableAliasResolver.setAliases`.
#[derive(Default)]
pub struct AliasStrategy {
    aliases: parking_lot::RwLock<HashMap<String, String>>,
}

impl AliasStrategy {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self {
            aliases: parking_lot::RwLock::new(aliases),
        }
    }

    pub fn set_aliases(&self, aliases: HashMap<String, String>) {
        *self.aliases.write() = aliases;
    }
}

impl ResolveStrategy for AliasStrategy {
    fn resolve(&self, _parent: &ModuleId, request: &str) -> Option<ModuleId> {
        let aliases = self.aliases.read();
        let best = aliases
            .iter()
            .filter(|(prefix, _)| {
                request.as_bytes().starts_with(prefix.as_bytes())
                    && (request.len() == prefix.len()
                        || request.as_bytes()[prefix.len()] == b'/')
            })
            .max_by_key(|(prefix, _)| prefix.len());

        best.map(|(prefix, target)| {
            let remainder = &request[prefix.len()..];
            normalize(&format!("{target}{remainder}"))
        })
    }
}

/// `./` / `../` requests resolve against the parent module's directory
/// (§4.A #4). A pop past root fails (returns `None`).
pub struct RelativeStrategy;

impl ResolveStrategy for RelativeStrategy {
    fn resolve(&self, parent: &ModuleId, request: &str) -> Option<ModuleId> {
        if !(request.starts_with("./") || request.starts_with("../")) {
            return None;
        }

        let parent_dir: Vec<&str> = parent.rsplit_once('/').map(|(d, _)| d).unwrap_or("").split('/').filter(|s| !s.is_empty()).collect();
        let mut segments: Vec<String> = parent_dir.into_iter().map(str::to_owned).collect();

        for part in request.split('/') {
            match part {
                "." | "" => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return None;
                    }
                }
                other => segments.push(other.to_owned()),
            }
        }

        Some(normalize(&segments.join("/")))
    }
}

/// Requests under an allow-listed root are accepted as-is (§4.A #5).
pub struct PassThroughStrategy {
    pub allowed_roots: Vec<String>,
}

impl ResolveStrategy for PassThroughStrategy {
    fn resolve(&self, _parent: &ModuleId, request: &str) -> Option<ModuleId> {
        let normalized = normalize(request);
        self.allowed_roots
            .iter()
            .any(|root| normalized.starts_with(root.as_str()))
            .then_some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_pops_past_root_fails() {
        let s = RelativeStrategy;
        assert_eq!(s.resolve(&"a.js".to_owned(), "../../b.js"), None);
    }

    #[test]
    fn relative_resolves_against_parent_dir() {
        let s = RelativeStrategy;
        assert_eq!(
            s.resolve(&"Scripts/core/cam.js".to_owned(), "../a/b.js"),
            Some("Scripts/a/b.js".to_owned())
        );
    }

    #[test]
    fn alias_longest_prefix_wins() {
        let mut m = HashMap::new();
        m.insert("@core".to_owned(), "Scripts/core".to_owned());
        m.insert("@core/cam".to_owned(), "Scripts/special_cam".to_owned());
        let s = AliasStrategy::new(m);
        assert_eq!(
            s.resolve(&"x".to_owned(), "@core/cam/third"),
            Some("Scripts/special_cam/third".to_owned())
        );
    }

    #[test]
    fn namespace_maps_to_mods_root() {
        let s = NamespaceStrategy {
            mods_root: "Mods".to_owned(),
        };
        assert_eq!(
            s.resolve(&"x".to_owned(), "myns:sub/thing.js"),
            Some("Mods/myns/sub/thing.js".to_owned())
        );
    }
}
