use serde::Deserialize;
use serde_json::Value as JsonValue;

/// The declarative value exported from the root module (§6 "World
/// descriptor").
#[derive(Debug, Clone, Deserialize)]
pub struct WorldDescriptor {
    pub name: String,
    #[serde(default)]
    pub mode: Option<WorldMode>,
    #[serde(default)]
    pub systems: Vec<SystemEntry>,
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldMode {
    Play,
    Editor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemEntry {
    /// Entries missing `id` are filtered out before the build (§4.I).
    pub id: Option<String>,
    pub order: i64,
    #[serde(rename = "stableId", default)]
    pub stable_id: Option<String>,
    #[serde(default)]
    pub config: JsonValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityEntry {
    pub name: Option<String>,
    pub prefab: Option<String>,
    #[serde(default)]
    pub config: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_descriptor() {
        let json = serde_json::json!({
            "name": "main",
            "systems": [{"id": "jsSystem", "order": 10, "config": {"module": "Scripts/a.js"}}]
        });
        let descriptor: WorldDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(descriptor.name, "main");
        assert_eq!(descriptor.systems.len(), 1);
        assert_eq!(descriptor.systems[0].id.as_deref(), Some("jsSystem"));
    }
}
