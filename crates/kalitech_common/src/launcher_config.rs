use std::{collections::HashMap, path::Path};

/// An optional vmoptions-style text file read at startup (§6 "Config entry
/// (launcher)"). Blank lines and `#` comments are ignored; every other
/// non-empty line is a `key=value` pair (or a bare flag with an implicit
/// `true` value, matching vmoptions' bare `-Dfoo` convention).
#[derive(Debug, Default, Clone)]
pub struct LauncherConfig {
    entries: HashMap<String, String>,
}

impl LauncherConfig {
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((k, v)) => {
                    entries.insert(k.trim().to_owned(), v.trim().to_owned());
                }
                None => {
                    entries.insert(line.to_owned(), "true".to_owned());
                }
            }
        }
        Self { entries }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_blank_lines_and_comments() {
        let cfg = LauncherConfig::parse(
            "\n# a comment\nassets_root=./assets\n\n# another\nhot_reload=false\n",
        );
        assert_eq!(cfg.get("assets_root"), Some("./assets"));
        assert!(!cfg.get_bool("hot_reload", true));
    }

    #[test]
    fn bare_flag_defaults_to_true() {
        let cfg = LauncherConfig::parse("editor\n");
        assert!(cfg.get_bool("editor", false));
    }
}
