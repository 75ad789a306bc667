use std::collections::HashMap;
use std::path::Path;

/// Injected string capability. Views receive one explicitly instead of
/// reaching into shared context.
pub trait Localizer {
    fn resolve(&self, key: &str, params: &[(&str, String)]) -> String;
}

const DEFAULT_STRINGS: &[(&str, &str)] = &[
    ("editDetails", "Edit details"),
    ("copy", "Copy"),
    ("delete", "Delete"),
    ("preview", "Preview"),
    ("optionsLabel", "Options"),
    ("statusActive", "Active"),
    ("statusInactive", "Inactive"),
    ("averageScore", "Average score: {score}%"),
    ("averageScoreNoData", "Average score: not available"),
    ("recipients", "Recipients: {groups}"),
    ("entireClass", "Entire class"),
    ("learnerCount", "{count} learners"),
    ("bannerExpand", "Show details"),
    ("bannerCollapse", "Hide details"),
];

#[derive(Debug, Clone)]
pub struct StringTable {
    strings: HashMap<String, String>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self {
            strings: DEFAULT_STRINGS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl StringTable {
    /// Overlays string values from a JSON object. Non-string values are ignored.
    pub fn apply_overrides(&mut self, overrides: &serde_json::Value) -> usize {
        let Some(obj) = overrides.as_object() else {
            return 0;
        };
        let mut applied = 0;
        for (k, v) in obj {
            if let Some(s) = v.as_str() {
                self.strings.insert(k.clone(), s.to_string());
                applied += 1;
            }
        }
        applied
    }

    pub fn load_overrides(&mut self, path: &Path) -> anyhow::Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        Ok(self.apply_overrides(&value))
    }
}

impl Localizer for StringTable {
    fn resolve(&self, key: &str, params: &[(&str, String)]) -> String {
        let Some(template) = self.strings.get(key) else {
            return key.to_string();
        };
        render(template, params)
    }
}

// `{name}` is replaced when `name` is in params; anything else stays verbatim.
fn render(template: &str, params: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match params.iter().find(|(k, _)| *k == name) {
                    Some((_, v)) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
