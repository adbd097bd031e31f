use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoadStyle {
    DEFAULT,

    YAML,

}

/// output format a CLI front-end renders its pretty-printed structs in
/// (spec §1: CLI front-ends are out of scope beyond their interface shape).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Format {
    Json,
    Yaml,
    None,
}

impl Format {
    pub fn format(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Format::Json,
            "yaml" => Format::Yaml,
            _ => Format::None,
        }
    }
}