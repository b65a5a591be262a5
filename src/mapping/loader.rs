use crate::config::hash_content;
use crate::extract::parse_selector;
use crate::mapping::types::{BlockRule, ComponentRule, ComponentTarget, ExtractionKind};
use crate::ConfigError;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A rule as written in the mapping JSON
#[derive(Debug, Deserialize)]
struct RawRule {
    name: String,
    selector: String,
    components: RawComponents,
}

/// A component value: either a bare selector or a selector with an
/// explicit extraction field
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawComponent {
    Selector(String),
    Detailed {
        selector: String,
        #[serde(default)]
        extract: Option<String>,
    },
}

/// Component map kept in document order
#[derive(Debug)]
struct RawComponents(Vec<(String, RawComponent)>);

impl<'de> Deserialize<'de> for RawComponents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ComponentsVisitor;

        impl<'de> Visitor<'de> for ComponentsVisitor {
            type Value = RawComponents;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of component name to selector")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, component)) = map.next_entry::<String, RawComponent>()? {
                    entries.push((name, component));
                }
                Ok(RawComponents(entries))
            }
        }

        deserializer.deserialize_map(ComponentsVisitor)
    }
}

/// The loaded, validated block mapping
///
/// Rule order is significant: earlier rules claim elements before later
/// rules see them.
#[derive(Debug, Clone)]
pub struct MappingLoader {
    rules: Vec<BlockRule>,
    hash: String,
}

impl MappingLoader {
    /// Reads and validates a mapping file
    ///
    /// # Returns
    ///
    /// * `Ok(MappingLoader)` - The ordered rule set
    /// * `Err(ConfigError::MappingNotFound)` - The file does not exist
    /// * `Err(ConfigError)` - The file could not be read, parsed or validated
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::MappingNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let loader = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded {} block rules from {}",
            loader.rules.len(),
            path.display()
        );
        Ok(loader)
    }

    /// Parses and validates mapping JSON (an array of rule records)
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let raw: Vec<RawRule> = serde_json::from_str(content)?;

        let rules = raw
            .into_iter()
            .map(convert_rule)
            .collect::<Result<Vec<_>, _>>()?;

        validate_rules(&rules)?;

        Ok(Self {
            rules,
            hash: hash_content(content),
        })
    }

    /// Wraps rules built in code, applying the same validation
    pub fn from_rules(rules: Vec<BlockRule>) -> Result<Self, ConfigError> {
        validate_rules(&rules)?;
        let hash = hash_content(&format!("{:?}", rules));
        Ok(Self { rules, hash })
    }

    pub fn rules(&self) -> &[BlockRule] {
        &self.rules
    }

    /// SHA-256 of the mapping source
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn convert_rule(raw: RawRule) -> Result<BlockRule, ConfigError> {
    let mut components = Vec::with_capacity(raw.components.0.len());

    for (name, component) in raw.components.0 {
        let (selector, extract) = match component {
            RawComponent::Selector(selector) => (selector, None),
            RawComponent::Detailed { selector, extract } => (selector, extract),
        };

        let explicit = match extract {
            Some(field) => Some(ExtractionKind::from_field(&field).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "Component '{}' of rule '{}' has an empty extract field",
                    name, raw.name
                ))
            })?),
            None => None,
        };

        components.push(ComponentRule::new(&name, &selector, explicit));
    }

    Ok(BlockRule {
        name: raw.name,
        selector: raw.selector,
        components,
    })
}

/// Validates every rule: names, component lists and selector syntax
fn validate_rules(rules: &[BlockRule]) -> Result<(), ConfigError> {
    if rules.is_empty() {
        tracing::warn!("Block mapping contains no rules; block extraction will yield nothing");
    }

    for rule in rules {
        validate_rule(rule)?;
    }

    Ok(())
}

fn validate_rule(rule: &BlockRule) -> Result<(), ConfigError> {
    if rule.name.trim().is_empty() || rule.family().is_empty() {
        return Err(ConfigError::Validation(
            "Block rule name cannot be empty".to_string(),
        ));
    }

    if rule.components.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Block rule '{}' must define at least one component",
            rule.name
        )));
    }

    check_selector(&rule.name, &rule.selector)?;

    let mut seen = HashSet::new();
    for component in &rule.components {
        if component.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Block rule '{}' has a component with an empty name",
                rule.name
            )));
        }

        if !seen.insert(component.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Block rule '{}' defines component '{}' twice",
                rule.name, component.name
            )));
        }

        if let ComponentTarget::Descendant(selector) = &component.target {
            check_selector(&rule.name, selector)?;
        }
    }

    Ok(())
}

fn check_selector(rule: &str, selector: &str) -> Result<(), ConfigError> {
    parse_selector(selector)
        .map(|_| ())
        .map_err(|message| ConfigError::InvalidSelector {
            rule: rule.to_string(),
            selector: selector.to_string(),
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HERO_MAPPING: &str = r#"[
        {
            "name": "hero",
            "selector": ".hero",
            "components": { "Title": "h1", "CTA Link": "a.cta" }
        },
        {
            "name": "card:wide",
            "selector": ".card-wide",
            "components": {
                "Target": "[href]",
                "Heading": "h3",
                "Picture": { "selector": "img", "extract": "data-src" },
                "Body": { "selector": "p" }
            }
        }
    ]"#;

    #[test]
    fn test_parse_rules_in_order() {
        let loader = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
        assert_eq!(loader.len(), 2);
        assert_eq!(loader.rules()[0].name, "hero");
        assert_eq!(loader.rules()[1].family(), "card");
    }

    #[test]
    fn test_component_order_preserved() {
        let loader = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
        let names: Vec<_> = loader.rules()[1]
            .components
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Target", "Heading", "Picture", "Body"]);
    }

    #[test]
    fn test_component_kinds_resolved() {
        let loader = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
        let hero = &loader.rules()[0];
        assert_eq!(hero.components[0].kind, ExtractionKind::Text);
        assert_eq!(
            hero.components[1].kind,
            ExtractionKind::Attribute("href".to_string())
        );

        let card = &loader.rules()[1];
        assert_eq!(card.components[0].target, ComponentTarget::HrefSentinel);
        assert_eq!(
            card.components[2].kind,
            ExtractionKind::Attribute("data-src".to_string())
        );
        assert_eq!(card.components[3].kind, ExtractionKind::Text);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = MappingLoader::from_path(Path::new("/nonexistent/mapping.json"));
        assert!(matches!(result, Err(ConfigError::MappingNotFound(_))));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[{ \"name\": \"hero\", ").unwrap();
        let result = MappingLoader::from_path(file.path());
        assert!(matches!(result, Err(ConfigError::MappingParse(_))));
    }

    #[test]
    fn test_empty_components_rejected() {
        let json = r#"[{ "name": "hero", "selector": ".hero", "components": {} }]"#;
        let result = MappingLoader::from_json_str(json);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let json = r#"[{ "name": "hero", "selector": "div[[", "components": { "Title": "h1" } }]"#;
        let result = MappingLoader::from_json_str(json);
        assert!(matches!(result, Err(ConfigError::InvalidSelector { .. })));
    }

    #[test]
    fn test_same_content_same_hash() {
        let a = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
        let b = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash().len(), 64);
    }
}
