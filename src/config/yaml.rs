//! YAML property source loading.
//!
//! Nested mappings flatten to dotted keys and sequences to indexed keys:
//!
//! ```yaml
//! server:
//!   port: 8080
//!   hosts: [a, b]
//! ```
//!
//! becomes `server.port=8080`, `server.hosts[0]=a`, `server.hosts[1]=b`.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;

use crate::config::loader::PropertySourceLoader;
use crate::config::property_source::PropertySource;
use crate::config::resource::Resource;
use crate::error::{AutowireError, Result};

/// Loads `.yml` and `.yaml` resources, one source per YAML document.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlPropertySourceLoader;

impl YamlPropertySourceLoader {
    /// Parse every document of `content` into a flattened map.
    ///
    /// Documents that flatten to nothing are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use autowire::config::YamlPropertySourceLoader;
    ///
    /// let content = "server:\n  port: 8080\n---\nautowire:\n  profiles:\n    include: [a, b]\n";
    /// let docs = YamlPropertySourceLoader::parse_documents(content).unwrap();
    ///
    /// assert_eq!(docs.len(), 2);
    /// assert_eq!(docs[0].get("server.port"), Some(&"8080".to_string()));
    /// assert_eq!(docs[1].get("autowire.profiles.include[1]"), Some(&"b".to_string()));
    /// ```
    pub fn parse_documents(content: &str) -> std::result::Result<Vec<IndexMap<String, String>>, serde_yaml::Error> {
        let mut documents = Vec::new();

        for document in serde_yaml::Deserializer::from_str(content) {
            let value = Value::deserialize(document)?;
            let mut flat = IndexMap::new();
            flatten(None, &value, &mut flat);
            if !flat.is_empty() {
                documents.push(flat);
            }
        }

        Ok(documents)
    }
}

impl PropertySourceLoader for YamlPropertySourceLoader {
    fn file_extensions(&self) -> &[&str] {
        &["yml", "yaml"]
    }

    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>> {
        let documents =
            Self::parse_documents(&resource.content).map_err(|e| AutowireError::ConfigLoad {
                location: resource.location.clone(),
                message: e.to_string(),
            })?;

        let numbered = documents.len() != 1;
        Ok(documents
            .into_iter()
            .enumerate()
            .map(|(i, properties)| {
                let source_name = if numbered {
                    format!("{} (document #{})", name, i)
                } else {
                    name.to_string()
                };
                PropertySource::from_properties(source_name, properties)
            })
            .collect())
    }
}

fn flatten(prefix: Option<&str>, value: &Value, out: &mut IndexMap<String, String>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let Some(key) = scalar_to_string(key) else {
                    continue;
                };
                let path = match prefix {
                    Some(prefix) => format!("{}.{}", prefix, key),
                    None => key,
                };
                flatten(Some(&path), child, out);
            }
        }
        Value::Sequence(items) => {
            let prefix = prefix.unwrap_or_default();
            for (i, child) in items.iter().enumerate() {
                flatten(Some(&format!("{}[{}]", prefix, i)), child, out);
            }
        }
        Value::Tagged(tagged) => flatten(prefix, &tagged.value, out),
        Value::Null => {
            if let Some(prefix) = prefix {
                out.insert(prefix.to_string(), String::new());
            }
        }
        scalar => {
            if let (Some(prefix), Some(text)) = (prefix, scalar_to_string(scalar)) {
                out.insert(prefix.to_string(), text);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(content: &str) -> Resource {
        Resource {
            location: "classpath:/application.yml".to_string(),
            description: "test".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn flattens_nested_maps_and_sequences() {
        let content = r#"
server:
  port: 8080
  ssl:
    enabled: true
  hosts:
    - a
    - name: b
"#;
        let docs = YamlPropertySourceLoader::parse_documents(content).unwrap();
        let doc = &docs[0];
        assert_eq!(doc.get("server.port"), Some(&"8080".to_string()));
        assert_eq!(doc.get("server.ssl.enabled"), Some(&"true".to_string()));
        assert_eq!(doc.get("server.hosts[0]"), Some(&"a".to_string()));
        assert_eq!(doc.get("server.hosts[1].name"), Some(&"b".to_string()));
    }

    #[test]
    fn null_values_become_empty_strings() {
        let docs = YamlPropertySourceLoader::parse_documents("key:\n").unwrap();
        assert_eq!(docs[0].get("key"), Some(&String::new()));
    }

    #[test]
    fn single_document_keeps_plain_name() {
        let sources = YamlPropertySourceLoader
            .load("applicationConfig: [classpath:/application.yml]", &resource("a: 1"))
            .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "applicationConfig: [classpath:/application.yml]");
    }

    #[test]
    fn multiple_documents_are_numbered() {
        let content = "a: 1\n---\nb: 2\n";
        let sources = YamlPropertySourceLoader.load("cfg", &resource(content)).unwrap();
        let names: Vec<&str> = sources.iter().map(PropertySource::name).collect();
        assert_eq!(names, vec!["cfg (document #0)", "cfg (document #1)"]);
        assert_eq!(sources[1].get("b"), Some("2"));
    }

    #[test]
    fn empty_documents_are_dropped() {
        let content = "---\n---\na: 1\n";
        let sources = YamlPropertySourceLoader.load("cfg", &resource(content)).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "cfg");
    }

    #[test]
    fn empty_file_produces_nothing() {
        let sources = YamlPropertySourceLoader.load("cfg", &resource("")).unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn malformed_yaml_is_config_load_error() {
        let result = YamlPropertySourceLoader.load("cfg", &resource("a: [unclosed"));
        assert!(matches!(result, Err(AutowireError::ConfigLoad { .. })));
    }
}
