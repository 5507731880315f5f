use std::collections::HashMap;
use std::sync::Arc;

use nmv_domain::DeviceType;
use tracing::debug;

use crate::error::RegistryError;
use crate::parser::Parser;
use crate::plugins;

/// Composite registry key. `device_type = None` holds cross-vendor parsers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParserKey {
    pub device_type: Option<DeviceType>,
    pub api_name: String,
}

/// Process-wide parser lookup table.
///
/// Populated once at startup by [`ParserRegistry::with_builtin_parsers`]
/// and frozen thereafter — services share it behind an `Arc` and never
/// mutate it.
pub struct ParserRegistry {
    parsers: HashMap<ParserKey, Arc<dyn Parser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Build a registry containing every built-in plugin. The explicit
    /// registration block replaces the upstream import-side-effect
    /// auto-discovery.
    pub fn with_builtin_parsers() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for parser in plugins::builtin_parsers() {
            registry.register(parser)?;
        }
        debug!(count = registry.len(), "parser registry populated");
        Ok(registry)
    }

    /// Register a parser. Duplicate keys are a startup error.
    pub fn register(&mut self, parser: Arc<dyn Parser>) -> Result<(), RegistryError> {
        let key = ParserKey {
            device_type: parser.device_type(),
            api_name: parser.api_name().to_string(),
        };
        if self.parsers.contains_key(&key) {
            return Err(RegistryError::DuplicateParser {
                device_type: key.device_type,
                api_name: key.api_name,
            });
        }
        self.parsers.insert(key, parser);
        Ok(())
    }

    /// Resolve a parser: exact `(device_type, api_name)` match first, then
    /// the device-type-absent fallback for cross-vendor parsers.
    pub fn get(&self, api_name: &str, device_type: Option<DeviceType>) -> Option<Arc<dyn Parser>> {
        if let Some(dt) = device_type {
            let key = ParserKey {
                device_type: Some(dt),
                api_name: api_name.to_string(),
            };
            if let Some(parser) = self.parsers.get(&key) {
                return Some(parser.clone());
            }
        }
        let generic = ParserKey {
            device_type: None,
            api_name: api_name.to_string(),
        };
        self.parsers.get(&generic).cloned()
    }

    /// Mandatory-lookup variant used by the collection services.
    pub fn get_or_raise(
        &self,
        api_name: &str,
        device_type: Option<DeviceType>,
    ) -> Result<Arc<dyn Parser>, RegistryError> {
        self.get(api_name, device_type)
            .ok_or_else(|| RegistryError::NoParser {
                device_type,
                api_name: api_name.to_string(),
                available: {
                    let mut names: Vec<&str> = self
                        .parsers
                        .keys()
                        .map(|k| k.api_name.as_str())
                        .collect();
                    names.sort_unstable();
                    names.dedup();
                    names.join(", ")
                },
            })
    }

    pub fn keys(&self) -> Vec<ParserKey> {
        let mut keys: Vec<ParserKey> = self.parsers.keys().cloned().collect();
        keys.sort_by(|a, b| {
            a.api_name
                .cmp(&b.api_name)
                .then_with(|| format!("{:?}", a.device_type).cmp(&format!("{:?}", b.device_type)))
        });
        keys
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmv_domain::ParsedRecord;

    struct Stub {
        device_type: Option<DeviceType>,
        api_name: &'static str,
    }

    impl Parser for Stub {
        fn device_type(&self) -> Option<DeviceType> {
            self.device_type
        }
        fn api_name(&self) -> &'static str {
            self.api_name
        }
        fn parse(&self, _raw: &str) -> Vec<ParsedRecord> {
            vec![]
        }
    }

    #[test]
    fn exact_match_wins_over_fallback() {
        let mut reg = ParserRegistry::new();
        reg.register(Arc::new(Stub {
            device_type: Some(DeviceType::Hpe),
            api_name: "get_fan_hpe_dna",
        }))
        .unwrap();
        reg.register(Arc::new(Stub {
            device_type: None,
            api_name: "get_fan_hpe_dna",
        }))
        .unwrap();

        let exact = reg.get("get_fan_hpe_dna", Some(DeviceType::Hpe)).unwrap();
        assert_eq!(exact.device_type(), Some(DeviceType::Hpe));

        let fallback = reg.get("get_fan_hpe_dna", Some(DeviceType::CiscoIos)).unwrap();
        assert_eq!(fallback.device_type(), None);
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut reg = ParserRegistry::new();
        reg.register(Arc::new(Stub {
            device_type: Some(DeviceType::Hpe),
            api_name: "get_fan_hpe_dna",
        }))
        .unwrap();
        let err = reg
            .register(Arc::new(Stub {
                device_type: Some(DeviceType::Hpe),
                api_name: "get_fan_hpe_dna",
            }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateParser { .. }));
    }

    #[test]
    fn get_or_raise_lists_available() {
        let reg = ParserRegistry::new();
        let err = reg.get_or_raise("nope", None).unwrap_err();
        assert!(matches!(err, RegistryError::NoParser { .. }));
    }

    #[test]
    fn builtin_registry_builds_cleanly() {
        let reg = ParserRegistry::with_builtin_parsers().unwrap();
        assert!(reg.len() > 20);
        // The cross-vendor ping parser resolves for every device type.
        assert!(reg.get("ping_batch", Some(DeviceType::Hpe)).is_some());
        assert!(reg.get("ping_batch", None).is_some());
    }
}
