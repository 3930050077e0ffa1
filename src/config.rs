use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{Result, StacheError};
use crate::stache::host::{Component, Host, VNode, VirtualDom};
use crate::stache::html;
use crate::stache::value::Value;

/// What a Section does with a value that is not a boolean, list or struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub enum SectionPolicy {
    /// Render the body against the enclosing scope.
    #[default]
    Lenient,
    /// Fail with `InvalidSectionValue`.
    Strict,
}

/// Caller overrides, merged over the defaults once per compile.
///
/// Usually read from a JSON file with [`load_options`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(default)]
#[ts(export)]
pub struct RenderOptions {
    /// Extra tag names treated as opaque host tags.
    pub externs: Vec<String>,
    pub self_closing_tags: Vec<String>,
    /// Event attribute renames; keys are matched case-insensitively.
    pub synthetic_events: BTreeMap<String, String>,
    /// Attribute renames applied on host tags only.
    pub extern_props: BTreeMap<String, String>,
    pub boolean_attributes: Vec<String>,
    /// `None` keeps the current policy.
    pub strict_sections: Option<bool>,
}

/// Immutable render configuration. Build it once, then hand it to
/// [`compile_layout`](crate::stache::compile_layout).
#[derive(Clone)]
pub struct RenderConfig {
    pub externs: BTreeSet<String>,
    /// Caller components, taking precedence over templates of the same name.
    pub registry: IndexMap<String, Component>,
    pub self_closing_tags: BTreeSet<String>,
    /// Lower-cased attribute name → canonical event prop name.
    pub synthetic_events: BTreeMap<String, String>,
    pub extern_props: BTreeMap<String, String>,
    pub boolean_attributes: BTreeSet<String>,
    pub section_policy: SectionPolicy,
    pub host: Arc<dyn Host>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let mut synthetic_events: BTreeMap<String, String> = html::SYNTHETIC_EVENTS
            .iter()
            .map(|name| (name.to_ascii_lowercase(), (*name).to_string()))
            .collect();
        for (alias, name) in html::SYNTHETIC_EVENT_ALIASES {
            synthetic_events.insert((*alias).to_string(), (*name).to_string());
        }
        Self {
            externs: owned_set(html::HTML_TAGS),
            registry: IndexMap::new(),
            self_closing_tags: owned_set(html::SELF_CLOSING_TAGS),
            synthetic_events,
            extern_props: html::HOST_PROP_RENAMES
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
            boolean_attributes: owned_set(html::BOOLEAN_ATTRIBUTES),
            section_policy: SectionPolicy::default(),
            host: Arc::new(VirtualDom),
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("externs", &self.externs.len())
            .field("registry", &self.registry.keys().collect::<Vec<_>>())
            .field("self_closing_tags", &self.self_closing_tags)
            .field("synthetic_events", &self.synthetic_events.len())
            .field("extern_props", &self.extern_props.len())
            .field("boolean_attributes", &self.boolean_attributes.len())
            .field("section_policy", &self.section_policy)
            .finish_non_exhaustive()
    }
}

impl RenderConfig {
    /// No host tags, events or renames at all.
    pub fn bare() -> Self {
        Self {
            externs: BTreeSet::new(),
            registry: IndexMap::new(),
            self_closing_tags: BTreeSet::new(),
            synthetic_events: BTreeMap::new(),
            extern_props: BTreeMap::new(),
            boolean_attributes: BTreeSet::new(),
            section_policy: SectionPolicy::default(),
            host: Arc::new(VirtualDom),
        }
    }

    /// Union of the current tables and `options`; on conflicting keys the
    /// options win.
    #[must_use]
    pub fn with_options(mut self, options: &RenderOptions) -> Self {
        self.externs.extend(options.externs.iter().cloned());
        self.self_closing_tags
            .extend(options.self_closing_tags.iter().cloned());
        self.synthetic_events.extend(
            options
                .synthetic_events
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone())),
        );
        self.extern_props.extend(options.extern_props.clone());
        self.boolean_attributes.extend(
            options
                .boolean_attributes
                .iter()
                .map(|name| name.to_ascii_lowercase()),
        );
        if let Some(strict) = options.strict_sections {
            self.section_policy = if strict {
                SectionPolicy::Strict
            } else {
                SectionPolicy::Lenient
            };
        }
        self
    }

    /// Register a caller component under `name`.
    #[must_use]
    pub fn with_component<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Value) -> Result<VNode> + Send + Sync + 'static,
    {
        self.registry
            .insert(name.to_string(), Component::new(name, f));
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Host + 'static) -> Self {
        self.host = Arc::new(host);
        self
    }

    #[must_use]
    pub fn with_section_policy(mut self, policy: SectionPolicy) -> Self {
        self.section_policy = policy;
        self
    }

    pub fn is_extern(&self, name: &str) -> bool {
        self.externs.contains(name)
    }

    pub fn is_self_closing(&self, name: &str) -> bool {
        self.self_closing_tags.contains(name)
    }

    pub fn is_boolean_attribute(&self, name: &str) -> bool {
        self.boolean_attributes.contains(&name.to_ascii_lowercase())
    }

    /// Canonical event prop name for an attribute, matched case-insensitively.
    pub fn synthetic_event(&self, name: &str) -> Option<&str> {
        self.synthetic_events
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether `name` is a canonical event prop name.
    pub fn is_event_prop(&self, name: &str) -> bool {
        self.synthetic_events.values().any(|v| v == name)
    }
}

fn owned_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| StacheError::Io {
        message: format!("{}: {e}", path.display()),
    })?;
    serde_json::from_str(&text).map_err(|e| StacheError::Json {
        message: format!("{}: {e}", path.display()),
    })
}

/// Load render overrides from a JSON options file.
pub fn load_options(path: &Path) -> Result<RenderOptions> {
    read_json(path)
}
