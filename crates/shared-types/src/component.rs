//! # Component Contract
//!
//! The renderable unit produced by loading a remote module or supplied
//! directly to a route. Rendering itself belongs to the host UI layer; this
//! crate only fixes the contract.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Something the navigation shell can mount.
pub trait Component: Send + Sync + fmt::Debug {
    /// Component name, used in logs.
    fn name(&self) -> &str;

    /// Render with the given props into host markup.
    fn render(&self, props: &Value) -> String;
}

/// Module object produced by invoking a container factory.
///
/// Mirrors the ES module shape: an optional default export plus named exports.
#[derive(Debug, Clone, Default)]
pub struct RemoteModule {
    name: String,
    default_export: Option<Arc<dyn Component>>,
    named_exports: BTreeMap<String, Arc<dyn Component>>,
}

impl RemoteModule {
    /// Empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_export: None,
            named_exports: BTreeMap::new(),
        }
    }

    /// Module whose default export is `component`.
    pub fn with_default(name: impl Into<String>, component: Arc<dyn Component>) -> Self {
        Self::new(name).default_export(component)
    }

    /// Set the default export.
    #[must_use]
    pub fn default_export(mut self, component: Arc<dyn Component>) -> Self {
        self.default_export = Some(component);
        self
    }

    /// Add a named export.
    #[must_use]
    pub fn export(mut self, name: impl Into<String>, component: Arc<dyn Component>) -> Self {
        self.named_exports.insert(name.into(), component);
        self
    }

    /// Look up a named export.
    #[must_use]
    pub fn get_export(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.named_exports.get(name).cloned()
    }

    /// True if the module follows the default-export convention.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default_export.is_some()
    }

    /// The default export, or the module object itself when there is none.
    #[must_use]
    pub fn into_component(self) -> Arc<dyn Component> {
        match self.default_export {
            Some(component) => component,
            None => Arc::new(self),
        }
    }
}

impl Component for RemoteModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, props: &Value) -> String {
        if let Some(default) = &self.default_export {
            return default.render(props);
        }
        self.named_exports
            .values()
            .map(|export| export.render(props))
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Label(&'static str);

    impl Component for Label {
        fn name(&self) -> &str {
            self.0
        }

        fn render(&self, _props: &Value) -> String {
            format!("<{}/>", self.0)
        }
    }

    #[test]
    fn test_default_export_wins() {
        let module = RemoteModule::with_default("cart", Arc::new(Label("Cart")))
            .export("Badge", Arc::new(Label("Badge")));

        let component = module.into_component();
        assert_eq!(component.name(), "Cart");
        assert_eq!(component.render(&Value::Null), "<Cart/>");
    }

    #[test]
    fn test_module_object_without_default() {
        let module = RemoteModule::new("widgets")
            .export("A", Arc::new(Label("A")))
            .export("B", Arc::new(Label("B")));
        assert!(!module.has_default());

        let component = module.into_component();
        assert_eq!(component.name(), "widgets");
        assert_eq!(component.render(&Value::Null), "<A/><B/>");
    }
}
