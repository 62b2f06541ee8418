//! Config trees - declarative element construction.
//!
//! A [`Config`] describes an element subtree as data; a
//! [`ConstructorRegistry`] maps each [`ElementKind`] discriminant to a
//! constructor function and instantiates the whole tree in one pass. The
//! kind set is a closed enum: a kind without a registered constructor is a
//! programming error and fails loudly at build time, not a runtime lookup
//! that limps along.

use std::collections::HashMap;

use crate::signal::Value;
use crate::types::Rgba;

use super::group::Group;
use super::widgets::{fill, label};
use super::Element;

/// Closed set of buildable element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Column,
    Row,
    Stack,
    Label,
    Fill,
}

/// A declarative description of one element and its children.
#[derive(Debug, Clone)]
pub struct Config {
    pub kind: ElementKind,
    /// Text content (labels).
    pub text: Option<String>,
    /// Paint color (labels, fills).
    pub color: Option<Rgba>,
    /// Child spacing (groups).
    pub gap: i32,
    pub children: Vec<Config>,
}

impl Config {
    /// Start a config of the given kind.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            text: None,
            color: None,
            gap: 0,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_gap(mut self, gap: i32) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_child(mut self, child: Config) -> Self {
        self.children.push(child);
        self
    }
}

/// Constructor for one element kind. Children are attached by the registry
/// afterwards; the constructor only builds the node itself.
pub type Constructor = fn(&Config) -> Element;

/// Maps element kinds to constructors, resolved once per tree build.
pub struct ConstructorRegistry {
    constructors: HashMap<ElementKind, Constructor>,
}

impl ConstructorRegistry {
    /// An empty registry (for hosts that build their own kind set).
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry with every built-in kind registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ElementKind::Column, |config| {
            Element::new(Group::column().with_gap(config.gap))
        });
        registry.register(ElementKind::Row, |config| {
            Element::new(Group::row().with_gap(config.gap))
        });
        registry.register(ElementKind::Stack, |_config| Element::new(Group::stack()));
        registry.register(ElementKind::Label, |config| {
            label(
                Value::constant(config.text.clone().unwrap_or_default()),
                Value::constant(config.color.unwrap_or(Rgba::WHITE)),
            )
        });
        registry.register(ElementKind::Fill, |config| {
            fill(Value::constant(config.color.unwrap_or(Rgba::BLACK)))
        });
        registry
    }

    /// Install (or replace) the constructor for a kind.
    pub fn register(&mut self, kind: ElementKind, constructor: Constructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Build the element tree described by `config`.
    ///
    /// # Panics
    ///
    /// Panics on a kind with no registered constructor - an unrecognized
    /// discriminant is a caller programming error, not bad user input.
    pub fn instantiate(&self, config: &Config) -> Element {
        let constructor = self
            .constructors
            .get(&config.kind)
            .unwrap_or_else(|| panic!("no constructor registered for {:?}", config.kind));
        let element = constructor(config);
        for child in &config.children {
            element.add_child(self.instantiate(child));
        }
        element
    }
}

impl Default for ConstructorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rect, Size};

    #[test]
    fn test_instantiate_builds_tree_shape() {
        let registry = ConstructorRegistry::with_defaults();
        let config = Config::new(ElementKind::Column)
            .with_gap(1)
            .with_child(Config::new(ElementKind::Label).with_text("hi"))
            .with_child(Config::new(ElementKind::Fill).with_color(Rgba::RED));
        let root = registry.instantiate(&config);
        assert_eq!(root.children().len(), 2);

        root.set_bounds(Rect::new(0, 0, 20, 10));
        root.validate();
        let children = root.children();
        assert_eq!(children[0].bounds(), Rect::new(0, 0, 20, 1));
        assert_eq!(children[1].bounds(), Rect::new(0, 2, 20, 0));
    }

    #[test]
    fn test_label_config_measures_text() {
        let registry = ConstructorRegistry::with_defaults();
        let config = Config::new(ElementKind::Label).with_text("abc");
        let element = registry.instantiate(&config);
        assert_eq!(element.preferred_size(Size::new(100, 100)), Size::new(3, 1));
    }

    #[test]
    #[should_panic(expected = "no constructor registered")]
    fn test_unregistered_kind_panics() {
        let registry = ConstructorRegistry::new();
        let config = Config::new(ElementKind::Label);
        let _ = registry.instantiate(&config);
    }
}
