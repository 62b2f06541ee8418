//! Style resolution - per kind/state visual properties with safe fallback.
//!
//! A [`StyleSheet`] maps `(kind, state)` pairs (e.g. `("button", "hover")`)
//! to [`Style`] entries. A missing entry is not an error: lookup falls back
//! to the default (empty) style and reports the miss once through the
//! `tracing` diagnostic channel, so a misspelled state renders as "nothing
//! special" instead of failing the frame.
//!
//! Sheets are installed on an element as a scope for its subtree
//! ([`Element::set_styles`](super::Element::set_styles)); lookup from a
//! detached element is a tree-contract violation and panics there.

use std::collections::HashMap;

use crate::types::Rgba;

/// Visual properties resolved for one kind/state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub foreground: Option<Rgba>,
    pub background: Option<Rgba>,
    pub border: Option<Rgba>,
}

impl Style {
    /// A style that sets nothing.
    pub const EMPTY: Self = Self {
        foreground: None,
        background: None,
        border: None,
    };

    /// Check whether the style sets nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// This style with `fallback` filling its unset fields.
    pub fn or(self, fallback: Style) -> Style {
        Style {
            foreground: self.foreground.or(fallback.foreground),
            background: self.background.or(fallback.background),
            border: self.border.or(fallback.border),
        }
    }
}

/// A `(kind, state)` keyed collection of styles.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    entries: HashMap<(String, String), Style>,
}

impl StyleSheet {
    /// Create an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the style for a kind/state pair.
    pub fn set(&mut self, kind: &str, state: &str, style: Style) {
        self.entries
            .insert((kind.to_string(), state.to_string()), style);
    }

    /// Check whether an entry exists.
    pub fn contains(&self, kind: &str, state: &str) -> bool {
        self.entries
            .contains_key(&(kind.to_string(), state.to_string()))
    }

    /// Resolve the style for a kind/state pair.
    ///
    /// Falls back to [`Style::EMPTY`] on a miss and reports it through the
    /// diagnostic channel; rendering proceeds with defaults.
    pub fn lookup(&self, kind: &str, state: &str) -> Style {
        match self
            .entries
            .get(&(kind.to_string(), state.to_string()))
        {
            Some(style) => *style,
            None => {
                tracing::warn!(kind, state, "missing style entry, using default");
                Style::EMPTY
            }
        }
    }

    /// Resolve a state style layered over the kind's base (`"normal"`)
    /// style.
    pub fn lookup_layered(&self, kind: &str, state: &str) -> Style {
        let base = match self.entries.get(&(kind.to_string(), "normal".to_string())) {
            Some(style) => *style,
            None => Style::EMPTY,
        };
        if state == "normal" {
            return base;
        }
        self.lookup(kind, state).or(base)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> StyleSheet {
        let mut sheet = StyleSheet::new();
        sheet.set(
            "button",
            "normal",
            Style {
                foreground: Some(Rgba::WHITE),
                background: Some(Rgba::BLUE),
                border: None,
            },
        );
        sheet.set(
            "button",
            "hover",
            Style {
                background: Some(Rgba::GREEN),
                ..Style::EMPTY
            },
        );
        sheet
    }

    #[test]
    fn test_lookup_hit() {
        let sheet = sheet();
        let style = sheet.lookup("button", "normal");
        assert_eq!(style.background, Some(Rgba::BLUE));
    }

    #[test]
    fn test_lookup_miss_falls_back_to_default() {
        let sheet = sheet();
        let style = sheet.lookup("button", "disabled");
        assert!(style.is_empty());
        // Unknown kinds fall back the same way.
        assert!(sheet.lookup("slider", "normal").is_empty());
    }

    #[test]
    fn test_lookup_layered_overrides_base() {
        let sheet = sheet();
        let hover = sheet.lookup_layered("button", "hover");
        // Hover overrides the background, inherits the foreground.
        assert_eq!(hover.background, Some(Rgba::GREEN));
        assert_eq!(hover.foreground, Some(Rgba::WHITE));
    }

    #[test]
    fn test_style_or_fills_unset_fields() {
        let over = Style {
            foreground: Some(Rgba::RED),
            ..Style::EMPTY
        };
        let base = Style {
            foreground: Some(Rgba::WHITE),
            background: Some(Rgba::BLACK),
            border: None,
        };
        let merged = over.or(base);
        assert_eq!(merged.foreground, Some(Rgba::RED));
        assert_eq!(merged.background, Some(Rgba::BLACK));
    }
}
