//! Widget identity and the store of values submitted by the renderer.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use rivulet_api::{WidgetState, WidgetValue};

use crate::error::DeltaError;

/// Stable identity of a widget across script runs.
///
/// Derived from the widget kind and its label, so the same call on the
/// next run finds the value the user left it at, and two widgets of
/// different kinds may share a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(kind: &str, label: &str) -> Self {
        WidgetId(format!("{}-{}", kind, label))
    }

    /// Like [`WidgetId::new`], rejecting a blank label.
    pub fn for_widget(kind: &'static str, label: &str) -> Result<Self, DeltaError> {
        if label.trim().is_empty() {
            return Err(DeltaError::MissingLabel { widget: kind });
        }
        Ok(Self::new(kind, label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last known value of every widget in a session.
///
/// Updated between runs from renderer input; only read while a script runs.
#[derive(Debug, Default)]
pub struct Widgets {
    states: RwLock<HashMap<String, WidgetValue>>,
}

impl Widgets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &WidgetId) -> Option<WidgetValue> {
        let states = self.states.read().unwrap_or_else(|p| p.into_inner());
        states.get(id.as_str()).cloned()
    }

    pub fn set_state(&self, id: &WidgetId, value: WidgetValue) {
        let mut states = self.states.write().unwrap_or_else(|p| p.into_inner());
        states.insert(id.as_str().to_string(), value);
    }

    /// Replace every stored value with the renderer's latest snapshot.
    pub fn set_states(&self, snapshot: impl IntoIterator<Item = WidgetState>) {
        let mut states = self.states.write().unwrap_or_else(|p| p.into_inner());
        states.clear();
        states.extend(snapshot.into_iter().map(|state| (state.id, state.value)));
    }

    pub fn len(&self) -> usize {
        self.states.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_depends_on_kind_and_label() {
        assert_eq!(WidgetId::new("button", "Go"), WidgetId::new("button", "Go"));
        assert_ne!(WidgetId::new("button", "Go"), WidgetId::new("checkbox", "Go"));
        assert_eq!(WidgetId::new("button", "Go").as_str(), "button-Go");
    }

    #[test]
    fn blank_label_is_rejected() {
        let err = WidgetId::for_widget("slider", "  ").expect_err("blank label");
        assert!(matches!(err, DeltaError::MissingLabel { widget: "slider" }));
    }

    #[test]
    fn snapshot_replaces_previous_values() {
        let widgets = Widgets::new();
        let go = WidgetId::new("button", "Go");
        widgets.set_state(&go, WidgetValue::Bool(true));

        widgets.set_states([WidgetState {
            id: "checkbox-x".into(),
            value: WidgetValue::Bool(false),
        }]);

        assert_eq!(widgets.get(&go), None);
        assert_eq!(
            widgets.get(&WidgetId::new("checkbox", "x")),
            Some(WidgetValue::Bool(false))
        );
        assert_eq!(widgets.len(), 1);
    }
}
