//! Widget values reported back by the renderer.

use serde::{Deserialize, Serialize};

/// The last value a user submitted for a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WidgetValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl WidgetValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WidgetValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            WidgetValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WidgetValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i64]> {
        match self {
            WidgetValue::IntArray(values) => Some(values),
            _ => None,
        }
    }

    /// Numeric array view; integer arrays are widened.
    pub fn to_float_array(&self) -> Option<Vec<f64>> {
        match self {
            WidgetValue::FloatArray(values) => Some(values.clone()),
            WidgetValue::IntArray(values) => Some(values.iter().map(|v| *v as f64).collect()),
            WidgetValue::Int(n) => Some(vec![*n as f64]),
            WidgetValue::Float(f) => Some(vec![*f]),
            _ => None,
        }
    }
}

/// A single widget's state as sent by the renderer between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetState {
    pub id: String,
    pub value: WidgetValue,
}
