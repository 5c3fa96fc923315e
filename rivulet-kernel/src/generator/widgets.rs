//! Widget operations.
//!
//! Every widget resolves its value the same way: the value the renderer
//! last reported for the widget's id wins, otherwise the caller's default.
//! Both are marshalled so a client that connects late still sees the
//! current state. The resolved value is returned to the script.

use std::fmt;

use chrono::{Local, NaiveDate, NaiveTime};
use rivulet_api::{Choice, Element, MultiChoice, Slider, TextEntry, Toggle};

use super::DeltaGenerator;
use crate::error::DeltaError;
use crate::widgets::WidgetId;

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y/%m/%d";

/// A slider bound, step or position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Number::Int(_) => "int",
            Number::Float(_) => "float",
        }
    }

    fn is_int(self) -> bool {
        matches!(self, Number::Int(_))
    }

    fn from_f64(value: f64, int: bool) -> Self {
        if int {
            Number::Int(value as i64)
        } else {
            Number::Float(value)
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::Int(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

/// A slider's position: one handle or a range of two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderValue {
    Single(Number),
    Range(Number, Number),
}

impl SliderValue {
    fn numbers(self) -> Vec<Number> {
        match self {
            SliderValue::Single(n) => vec![n],
            SliderValue::Range(start, end) => vec![start, end],
        }
    }

    fn type_name(self) -> String {
        match self {
            SliderValue::Single(n) => n.type_name().to_string(),
            SliderValue::Range(start, end) => format!("({}, {})", start.type_name(), end.type_name()),
        }
    }
}

impl From<Number> for SliderValue {
    fn from(value: Number) -> Self {
        SliderValue::Single(value)
    }
}

impl From<i32> for SliderValue {
    fn from(n: i32) -> Self {
        SliderValue::Single(n.into())
    }
}

impl From<i64> for SliderValue {
    fn from(n: i64) -> Self {
        SliderValue::Single(n.into())
    }
}

impl From<f64> for SliderValue {
    fn from(f: f64) -> Self {
        SliderValue::Single(f.into())
    }
}

/// Optional arguments of [`DeltaGenerator::slider`].
///
/// Unset bounds default to `0..=100` step `1` for integer sliders and
/// `0.0..=1.0` step `0.01` for float sliders. An unset value defaults to
/// the minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct SliderArgs {
    pub value: Option<SliderValue>,
    pub min: Option<Number>,
    pub max: Option<Number>,
    pub step: Option<Number>,
}

impl SliderArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, value: impl Into<SliderValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn range(mut self, start: impl Into<Number>, end: impl Into<Number>) -> Self {
        self.value = Some(SliderValue::Range(start.into(), end.into()));
        self
    }

    pub fn min(mut self, min: impl Into<Number>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<Number>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn step(mut self, step: impl Into<Number>) -> Self {
        self.step = Some(step.into());
        self
    }
}

/// Slider arguments after defaults and type checks.
struct ResolvedSlider {
    value: SliderValue,
    min: Number,
    max: Number,
    step: Number,
    int: bool,
}

impl SliderArgs {
    fn resolve(self) -> Result<ResolvedSlider, DeltaError> {
        let value = self
            .value
            .unwrap_or_else(|| SliderValue::Single(self.min.unwrap_or(Number::Int(0))));

        let numbers = value.numbers();
        let int = numbers.iter().all(|n| n.is_int());
        let float = numbers.iter().all(|n| !n.is_int());
        if !int && !float {
            return Err(DeltaError::TypeMismatch(
                "Tuple/list components must be of the same type.".to_string(),
            ));
        }

        let min = self.min.unwrap_or(if int { Number::Int(0) } else { Number::Float(0.0) });
        let max = self
            .max
            .unwrap_or(if int { Number::Int(100) } else { Number::Float(1.0) });
        let step = self
            .step
            .unwrap_or(if int { Number::Int(1) } else { Number::Float(0.01) });

        if [min, max, step].iter().any(|n| n.is_int() != int) {
            return Err(DeltaError::TypeMismatch(format!(
                "Both value and arguments must be of the same type.\n\
                 `value` has {} type.\n\
                 `min_value` has {} type.\n\
                 `max_value` has {} type.\n\
                 `step` has {} type.",
                value.type_name(),
                min.type_name(),
                max.type_name(),
                step.type_name(),
            )));
        }

        let (lo, hi) = (min.as_f64(), max.as_f64());
        match value {
            SliderValue::Single(v) if !(lo <= v.as_f64() && v.as_f64() <= hi) => {
                return Err(DeltaError::validation(
                    "value",
                    format!(
                        "The default `value` of {} must lie between the `min_value` of {} \
                         and the `max_value` of {}, inclusively.",
                        v, min, max
                    ),
                ));
            }
            SliderValue::Range(start, end)
                if !(lo <= start.as_f64() && start.as_f64() <= end.as_f64() && end.as_f64() <= hi) =>
            {
                return Err(DeltaError::validation(
                    "value",
                    format!(
                        "The range ({}, {}) must lie between the `min_value` of {} \
                         and the `max_value` of {}, inclusively.",
                        start, end, min, max
                    ),
                ));
            }
            _ => {}
        }

        Ok(ResolvedSlider {
            value,
            min,
            max,
            step,
            int,
        })
    }
}

fn check_index(widget: &str, index: usize, len: usize) -> Result<(), DeltaError> {
    if len > 0 && index >= len {
        return Err(DeltaError::validation(
            "index",
            format!("{} index must be between 0 and length of options", widget),
        ));
    }
    Ok(())
}

fn labels<T: fmt::Display>(options: &[T]) -> Vec<String> {
    options.iter().map(ToString::to_string).collect()
}

impl DeltaGenerator {
    /// Whether the button was clicked on the last run.
    pub fn button(&mut self, label: &str) -> Result<bool, DeltaError> {
        let id = WidgetId::for_widget("button", label)?;
        let clicked = self
            .widget_value(&id)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        self.new_element(Element::Button(Toggle {
            id: id.to_string(),
            label: label.to_string(),
            default: false,
            value: false,
        }));
        Ok(clicked)
    }

    pub fn checkbox(&mut self, label: &str, default: bool) -> Result<bool, DeltaError> {
        let id = WidgetId::for_widget("checkbox", label)?;
        let value = self
            .widget_value(&id)
            .and_then(|v| v.as_bool())
            .unwrap_or(default);

        self.new_element(Element::Checkbox(Toggle {
            id: id.to_string(),
            label: label.to_string(),
            default,
            value,
        }));
        Ok(value)
    }

    /// The selected option, or `None` when there is nothing to select.
    pub fn radio<T: fmt::Display + Clone>(
        &mut self,
        label: &str,
        options: &[T],
        index: usize,
    ) -> Result<Option<T>, DeltaError> {
        let (choice, selected) = self.choice("radio", "Radio", label, options, index)?;
        self.new_element(Element::Radio(choice));
        Ok(selected)
    }

    /// The selected option, or `None` when there is nothing to select.
    pub fn selectbox<T: fmt::Display + Clone>(
        &mut self,
        label: &str,
        options: &[T],
        index: usize,
    ) -> Result<Option<T>, DeltaError> {
        let (choice, selected) = self.choice("selectbox", "Selectbox", label, options, index)?;
        self.new_element(Element::Selectbox(choice));
        Ok(selected)
    }

    fn choice<T: fmt::Display + Clone>(
        &self,
        kind: &'static str,
        display: &str,
        label: &str,
        options: &[T],
        index: usize,
    ) -> Result<(Choice, Option<T>), DeltaError> {
        let id = WidgetId::for_widget(kind, label)?;
        check_index(display, index, options.len())?;

        let current = match self.widget_value(&id).and_then(|v| v.as_int()) {
            Some(stored) => usize::try_from(stored).ok(),
            None => Some(index),
        };
        let selected = current.and_then(|i| options.get(i)).cloned();

        let choice = Choice {
            id: id.to_string(),
            label: label.to_string(),
            options: labels(options),
            default: index as u32,
            value: current.unwrap_or(index) as u32,
        };
        Ok((choice, selected))
    }

    /// The selected options, in option order of the stored selection.
    pub fn multiselect<T: fmt::Display + Clone>(
        &mut self,
        label: &str,
        options: &[T],
        default: &[usize],
    ) -> Result<Vec<T>, DeltaError> {
        let id = WidgetId::for_widget("multiselect", label)?;
        if let Some(bad) = default.iter().find(|&&i| i >= options.len()) {
            return Err(DeltaError::validation(
                "default",
                format!(
                    "index {} is out of range for {} options",
                    bad,
                    options.len()
                ),
            ));
        }

        let current: Vec<usize> = match self.widget_value(&id) {
            Some(stored) => stored
                .as_int_array()
                .unwrap_or_default()
                .iter()
                .filter_map(|&i| usize::try_from(i).ok())
                .filter(|&i| i < options.len())
                .collect(),
            None => default.to_vec(),
        };

        self.new_element(Element::Multiselect(MultiChoice {
            id: id.to_string(),
            label: label.to_string(),
            options: labels(options),
            default: default.iter().map(|&i| i as u32).collect(),
            value: current.iter().map(|&i| i as u32).collect(),
        }));
        Ok(current.into_iter().map(|i| options[i].clone()).collect())
    }

    /// A numeric slider over a single value or a range.
    ///
    /// The returned value has the same shape and number type as the
    /// default.
    pub fn slider(&mut self, label: &str, args: SliderArgs) -> Result<SliderValue, DeltaError> {
        let id = WidgetId::for_widget("slider", label)?;
        let resolved = args.resolve()?;

        let default: Vec<f64> = resolved.value.numbers().iter().map(|n| n.as_f64()).collect();
        let current = self
            .widget_value(&id)
            .and_then(|v| v.to_float_array())
            .filter(|stored| stored.len() == default.len())
            .unwrap_or_else(|| default.clone());

        let value = match current.as_slice() {
            [start, end] => SliderValue::Range(
                Number::from_f64(*start, resolved.int),
                Number::from_f64(*end, resolved.int),
            ),
            [single] => SliderValue::Single(Number::from_f64(*single, resolved.int)),
            _ => resolved.value,
        };

        self.new_element(Element::Slider(Slider {
            id: id.to_string(),
            label: label.to_string(),
            default,
            value: current,
            min: resolved.min.as_f64(),
            max: resolved.max.as_f64(),
            step: resolved.step.as_f64(),
        }));
        Ok(value)
    }

    pub fn text_input(&mut self, label: &str, default: &str) -> Result<String, DeltaError> {
        let (entry, value) = self.text_entry("text_input", label, default.to_string())?;
        self.new_element(Element::TextInput(entry));
        Ok(value)
    }

    pub fn text_area(&mut self, label: &str, default: &str) -> Result<String, DeltaError> {
        let (entry, value) = self.text_entry("text_area", label, default.to_string())?;
        self.new_element(Element::TextArea(entry));
        Ok(value)
    }

    /// A time picker. Defaults to the current local time.
    pub fn time_input(
        &mut self,
        label: &str,
        default: Option<NaiveTime>,
    ) -> Result<NaiveTime, DeltaError> {
        let id = WidgetId::for_widget("time_input", label)?;
        let default = default.unwrap_or_else(|| Local::now().time());
        let value = match self.widget_value(&id).as_ref().and_then(|v| v.as_str()) {
            Some(raw) => NaiveTime::parse_from_str(raw, TIME_FORMAT).unwrap_or_else(|err| {
                tracing::warn!(%err, raw, "ignoring unparseable time_input value");
                default
            }),
            None => default,
        };

        self.new_element(Element::TimeInput(TextEntry {
            id: id.to_string(),
            label: label.to_string(),
            default: default.format(TIME_FORMAT).to_string(),
            value: value.format(TIME_FORMAT).to_string(),
        }));
        Ok(value)
    }

    /// A date picker. Defaults to today.
    pub fn date_input(
        &mut self,
        label: &str,
        default: Option<NaiveDate>,
    ) -> Result<NaiveDate, DeltaError> {
        let id = WidgetId::for_widget("date_input", label)?;
        let default = default.unwrap_or_else(|| Local::now().date_naive());
        let value = match self.widget_value(&id).as_ref().and_then(|v| v.as_str()) {
            Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap_or_else(|err| {
                tracing::warn!(%err, raw, "ignoring unparseable date_input value");
                default
            }),
            None => default,
        };

        self.new_element(Element::DateInput(TextEntry {
            id: id.to_string(),
            label: label.to_string(),
            default: default.format(DATE_FORMAT).to_string(),
            value: value.format(DATE_FORMAT).to_string(),
        }));
        Ok(value)
    }

    fn text_entry(
        &self,
        kind: &'static str,
        label: &str,
        default: String,
    ) -> Result<(TextEntry, String), DeltaError> {
        let id = WidgetId::for_widget(kind, label)?;
        let value = self
            .widget_value(&id)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| default.clone());

        let entry = TextEntry {
            id: id.to_string(),
            label: label.to_string(),
            default,
            value: value.clone(),
        };
        Ok((entry, value))
    }
}
