//! Element payloads carried by `NewElement` deltas.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::DataFrame;

/// How a text body should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextFormat {
    #[default]
    Plain,
    Markdown,
    Json,
    Error,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Text {
    pub body: String,
    pub format: TextFormat,
    /// Whether HTML in a markdown body is passed through unescaped.
    pub allow_html: bool,
}

/// An error shown to the user in place of the element that failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: String,
    pub stack_trace: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartProp {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartComponent {
    /// UpperCamelCase component name, e.g. `CartesianGrid`.
    pub component_type: String,
    pub props: Vec<ChartProp>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chart {
    /// UpperCamelCase chart type, e.g. `LineChart`.
    pub chart_type: String,
    pub data: DataFrame,
    pub width: u32,
    pub height: u32,
    pub components: Vec<ChartComponent>,
    pub props: Vec<ChartProp>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VegaLiteChart {
    /// The chart spec as a JSON document, passed through untouched.
    pub spec: String,
    pub data: Option<DataFrame>,
    pub datasets: IndexMap<String, DataFrame>,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageData {
    Url(String),
    /// Base64-encoded bytes.
    Base64(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub data: ImageData,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageList {
    pub images: Vec<Image>,
    /// Pixel width; `-1` keeps the original size, `-2` uses the column width.
    pub width: i32,
}

/// Audio or video payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Base64-encoded bytes.
    pub data: String,
    /// MIME type.
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toggle {
    pub id: String,
    pub label: String,
    pub default: bool,
    pub value: bool,
}

/// Single choice out of `options` (radio buttons, select boxes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
    pub options: Vec<String>,
    pub default: u32,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChoice {
    pub id: String,
    pub label: String,
    pub options: Vec<String>,
    pub default: Vec<u32>,
    pub value: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    pub id: String,
    pub label: String,
    /// One value for a plain slider, two for a range.
    pub default: Vec<f64>,
    pub value: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Free-form input whose value travels as a string (text, time, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntry {
    pub id: String,
    pub label: String,
    pub default: String,
    pub value: String,
}

/// Everything a `NewElement` delta can carry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Element {
    /// Placeholder that reserves a slot and shows nothing.
    #[default]
    Empty,
    Text(Text),
    Exception(ExceptionInfo),
    Balloons { execution_id: u32 },
    Progress { value: u32 },
    DataFrame(DataFrame),
    Table(DataFrame),
    Chart(Chart),
    VegaLiteChart(VegaLiteChart),
    Images(ImageList),
    Audio(Media),
    Video(Media),
    Button(Toggle),
    Checkbox(Toggle),
    Radio(Choice),
    Selectbox(Choice),
    Multiselect(MultiChoice),
    Slider(Slider),
    TextInput(TextEntry),
    TextArea(TextEntry),
    TimeInput(TextEntry),
    DateInput(TextEntry),
}

impl Element {
    /// Short name of the element type, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Empty => "empty",
            Element::Text(_) => "text",
            Element::Exception(_) => "exception",
            Element::Balloons { .. } => "balloons",
            Element::Progress { .. } => "progress",
            Element::DataFrame(_) => "data_frame",
            Element::Table(_) => "table",
            Element::Chart(_) => "chart",
            Element::VegaLiteChart(_) => "vega_lite_chart",
            Element::Images(_) => "imgs",
            Element::Audio(_) => "audio",
            Element::Video(_) => "video",
            Element::Button(_) => "button",
            Element::Checkbox(_) => "checkbox",
            Element::Radio(_) => "radio",
            Element::Selectbox(_) => "selectbox",
            Element::Multiselect(_) => "multiselect",
            Element::Slider(_) => "slider",
            Element::TextInput(_) => "text_input",
            Element::TextArea(_) => "text_area",
            Element::TimeInput(_) => "time_input",
            Element::DateInput(_) => "date_input",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Element::Empty)
    }

    /// The widget id, for widget elements.
    pub fn widget_id(&self) -> Option<&str> {
        match self {
            Element::Button(w) | Element::Checkbox(w) => Some(&w.id),
            Element::Radio(w) | Element::Selectbox(w) => Some(&w.id),
            Element::Multiselect(w) => Some(&w.id),
            Element::Slider(w) => Some(&w.id),
            Element::TextInput(w)
            | Element::TextArea(w)
            | Element::TimeInput(w)
            | Element::DateInput(w) => Some(&w.id),
            _ => None,
        }
    }

    /// The data frame that appended rows with the given dataset name land in.
    ///
    /// Unnamed rows go to the element's primary data. Named rows only match
    /// a named dataset of a vega-lite chart.
    pub fn data_frame_mut(&mut self, name: Option<&str>) -> Option<&mut DataFrame> {
        match (self, name) {
            (Element::DataFrame(df) | Element::Table(df), None) => Some(df),
            (Element::Chart(chart), None) => Some(&mut chart.data),
            (Element::VegaLiteChart(chart), None) => {
                Some(chart.data.get_or_insert_with(DataFrame::default))
            }
            (Element::VegaLiteChart(chart), Some(name)) => chart.datasets.get_mut(name),
            _ => None,
        }
    }
}
