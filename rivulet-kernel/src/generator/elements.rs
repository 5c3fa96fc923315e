//! Element operations: text, data, charts and media.

use std::error::Error as _;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use rivulet_api::{
    DataFrame, Element, ExceptionInfo, Image, ImageData, ImageList, Media, Text, TextFormat,
    VegaLiteChart,
};
use serde::Serialize;

use super::DeltaGenerator;
use crate::chart::{Chart, ChartType};
use crate::error::DeltaError;

pub const DEFAULT_AUDIO_FORMAT: &str = "audio/wav";
pub const DEFAULT_VIDEO_FORMAT: &str = "video/mp4";

/// Completion passed to [`DeltaGenerator::progress`].
///
/// Integers are percentages, floats are fractions of one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressValue {
    Int(i64),
    Float(f64),
}

impl From<i32> for ProgressValue {
    fn from(n: i32) -> Self {
        ProgressValue::Int(n as i64)
    }
}

impl From<i64> for ProgressValue {
    fn from(n: i64) -> Self {
        ProgressValue::Int(n)
    }
}

impl From<u32> for ProgressValue {
    fn from(n: u32) -> Self {
        ProgressValue::Int(n as i64)
    }
}

impl From<f64> for ProgressValue {
    fn from(f: f64) -> Self {
        ProgressValue::Float(f)
    }
}

impl ProgressValue {
    fn to_percent(self) -> Result<u32, DeltaError> {
        match self {
            ProgressValue::Int(n) if (0..=100).contains(&n) => Ok(n as u32),
            ProgressValue::Int(n) => Err(DeltaError::validation(
                "value",
                format!("Progress Value has invalid value [0, 100]: {}", n),
            )),
            ProgressValue::Float(f) if (0.0..=1.0).contains(&f) => Ok((f * 100.0) as u32),
            ProgressValue::Float(f) => Err(DeltaError::validation(
                "value",
                format!("Progress Value has invalid value [0.0, 1.0]: {:.6}", f),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    /// Encoded image file bytes (PNG, JPEG, ...).
    Bytes(Vec<u8>),
}

impl ImageSource {
    fn into_data(self) -> ImageData {
        match self {
            ImageSource::Url(url) => ImageData::Url(url),
            ImageSource::Bytes(bytes) => ImageData::Base64(STANDARD.encode(bytes)),
        }
    }
}

/// Displayed width of an image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageWidth {
    #[default]
    Original,
    Column,
    Pixels(i32),
}

impl ImageWidth {
    fn to_wire(self) -> Result<i32, DeltaError> {
        match self {
            ImageWidth::Original => Ok(-1),
            ImageWidth::Column => Ok(-2),
            ImageWidth::Pixels(width) if width > 0 => Ok(width),
            ImageWidth::Pixels(_) => Err(DeltaError::validation(
                "width",
                "Image width must be positive.",
            )),
        }
    }
}

/// Remove common leading indentation and surrounding blank space.
///
/// Only the indentation every non-blank line shares character for character
/// is removed; a tab never matches spaces.
pub(crate) fn clean_text(body: &str) -> String {
    let margin = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start_matches([' ', '\t']).len()])
        .reduce(common_prefix)
        .unwrap_or("");

    body.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

fn text_element(body: &str, format: TextFormat) -> Element {
    Element::Text(Text {
        body: clean_text(body),
        format,
        allow_html: false,
    })
}

fn media(data: &[u8], format: &str) -> Media {
    Media {
        data: STANDARD.encode(data),
        format: format.to_string(),
    }
}

impl DeltaGenerator {
    /// Fixed-width text.
    pub fn text(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(body, TextFormat::Plain))
    }

    pub fn markdown(&mut self, body: &str, allow_html: bool) -> DeltaGenerator {
        self.new_element(Element::Text(Text {
            body: clean_text(body),
            format: TextFormat::Markdown,
            allow_html,
        }))
    }

    /// A fenced code block, rendered as markdown.
    pub fn code(&mut self, body: &str, language: &str) -> DeltaGenerator {
        let markdown = format!("```{}\n{}\n```", language, body);
        self.new_element(text_element(&markdown, TextFormat::Markdown))
    }

    /// Pretty-printed JSON of any serializable value.
    pub fn json<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<DeltaGenerator, DeltaError> {
        let raw = serde_json::to_string(body)?;
        Ok(self.json_str(&raw))
    }

    /// Pretty-printed JSON from an already serialized document.
    pub fn json_str(&mut self, raw: &str) -> DeltaGenerator {
        self.new_element(Element::Text(Text {
            body: raw.to_string(),
            format: TextFormat::Json,
            allow_html: false,
        }))
    }

    pub fn title(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(&format!("# {}", body), TextFormat::Markdown))
    }

    pub fn header(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(&format!("## {}", body), TextFormat::Markdown))
    }

    pub fn subheader(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(&format!("### {}", body), TextFormat::Markdown))
    }

    pub fn error(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(body, TextFormat::Error))
    }

    pub fn warning(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(body, TextFormat::Warning))
    }

    pub fn info(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(body, TextFormat::Info))
    }

    pub fn success(&mut self, body: &str) -> DeltaGenerator {
        self.new_element(text_element(body, TextFormat::Success))
    }

    /// Show an error raised by a generator call, with its source chain.
    pub fn exception(&mut self, err: &DeltaError) -> DeltaGenerator {
        let mut stack_trace = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            stack_trace.push(cause.to_string());
            source = cause.source();
        }
        self.text_exception(err.type_name(), &err.to_string(), stack_trace)
    }

    pub fn text_exception(
        &mut self,
        type_name: &str,
        message: &str,
        stack_trace: Vec<String>,
    ) -> DeltaGenerator {
        self.new_element(Element::Exception(ExceptionInfo {
            type_name: type_name.to_string(),
            message: message.to_string(),
            stack_trace,
        }))
    }

    pub fn balloons(&mut self) -> DeltaGenerator {
        self.new_element(Element::Balloons {
            execution_id: rand::random::<u32>(),
        })
    }

    /// A placeholder slot. Write through the returned handle to fill it.
    pub fn empty(&mut self) -> DeltaGenerator {
        self.new_element(Element::Empty)
    }

    pub fn progress(&mut self, value: impl Into<ProgressValue>) -> Result<DeltaGenerator, DeltaError> {
        let value = value.into().to_percent()?;
        Ok(self.new_element(Element::Progress { value }))
    }

    /// An interactive table. A given width or height is sent as the
    /// element's dimension spec.
    pub fn dataframe(
        &mut self,
        data: DataFrame,
        width: Option<u32>,
        height: Option<u32>,
    ) -> DeltaGenerator {
        let element = Element::DataFrame(data);
        if width.is_none() && height.is_none() {
            return self.new_element(element);
        }
        self.new_element_sized(element, width.unwrap_or(0), height.unwrap_or(0))
    }

    /// A static table.
    pub fn table(&mut self, data: DataFrame) -> DeltaGenerator {
        self.new_element(Element::Table(data))
    }

    pub fn line_chart(&mut self, data: DataFrame, width: u32, height: u32) -> DeltaGenerator {
        self.chart(Chart::new(data, ChartType::Line).with_size(width, height))
    }

    pub fn area_chart(&mut self, data: DataFrame, width: u32, height: u32) -> DeltaGenerator {
        self.chart(Chart::new(data, ChartType::Area).with_size(width, height))
    }

    pub fn bar_chart(&mut self, data: DataFrame, width: u32, height: u32) -> DeltaGenerator {
        self.chart(Chart::new(data, ChartType::Bar).with_size(width, height))
    }

    pub fn chart(&mut self, chart: Chart) -> DeltaGenerator {
        self.new_element(Element::Chart(chart.marshall()))
    }

    /// A chart described by a Vega-Lite spec.
    ///
    /// The spec is passed through as JSON; `data` becomes the chart's
    /// primary data.
    pub fn vega_lite_chart(
        &mut self,
        data: Option<DataFrame>,
        spec: &serde_json::Value,
        width: u32,
    ) -> Result<DeltaGenerator, DeltaError> {
        self.vega_lite_chart_with_datasets(data, IndexMap::new(), spec, width)
    }

    /// Like [`vega_lite_chart`](Self::vega_lite_chart), with named datasets
    /// that later `add_named_rows` calls can extend.
    pub fn vega_lite_chart_with_datasets(
        &mut self,
        data: Option<DataFrame>,
        datasets: IndexMap<String, DataFrame>,
        spec: &serde_json::Value,
        width: u32,
    ) -> Result<DeltaGenerator, DeltaError> {
        if !spec.is_object() {
            return Err(DeltaError::validation("spec", "must be a JSON object"));
        }
        Ok(self.new_element(Element::VegaLiteChart(VegaLiteChart {
            spec: serde_json::to_string(spec)?,
            data,
            datasets,
            width,
        })))
    }

    pub fn image(
        &mut self,
        source: ImageSource,
        caption: &str,
        width: ImageWidth,
    ) -> Result<DeltaGenerator, DeltaError> {
        self.images(vec![(source, caption.to_string())], width)
    }

    /// Several images in one element, each with its caption.
    pub fn images(
        &mut self,
        images: Vec<(ImageSource, String)>,
        width: ImageWidth,
    ) -> Result<DeltaGenerator, DeltaError> {
        let width = width.to_wire()?;
        let images = images
            .into_iter()
            .map(|(source, caption)| Image {
                data: source.into_data(),
                caption,
            })
            .collect();
        Ok(self.new_element(Element::Images(ImageList { images, width })))
    }

    pub fn audio(&mut self, data: &[u8], format: &str) -> DeltaGenerator {
        self.new_element(Element::Audio(media(data, format)))
    }

    pub fn video(&mut self, data: &[u8], format: &str) -> DeltaGenerator {
        self.new_element(Element::Video(media(data, format)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::error::ErrorKind;
    use rivulet_api::{Delta, ForwardMsg};

    fn element(msg: &ForwardMsg) -> &Element {
        msg.new_element().expect("new element delta")
    }

    fn text_of(msg: &ForwardMsg) -> &Text {
        match element(msg) {
            Element::Text(text) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn clean_text_dedents_and_trims() {
        let body = "
            first
              indented
            last
        ";
        assert_eq!(clean_text(body), "first\n  indented\nlast");
        assert_eq!(clean_text("  single  "), "single");
    }

    #[test]
    fn clean_text_only_strips_a_shared_prefix() {
        assert_eq!(clean_text("\tfoo\n    bar"), "foo\n    bar");
        assert_eq!(clean_text("\tfoo\n\t\tbar"), "foo\n\tbar");
        assert_eq!(clean_text("    a\n  \n    b"), "a\n\nb");
    }

    #[test]
    fn headings_are_markdown() {
        let fx = Fixture::new();
        let mut root = fx.root();
        root.title("Top");
        root.header("Mid");
        root.subheader("Low");

        let bodies: Vec<String> = fx.messages().iter().map(|m| text_of(m).body.clone()).collect();
        assert_eq!(bodies, ["# Top", "## Mid", "### Low"]);
        assert!(fx.messages().iter().all(|m| text_of(m).format == TextFormat::Markdown));
    }

    #[test]
    fn code_is_fenced() {
        let fx = Fixture::new();
        fx.root().code("let x = 1;", "rust");
        assert_eq!(text_of(&fx.last()).body, "```rust\nlet x = 1;\n```");
    }

    #[test]
    fn markdown_keeps_html_flag() {
        let fx = Fixture::new();
        fx.root().markdown("<b>hi</b>", true);
        let text = text_of(&fx.last()).clone();
        assert!(text.allow_html);
        assert_eq!(text.format, TextFormat::Markdown);
    }

    #[test]
    fn json_serializes_value() {
        let fx = Fixture::new();
        fx.root()
            .json(&serde_json::json!({"foo": "bar"}))
            .expect("json");
        let text = text_of(&fx.last()).clone();
        assert_eq!(text.format, TextFormat::Json);
        assert_eq!(text.body, r#"{"foo":"bar"}"#);
    }

    #[test]
    fn status_messages_use_their_format() {
        let fx = Fixture::new();
        let mut root = fx.root();
        root.error("e");
        root.warning("w");
        root.info("i");
        root.success("s");

        let formats: Vec<TextFormat> = fx.messages().iter().map(|m| text_of(m).format).collect();
        assert_eq!(
            formats,
            [TextFormat::Error, TextFormat::Warning, TextFormat::Info, TextFormat::Success]
        );
    }

    #[test]
    fn progress_accepts_percent_or_fraction() {
        let fx = Fixture::new();
        let mut root = fx.root();
        let mut bar = root.progress(0).expect("zero");
        bar.progress(0.5).expect("half");

        assert_eq!(element(&fx.last()), &Element::Progress { value: 50 });
        assert_eq!(fx.last().metadata.delta_id, 0);
    }

    #[test]
    fn progress_out_of_range_is_rejected() {
        let fx = Fixture::new();
        let mut root = fx.root();

        let err = root.progress(101).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("[0, 100]"));
        assert!(root.progress(1.5).is_err());
        assert!(fx.messages().is_empty());
        assert_eq!(root.delta_id(), 0);
    }

    #[test]
    fn dataframe_with_size_sets_dimension_spec() {
        let fx = Fixture::new();
        let mut root = fx.root();
        root.dataframe(DataFrame::new(["a"]), None, None);
        assert_eq!(fx.last().metadata.element_dimension_spec, None);

        root.dataframe(DataFrame::new(["a"]), Some(400), None);
        let spec = fx.last().metadata.element_dimension_spec.expect("spec");
        assert_eq!((spec.width, spec.height), (400, 0));
    }

    #[test]
    fn line_chart_rows_can_be_appended() {
        let fx = Fixture::new();
        let chart = fx
            .root()
            .line_chart(DataFrame::new(["a", "b"]).with_row([1, 2]), 0, 0);
        chart
            .add_rows(DataFrame::new(["a", "b"]).with_row([3, 4]))
            .expect("add rows");

        match element(&fx.messages()[0]) {
            Element::Chart(chart) => {
                assert_eq!(chart.chart_type, "LineChart");
                assert_eq!(chart.data.num_rows(), 1);
            }
            other => panic!("expected chart, got {other:?}"),
        }
        assert!(matches!(fx.last().as_delta(), Some(Delta::AddRows(_))));
    }

    #[test]
    fn vega_lite_spec_must_be_an_object() {
        let fx = Fixture::new();
        let mut root = fx.root();
        assert!(root.vega_lite_chart(None, &serde_json::json!([1, 2]), 0).is_err());

        let mut datasets = IndexMap::new();
        datasets.insert("points".to_string(), DataFrame::new(["x"]));
        root.vega_lite_chart_with_datasets(None, datasets, &serde_json::json!({"mark": "point"}), 0)
            .expect("chart");
        match element(&fx.last()) {
            Element::VegaLiteChart(chart) => {
                assert_eq!(chart.spec, r#"{"mark":"point"}"#);
                assert!(chart.datasets.contains_key("points"));
            }
            other => panic!("expected vega-lite chart, got {other:?}"),
        }
    }

    #[test]
    fn image_width_must_be_positive() {
        let fx = Fixture::new();
        let mut root = fx.root();
        let url = || ImageSource::Url("https://example.com/a.png".into());

        assert!(root.image(url(), "", ImageWidth::Pixels(0)).is_err());
        root.image(url(), "cap", ImageWidth::Column).expect("column width");
        match element(&fx.last()) {
            Element::Images(list) => {
                assert_eq!(list.width, -2);
                assert_eq!(list.images[0].caption, "cap");
            }
            other => panic!("expected images, got {other:?}"),
        }
    }

    #[test]
    fn image_bytes_are_base64() {
        let fx = Fixture::new();
        fx.root()
            .image(ImageSource::Bytes(vec![1, 2, 3]), "", ImageWidth::Original)
            .expect("image");
        match element(&fx.last()) {
            Element::Images(list) => {
                assert_eq!(list.width, -1);
                assert_eq!(list.images[0].data, ImageData::Base64("AQID".into()));
            }
            other => panic!("expected images, got {other:?}"),
        }
    }

    #[test]
    fn media_is_base64_with_format() {
        let fx = Fixture::new();
        fx.root().audio(b"abc", DEFAULT_AUDIO_FORMAT);
        match element(&fx.last()) {
            Element::Audio(media) => {
                assert_eq!(media.data, "YWJj");
                assert_eq!(media.format, "audio/wav");
            }
            other => panic!("expected audio, got {other:?}"),
        }
    }

    #[test]
    fn exception_shows_error_type_and_message() {
        let fx = Fixture::new();
        let err = DeltaError::MissingLabel { widget: "button" };
        fx.root().exception(&err);
        match element(&fx.last()) {
            Element::Exception(info) => {
                assert_eq!(info.type_name, "LabelError");
                assert_eq!(info.message, "button must have a label");
            }
            other => panic!("expected exception, got {other:?}"),
        }
    }

    #[test]
    fn empty_slot_can_be_filled_later() {
        let fx = Fixture::new();
        let mut root = fx.root();
        let mut slot = root.empty();
        root.text("below");
        slot.text("filled");

        let ids: Vec<u32> = fx.messages().iter().map(|m| m.metadata.delta_id).collect();
        assert_eq!(ids, [0, 1, 0]);
    }
}
