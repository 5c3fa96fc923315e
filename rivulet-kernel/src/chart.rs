//! Builder for native charts.
//!
//! Component and prop names are written in snake_case and converted to the
//! renderer's casing on marshalling:
//!
//! ```text
//! cartesian_grid  -> CartesianGrid
//! data_key        -> dataKey
//! ```
//!
//! Only the components in [`CHART_COMPONENTS`] are known, and only those
//! flagged as implemented can be added.

use rivulet_api::{ChartComponent, ChartProp, DataFrame};

use crate::error::DeltaError;

/// Column name the renderer uses for the data frame index.
const INDEX_COLUMN: &str = "(index)";

const SERIES_COLORS: &[&str] = &[
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#bbbb33", "#a65628", "#f781bf",
];

/// Every chart component the renderer knows, and whether it can be used.
pub const CHART_COMPONENTS: &[(&str, bool)] = &[
    // General
    ("ResponsiveContainer", false),
    ("Legend", true),
    ("Tooltip", true),
    ("Cell", false),
    ("Text", false),
    ("Label", false),
    ("LabelList", false),
    // Cartesian
    ("Area", true),
    ("Bar", true),
    ("Line", true),
    ("Scatter", true),
    ("XAxis", true),
    ("YAxis", true),
    ("ZAxis", true),
    ("Brush", true),
    ("CartesianAxis", true),
    ("CartesianGrid", true),
    ("ReferenceLine", true),
    ("ReferenceDot", true),
    ("ReferenceArea", true),
    ("ErrorBar", true),
    // Polar
    ("Pie", true),
    ("Radar", true),
    ("RadialBar", true),
    ("PolarAngleAxis", true),
    ("PolarGrid", true),
    ("PolarRadiusAxis", true),
    // Shapes
    ("Cross", false),
    ("Curve", false),
    ("Dot", false),
    ("Polygon", false),
    ("Rectangle", false),
    ("Sector", false),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Area,
    Bar,
    Line,
}

impl ChartType {
    pub fn snake_name(self) -> &'static str {
        match self {
            ChartType::Area => "area_chart",
            ChartType::Bar => "bar_chart",
            ChartType::Line => "line_chart",
        }
    }

    /// Component drawn once per data column.
    fn series_component(self) -> &'static str {
        match self {
            ChartType::Area => "area",
            ChartType::Bar => "bar",
            ChartType::Line => "line",
        }
    }

    fn series_props(self, column: &str, color: &str) -> Vec<(String, String)> {
        match self {
            ChartType::Line => owned([
                ("data_key", column),
                ("dot", "false"),
                ("stroke", color),
                ("type", "linear"),
                ("is_animation_active", "false"),
            ]),
            ChartType::Area => owned([
                ("data_key", column),
                ("fill", color),
                ("stroke", color),
                ("type", "linear"),
                ("is_animation_active", "false"),
            ]),
            ChartType::Bar => owned([
                ("data_key", column),
                ("fill", color),
                ("is_animation_active", "false"),
            ]),
        }
    }
}

/// Whether a snake_case component name is known and implemented.
fn lookup_component(name: &str) -> Option<bool> {
    CHART_COMPONENTS
        .iter()
        .find(|(component, _)| to_snake_case(component) == name)
        .map(|(_, implemented)| *implemented)
}

fn owned<I, K, V>(props: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    props
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
struct Component {
    name: String,
    props: Vec<(String, String)>,
}

/// A chart under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    data: DataFrame,
    chart_type: ChartType,
    width: u32,
    height: u32,
    components: Vec<Component>,
    props: Vec<(String, String)>,
}

impl Chart {
    pub fn new(data: DataFrame, chart_type: ChartType) -> Self {
        Self {
            data,
            chart_type,
            width: 0,
            height: 0,
            components: Vec::new(),
            props: Vec::new(),
        }
    }

    /// Requested size in pixels. Zero means the renderer's default.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set a prop on the chart itself.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.push((key.into(), value.into()));
        self
    }

    /// Add a component by its snake_case name.
    pub fn component<I, K, V>(mut self, name: &str, props: I) -> Result<Self, DeltaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        match lookup_component(name) {
            Some(true) => {
                self.push(name, owned(props));
                Ok(self)
            }
            Some(false) => Err(DeltaError::UnsupportedChartComponent(name.to_string())),
            None => Err(DeltaError::UnknownChartComponent(name.to_string())),
        }
    }

    pub fn legend(mut self) -> Self {
        self.push("legend", Vec::new());
        self
    }

    pub fn tooltip(mut self) -> Self {
        self.push("tooltip", Vec::new());
        self
    }

    pub fn x_axis(mut self, props: &[(&str, &str)]) -> Self {
        self.push("x_axis", owned(props.iter().copied()));
        self
    }

    pub fn y_axis(mut self, props: &[(&str, &str)]) -> Self {
        self.push("y_axis", owned(props.iter().copied()));
        self
    }

    pub fn cartesian_grid(mut self, props: &[(&str, &str)]) -> Self {
        self.push("cartesian_grid", owned(props.iter().copied()));
        self
    }

    pub fn line(mut self, props: &[(&str, &str)]) -> Self {
        self.push("line", owned(props.iter().copied()));
        self
    }

    pub fn area(mut self, props: &[(&str, &str)]) -> Self {
        self.push("area", owned(props.iter().copied()));
        self
    }

    pub fn bar(mut self, props: &[(&str, &str)]) -> Self {
        self.push("bar", owned(props.iter().copied()));
        self
    }

    fn push(&mut self, name: &str, props: Vec<(String, String)>) {
        self.components.push(Component {
            name: name.to_string(),
            props,
        });
    }

    /// Fill in required components and convert to the wire payload.
    pub fn marshall(mut self) -> rivulet_api::Chart {
        self.append_missing_components();

        rivulet_api::Chart {
            chart_type: to_upper_camel_case(self.chart_type.snake_name()),
            width: self.width,
            height: self.height,
            components: self
                .components
                .iter()
                .map(|component| ChartComponent {
                    component_type: to_upper_camel_case(&component.name),
                    props: wire_props(&component.props),
                })
                .collect(),
            props: wire_props(&self.props),
            data: self.data,
        }
    }

    /// Add every required component the caller did not specify.
    ///
    /// A required name is skipped entirely if any component with that name
    /// exists, so one explicit `line` suppresses all default series.
    fn append_missing_components(&mut self) {
        let required: [(&str, &[(&str, &str)]); 5] = [
            ("cartesian_grid", &[("stroke", "#E6E9EF")]),
            ("x_axis", &[("stroke", "#101620"), ("data_key", INDEX_COLUMN)]),
            ("y_axis", &[("stroke", "#101620")]),
            ("tooltip", &[]),
            ("legend", &[]),
        ];

        let has = |components: &[Component], name: &str| components.iter().any(|c| c.name == name);

        for (name, props) in required {
            if !has(&self.components, name) {
                self.push(name, owned(props.iter().copied()));
            }
        }

        let series = self.chart_type.series_component();
        if has(&self.components, series) {
            return;
        }
        let columns = self.data.columns.clone();
        for (index, column) in columns.iter().enumerate() {
            let color = SERIES_COLORS[index % SERIES_COLORS.len()];
            let props = self.chart_type.series_props(column, color);
            self.push(series, props);
        }
    }
}

fn wire_props(props: &[(String, String)]) -> Vec<ChartProp> {
    props
        .iter()
        .map(|(key, value)| ChartProp {
            key: to_lower_camel_case(key),
            value: value.clone(),
        })
        .collect()
}

pub(crate) fn to_upper_camel_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

pub(crate) fn to_lower_camel_case(snake: &str) -> String {
    let upper = to_upper_camel_case(snake);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn to_snake_case(camel: &str) -> String {
    let chars: Vec<char> = camel.chars().collect();
    let mut out = String::with_capacity(camel.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && !chars[i - 1].is_uppercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_columns() -> DataFrame {
        DataFrame::new(["a", "b", "c"]).with_row([1, 2, 3])
    }

    #[test]
    fn case_conversion() {
        assert_eq!(to_upper_camel_case("cartesian_grid"), "CartesianGrid");
        assert_eq!(to_upper_camel_case("line_chart"), "LineChart");
        assert_eq!(to_lower_camel_case("is_animation_active"), "isAnimationActive");
        assert_eq!(to_snake_case("XAxis"), "x_axis");
        assert_eq!(to_snake_case("PolarAngleAxis"), "polar_angle_axis");
        assert_eq!(to_snake_case("LabelList"), "label_list");
    }

    #[test]
    fn line_chart_gets_defaults_and_one_line_per_column() {
        let chart = Chart::new(three_columns(), ChartType::Line).marshall();

        assert_eq!(chart.chart_type, "LineChart");
        let names: Vec<&str> = chart
            .components
            .iter()
            .map(|c| c.component_type.as_str())
            .collect();
        assert_eq!(
            names,
            ["CartesianGrid", "XAxis", "YAxis", "Tooltip", "Legend", "Line", "Line", "Line"]
        );

        let x_axis = &chart.components[1];
        assert!(x_axis.props.contains(&ChartProp {
            key: "dataKey".into(),
            value: "(index)".into(),
        }));

        let second_line = &chart.components[6];
        assert_eq!(second_line.props[0].value, "b");
        assert_eq!(second_line.props[2].value, "#377eb8");
    }

    #[test]
    fn colors_cycle_past_the_palette() {
        let columns: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
        let chart = Chart::new(DataFrame::new(columns), ChartType::Bar).marshall();
        let bars: Vec<_> = chart
            .components
            .iter()
            .filter(|c| c.component_type == "Bar")
            .collect();
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[8].props[1].value, "#e41a1c");
    }

    #[test]
    fn explicit_components_are_not_duplicated() {
        let chart = Chart::new(three_columns(), ChartType::Area)
            .legend()
            .area(&[("data_key", "a")])
            .marshall();

        let count = |name: &str| {
            chart
                .components
                .iter()
                .filter(|c| c.component_type == name)
                .count()
        };
        assert_eq!(count("Legend"), 1);
        assert_eq!(count("Area"), 1);
        assert_eq!(count("CartesianGrid"), 1);
    }

    #[test]
    fn unimplemented_and_unknown_components_are_rejected() {
        let chart = Chart::new(three_columns(), ChartType::Line);

        let err = chart.clone().component("dot", [("r", "3")]).unwrap_err();
        assert!(matches!(err, DeltaError::UnsupportedChartComponent(name) if name == "dot"));

        let err = chart.clone().component("sparkle", Vec::<(String, String)>::new()).unwrap_err();
        assert!(matches!(err, DeltaError::UnknownChartComponent(_)));

        let chart = chart.component("reference_line", [("y", "2")]).expect("implemented");
        let wire = chart.marshall();
        assert!(wire.components.iter().any(|c| c.component_type == "ReferenceLine"));
    }

    #[test]
    fn chart_props_use_lower_camel_keys() {
        let chart = Chart::new(three_columns(), ChartType::Bar)
            .with_size(600, 300)
            .prop("bar_gap", "4")
            .marshall();
        assert_eq!(chart.width, 600);
        assert_eq!(chart.props[0].key, "barGap");
    }
}
