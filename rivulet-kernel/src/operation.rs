//! Names of the operations a generator handle supports.
//!
//! Generator methods are plain Rust methods, so a call to an operation that
//! does not exist never compiles. This table is for callers that receive
//! operation names as strings (an interactive console, a script bridge) and
//! need the same friendly error a misspelled call would deserve.

use rivulet_api::Container;

use crate::error::DeltaError;
use crate::generator::DeltaGenerator;

/// Functions of the top-level `rv` namespace that are not handle methods.
///
/// `sidebar` is the [`Script`](crate::Script) field; the rest are its
/// methods in [`namespace`](crate::namespace).
const NAMESPACE_FUNCTIONS: &[&str] = &["write", "echo", "spinner", "sidebar"];

macro_rules! operations {
    ($($variant:ident => $name:literal,)+) => {
        /// Every operation a [`DeltaGenerator`] handle exposes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($variant,)+
        }

        impl Operation {
            pub const ALL: &'static [Operation] = &[$(Operation::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Operation::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Operation::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

operations! {
    Text => "text",
    Markdown => "markdown",
    Code => "code",
    Json => "json",
    Title => "title",
    Header => "header",
    Subheader => "subheader",
    Error => "error",
    Warning => "warning",
    Info => "info",
    Success => "success",
    Exception => "exception",
    Balloons => "balloons",
    Empty => "empty",
    Progress => "progress",
    Dataframe => "dataframe",
    Table => "table",
    LineChart => "line_chart",
    AreaChart => "area_chart",
    BarChart => "bar_chart",
    Chart => "chart",
    VegaLiteChart => "vega_lite_chart",
    Image => "image",
    Audio => "audio",
    Video => "video",
    Button => "button",
    Checkbox => "checkbox",
    Radio => "radio",
    Selectbox => "selectbox",
    Multiselect => "multiselect",
    Slider => "slider",
    TextInput => "text_input",
    TextArea => "text_area",
    TimeInput => "time_input",
    DateInput => "date_input",
    AddRows => "add_rows",
}

impl DeltaGenerator {
    /// Look up an operation by name on this handle.
    ///
    /// Names of top-level namespace functions get a hint pointing at the
    /// namespace; anything else is reported as not a command at all.
    pub fn resolve_operation(&self, name: &str) -> Result<Operation, DeltaError> {
        if let Some(op) = Operation::from_name(name) {
            return Ok(op);
        }

        if NAMESPACE_FUNCTIONS.contains(&name) {
            let handle = match self.container() {
                Container::Sidebar => "rv.sidebar",
                Container::Main => "DeltaGenerator",
            };
            return Err(DeltaError::MethodNotOnHandle {
                name: name.to_string(),
                handle,
            });
        }

        Err(DeltaError::InvalidCommand {
            name: name.to_string(),
        })
    }
}
