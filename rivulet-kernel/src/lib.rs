//! Rivulet Kernel - the session core between a script and its renderer.
//!
//! This crate contains:
//! - Delta generator (address allocation, element and widget operations)
//! - Report queues with same-address coalescing
//! - Session record and export to storage files
//! - Script runner, `rv` namespace helpers, and periodic delivery to the renderer

pub mod chart;
pub mod config;
pub mod context;
pub mod delivery;
pub mod generator;
pub mod namespace;
pub mod operation;
pub mod queue;
pub mod report;
pub mod runner;
pub mod widgets;

mod error;

pub use chart::{Chart, ChartType};
pub use config::ReportConfig;
pub use context::{DeltaMetrics, DeltaSink, SessionContext};
pub use delivery::spawn_delivery_loop;
pub use error::{DeltaError, ErrorKind};
pub use generator::{
    DeltaGenerator, ImageSource, ImageWidth, Number, ProgressValue, RowsArgs, SliderArgs,
    SliderValue,
};
pub use namespace::{DEFAULT_SPINNER_TEXT, Writable, WriteArg};
pub use operation::Operation;
pub use queue::ReportQueue;
pub use report::{Report, ReportFile};
pub use runner::{Script, ScriptRunner};
pub use widgets::{WidgetId, Widgets};
