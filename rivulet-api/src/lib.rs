//! Rivulet API - Wire types shared by the script host and the renderer.

mod element;
mod manifest;
mod message;
mod value;
mod widget;

pub use element::*;
pub use manifest::*;
pub use message::*;
pub use value::*;
pub use widget::*;
