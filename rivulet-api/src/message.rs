//! Envelopes sent from the script host toward the renderer.

use serde::{Deserialize, Serialize};

use crate::{DataFrame, Element};

/// Top-level output region an element is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Container {
    #[default]
    Main,
    Sidebar,
}

/// Address of the block an element belongs to.
///
/// An empty `path` is the top-level stream of `container`. Each further
/// index addresses a nested block by its creation order inside its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPath {
    pub container: Container,
    pub path: Vec<u32>,
}

/// Requested pixel size of an element. Zero means "renderer default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementDimensionSpec {
    pub width: u32,
    pub height: u32,
}

/// Addressing information carried by every envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub parent_block: BlockPath,
    /// Position of the element within its `(container, path)` stream.
    pub delta_id: u32,
    pub element_dimension_spec: Option<ElementDimensionSpec>,
}

/// Key used to detect two deltas that target the same element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeltaKey {
    pub container: Container,
    pub path: Vec<u32>,
    pub delta_id: u32,
}

impl Metadata {
    pub fn delta_key(&self) -> DeltaKey {
        DeltaKey {
            container: self.parent_block.container,
            path: self.parent_block.path.clone(),
            delta_id: self.delta_id,
        }
    }
}

/// Rows appended to an already-created element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRows {
    pub data: DataFrame,
    /// Name of the dataset the rows belong to (empty when unnamed).
    pub name: String,
    pub has_name: bool,
}

impl AddRows {
    pub fn unnamed(data: DataFrame) -> Self {
        Self {
            data,
            name: String::new(),
            has_name: false,
        }
    }

    pub fn named(name: impl Into<String>, data: DataFrame) -> Self {
        Self {
            data,
            name: name.into(),
            has_name: true,
        }
    }

    /// The dataset name, if one was given.
    pub fn dataset_name(&self) -> Option<&str> {
        self.has_name.then_some(self.name.as_str())
    }
}

/// A UI mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Delta {
    NewElement(Element),
    NewBlock,
    AddRows(AddRows),
}

impl Delta {
    pub fn type_name(&self) -> &'static str {
        match self {
            Delta::NewElement(_) => "new_element",
            Delta::NewBlock => "new_block",
            Delta::AddRows(_) => "add_rows",
        }
    }
}

/// Sent once per session, before anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initialize {
    pub version: String,
    pub session_id: String,
}

/// Sent at the start of each script run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub id: String,
    pub name: String,
    pub command_line: String,
}

/// Body of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForwardMsgBody {
    Initialize(Initialize),
    NewReport(NewReport),
    Delta(Delta),
    /// The script run finished. Transient.
    ReportFinished,
    /// Progress of an export upload, in percent. Transient.
    UploadReportProgress(u32),
}

/// One protocol message toward the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardMsg {
    pub metadata: Metadata,
    pub body: ForwardMsgBody,
}

impl ForwardMsg {
    /// A control message with default metadata.
    pub fn control(body: ForwardMsgBody) -> Self {
        Self {
            metadata: Metadata::default(),
            body,
        }
    }

    pub fn delta(metadata: Metadata, delta: Delta) -> Self {
        Self {
            metadata,
            body: ForwardMsgBody::Delta(delta),
        }
    }

    pub fn as_delta(&self) -> Option<&Delta> {
        match &self.body {
            ForwardMsgBody::Delta(delta) => Some(delta),
            _ => None,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self.body, ForwardMsgBody::Delta(_))
    }

    /// The element carried by a `NewElement` delta.
    pub fn new_element(&self) -> Option<&Element> {
        match &self.body {
            ForwardMsgBody::Delta(Delta::NewElement(element)) => Some(element),
            _ => None,
        }
    }
}
