//! Delta generator: allocates addresses for new elements and blocks.
//!
//! A handle is either a *root* that hands out a fresh `delta_id` for every
//! element it creates, or a *leaf* pinned to the single element it was
//! returned for. Writing through a leaf replaces that element in place:
//!
//! ```text
//! let mut slot = main.empty();   // root allocates id 0, returns leaf @0
//! slot.text("loading");          // NewElement @0
//! slot.text("done");             // NewElement @0 again
//! main.text("after");            // root allocates id 1
//! ```
//!
//! A generator without a session context is a *null* handle: every
//! operation returns what it would normally return and enqueues nothing.

mod elements;
mod widgets;

pub use elements::{
    DEFAULT_AUDIO_FORMAT, DEFAULT_VIDEO_FORMAT, ImageSource, ImageWidth, ProgressValue,
};
pub use widgets::{Number, SliderArgs, SliderValue};

use std::fmt;
use std::sync::Arc;

use rivulet_api::{
    AddRows, BlockPath, Container, DataFrame, Delta, Element, ElementDimensionSpec, ForwardMsg,
    Metadata, WidgetValue,
};

use crate::context::SessionContext;
use crate::error::DeltaError;
use crate::widgets::WidgetId;

/// Datasets passed to an `add_rows` call.
///
/// Exactly one dataset must be given, either positionally or by name.
#[derive(Debug, Clone, Default)]
pub struct RowsArgs {
    pub data: Option<DataFrame>,
    pub named: Vec<(String, DataFrame)>,
}

impl RowsArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: DataFrame) -> Self {
        self.data = Some(data);
        self
    }

    pub fn named(mut self, name: impl Into<String>, data: DataFrame) -> Self {
        self.named.push((name.into(), data));
        self
    }

    fn into_add_rows(self) -> Result<AddRows, DeltaError> {
        let given = usize::from(self.data.is_some()) + self.named.len();
        if given != 1 {
            return Err(DeltaError::Arity(format!(
                "expected exactly one dataset, got {}",
                given
            )));
        }

        match (self.data, self.named.into_iter().next()) {
            (Some(data), None) => Ok(AddRows::unnamed(data)),
            (None, Some((name, data))) => Ok(AddRows::named(name, data)),
            _ => Err(DeltaError::Arity("expected exactly one dataset".to_string())),
        }
    }
}

/// Handle that turns element requests into addressed deltas.
#[derive(Clone)]
pub struct DeltaGenerator {
    ctx: Option<Arc<SessionContext>>,
    /// Next id to allocate on a root, the pinned id on a leaf.
    id: u32,
    is_root: bool,
    container: Container,
    path: Vec<u32>,
}

impl fmt::Debug for DeltaGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaGenerator")
            .field("id", &self.id)
            .field("is_root", &self.is_root)
            .field("container", &self.container)
            .field("path", &self.path)
            .field("null", &self.ctx.is_none())
            .finish()
    }
}

impl DeltaGenerator {
    /// A top-level root writing into `container`.
    pub fn new(ctx: Arc<SessionContext>, container: Container) -> Self {
        Self {
            ctx: Some(ctx),
            id: 0,
            is_root: true,
            container,
            path: Vec::new(),
        }
    }

    /// A top-level root that enqueues nothing.
    pub fn null() -> Self {
        Self::null_in(Container::Main)
    }

    pub fn null_in(container: Container) -> Self {
        Self {
            ctx: None,
            id: 0,
            is_root: true,
            container,
            path: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.ctx.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// The next id a root will allocate, or the id a leaf is pinned to.
    pub fn delta_id(&self) -> u32 {
        self.id
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn path(&self) -> &[u32] {
        &self.path
    }

    pub fn parent_block(&self) -> BlockPath {
        BlockPath {
            container: self.container,
            path: self.path.clone(),
        }
    }

    fn metadata(&self, dimensions: Option<ElementDimensionSpec>) -> Metadata {
        Metadata {
            parent_block: self.parent_block(),
            delta_id: self.id,
            element_dimension_spec: dimensions,
        }
    }

    /// Stored value for a widget, if the renderer has reported one.
    pub(crate) fn widget_value(&self, id: &WidgetId) -> Option<WidgetValue> {
        self.ctx.as_ref().and_then(|ctx| ctx.widgets().get(id))
    }

    /// Enqueue an element at this handle's address.
    ///
    /// On a root the returned handle is a leaf pinned to the id just used
    /// and the root moves on to the next id. A leaf returns itself.
    pub fn new_element(&mut self, element: Element) -> DeltaGenerator {
        self.enqueue_element(element, None)
    }

    /// Like [`new_element`](Self::new_element), with a requested pixel size.
    pub fn new_element_sized(&mut self, element: Element, width: u32, height: u32) -> DeltaGenerator {
        self.enqueue_element(element, Some(ElementDimensionSpec { width, height }))
    }

    fn enqueue_element(
        &mut self,
        element: Element,
        dimensions: Option<ElementDimensionSpec>,
    ) -> DeltaGenerator {
        let Some(ctx) = self.ctx.clone() else {
            return self.clone();
        };

        let kind = element.kind();
        let msg = ForwardMsg::delta(self.metadata(dimensions), Delta::NewElement(element));
        if !ctx.enqueue(msg) {
            tracing::warn!(kind, delta_id = self.id, "element was not enqueued");
            return self.clone();
        }
        ctx.metrics().record(kind);

        if !self.is_root {
            return self.clone();
        }

        let leaf = DeltaGenerator {
            ctx: Some(ctx),
            id: self.id,
            is_root: false,
            container: self.container,
            path: self.path.clone(),
        };
        self.id += 1;
        leaf
    }

    /// Open a nested block and return a root for it.
    pub fn new_block(&mut self) -> Result<DeltaGenerator, DeltaError> {
        if !self.is_root {
            return Err(DeltaError::Usage(
                "new_block() can only be called on a root generator".to_string(),
            ));
        }
        let Some(ctx) = self.ctx.clone() else {
            return Ok(self.clone());
        };

        // A refused block still claims its address.
        if ctx.enqueue(ForwardMsg::delta(self.metadata(None), Delta::NewBlock)) {
            ctx.metrics().record("block");
        } else {
            tracing::warn!(delta_id = self.id, "block was not enqueued");
        }

        let mut path = self.path.clone();
        path.push(self.id);
        self.id += 1;

        Ok(DeltaGenerator {
            ctx: Some(ctx),
            id: 0,
            is_root: true,
            container: self.container,
            path,
        })
    }

    /// Append rows to the element this handle is pinned to.
    pub fn add_rows(&self, data: DataFrame) -> Result<DeltaGenerator, DeltaError> {
        self.add_rows_with(RowsArgs::new().data(data))
    }

    /// Append rows to a named dataset of this handle's element.
    pub fn add_named_rows(
        &self,
        name: impl Into<String>,
        data: DataFrame,
    ) -> Result<DeltaGenerator, DeltaError> {
        self.add_rows_with(RowsArgs::new().named(name, data))
    }

    pub fn add_rows_with(&self, args: RowsArgs) -> Result<DeltaGenerator, DeltaError> {
        let Some(ctx) = self.ctx.as_ref() else {
            return Ok(self.clone());
        };
        if self.is_root {
            return Err(DeltaError::Usage(
                "only existing elements can add_rows(); create an element first".to_string(),
            ));
        }

        let rows = args.into_add_rows()?;
        if !ctx.enqueue(ForwardMsg::delta(self.metadata(None), Delta::AddRows(rows))) {
            tracing::warn!(delta_id = self.id, "rows were not enqueued");
        }
        Ok(self.clone())
    }

    /// Rewind a top-level root to id 0 before a script re-runs.
    pub fn reset(&mut self) -> Result<(), DeltaError> {
        if !self.is_root || !self.path.is_empty() {
            return Err(DeltaError::Usage(
                "reset() can only be called on a top-level root generator".to_string(),
            ));
        }
        self.id = 0;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use rivulet_api::{Container, ForwardMsg};

    use super::DeltaGenerator;
    use crate::context::{DeltaSink, SessionContext};
    use crate::widgets::Widgets;

    /// Sink that records every message, optionally refusing some of them.
    #[derive(Default)]
    pub struct RecordingSink {
        pub messages: Mutex<Vec<ForwardMsg>>,
        /// Refuse every message.
        pub refuse: bool,
        /// Refuse only the message at this zero-based attempt.
        pub refuse_nth: Option<usize>,
        pub attempts: AtomicUsize,
    }

    impl DeltaSink for RecordingSink {
        fn enqueue(&self, msg: ForwardMsg) -> bool {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.refuse || self.refuse_nth == Some(attempt) {
                return false;
            }
            self.messages.lock().unwrap().push(msg);
            true
        }
    }

    pub struct Fixture {
        pub sink: Arc<RecordingSink>,
        pub widgets: Arc<Widgets>,
        pub ctx: Arc<SessionContext>,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self::with_sink(RecordingSink::default())
        }

        pub fn with_sink(sink: RecordingSink) -> Self {
            let sink = Arc::new(sink);
            let widgets = Arc::new(Widgets::new());
            let ctx = SessionContext::new(sink.clone(), widgets.clone());
            Self { sink, widgets, ctx }
        }

        pub fn root(&self) -> DeltaGenerator {
            DeltaGenerator::new(self.ctx.clone(), Container::Main)
        }

        pub fn messages(&self) -> Vec<ForwardMsg> {
            self.sink.messages.lock().unwrap().clone()
        }

        pub fn last(&self) -> ForwardMsg {
            self.messages().pop().expect("no message enqueued")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{Fixture, RecordingSink};
    use super::*;
    use crate::error::ErrorKind;

    fn text(body: &str) -> Element {
        Element::Text(rivulet_api::Text {
            body: body.into(),
            ..Default::default()
        })
    }

    #[test]
    fn root_allocates_consecutive_ids() {
        let fx = Fixture::new();
        let mut root = fx.root();

        let leaves: Vec<_> = (0..3).map(|i| root.new_element(text(&i.to_string()))).collect();

        let ids: Vec<u32> = fx.messages().iter().map(|m| m.metadata.delta_id).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert_eq!(leaves.iter().map(|l| l.delta_id()).collect::<Vec<_>>(), [0, 1, 2]);
        assert!(leaves.iter().all(|l| !l.is_root()));
        assert_eq!(root.delta_id(), 3);
    }

    #[test]
    fn leaf_rewrites_its_own_slot() {
        let fx = Fixture::new();
        let mut root = fx.root();
        let mut slot = root.new_element(Element::Empty);
        let again = slot.new_element(text("a"));
        slot.new_element(text("b"));

        assert_eq!(again.delta_id(), 0);
        assert!(fx.messages().iter().all(|m| m.metadata.delta_id == 0));
        assert_eq!(root.delta_id(), 1);
    }

    #[test]
    fn sized_element_carries_dimensions() {
        let fx = Fixture::new();
        fx.root().new_element_sized(Element::Empty, 300, 200);
        assert_eq!(
            fx.last().metadata.element_dimension_spec,
            Some(ElementDimensionSpec {
                width: 300,
                height: 200
            })
        );
    }

    #[test]
    fn block_opens_child_stream() {
        let fx = Fixture::new();
        let mut root = fx.root();
        root.new_element(Element::Empty);
        root.new_element(Element::Empty);

        let mut child = root.new_block().expect("root can open blocks");
        assert_eq!(child.path(), [2]);
        assert_eq!(child.delta_id(), 0);
        assert_eq!(root.delta_id(), 3);

        child.new_element(text("nested"));
        let msg = fx.last();
        assert_eq!(msg.metadata.parent_block.path, vec![2]);
        assert_eq!(msg.metadata.delta_id, 0);
    }

    #[test]
    fn leaf_cannot_open_block() {
        let fx = Fixture::new();
        let mut leaf = fx.root().new_element(Element::Empty);
        let err = leaf.new_block().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn refused_enqueue_does_not_advance() {
        let fx = Fixture::with_sink(RecordingSink {
            refuse: true,
            ..Default::default()
        });
        let mut root = fx.root();
        let returned = root.new_element(text("a"));
        assert!(returned.is_root());
        assert_eq!(root.delta_id(), 0);
        assert_eq!(fx.ctx.metrics().total(), 0);
    }

    #[test]
    fn refused_block_still_opens_child_address() {
        let fx = Fixture::with_sink(RecordingSink {
            refuse_nth: Some(1),
            ..Default::default()
        });
        let mut root = fx.root();
        root.new_element(text("a"));
        let mut block = root.new_block().expect("new_block");
        assert!(block.is_root());
        assert_eq!(block.path(), [1]);
        assert_eq!(block.delta_id(), 0);

        block.new_element(text("inside block"));
        root.new_element(text("after block"));

        let messages = fx.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].metadata.parent_block.path, vec![1]);
        assert_eq!(messages[1].metadata.delta_id, 0);
        assert!(messages[2].metadata.parent_block.path.is_empty());
        assert_eq!(messages[2].metadata.delta_id, 2);
        assert_eq!(fx.ctx.metrics().count("block"), 0);
    }

    #[test]
    fn add_rows_keeps_leaf_address() {
        let fx = Fixture::new();
        let mut root = fx.root();
        root.new_element(Element::Empty);
        let leaf = root.new_element(Element::Table(DataFrame::new(["x"])));

        for n in 0..3 {
            leaf.add_rows(DataFrame::new(["x"]).with_row([n])).expect("add rows");
        }

        let messages = fx.messages();
        assert_eq!(messages.len(), 5);
        assert!(messages[2..].iter().all(|m| m.metadata.delta_id == 1));
        assert_eq!(root.delta_id(), 2);
    }

    #[test]
    fn named_rows_carry_the_name() {
        let fx = Fixture::new();
        let leaf = fx.root().new_element(Element::Empty);
        leaf.add_named_rows("series", DataFrame::new(["x"])).expect("add rows");

        match fx.last().as_delta() {
            Some(Delta::AddRows(rows)) => {
                assert!(rows.has_name);
                assert_eq!(rows.name, "series");
            }
            other => panic!("expected add_rows, got {other:?}"),
        }
    }

    #[test]
    fn add_rows_on_root_is_usage_error() {
        let fx = Fixture::new();
        let err = fx.root().add_rows(DataFrame::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(fx.messages().is_empty());
    }

    #[test]
    fn add_rows_needs_exactly_one_dataset() {
        let fx = Fixture::new();
        let leaf = fx.root().new_element(Element::Empty);

        let none = leaf.add_rows_with(RowsArgs::new()).unwrap_err();
        assert!(matches!(none, DeltaError::Arity(_)));

        let both = RowsArgs::new()
            .data(DataFrame::default())
            .named("other", DataFrame::default());
        assert!(matches!(leaf.add_rows_with(both).unwrap_err(), DeltaError::Arity(_)));

        assert_eq!(fx.messages().len(), 1);
    }

    #[test]
    fn reset_only_on_top_level_root() {
        let fx = Fixture::new();
        let mut root = fx.root();
        root.new_element(Element::Empty);
        let mut child = root.new_block().expect("block");
        let mut leaf = root.new_element(Element::Empty);

        assert!(child.reset().is_err());
        assert!(leaf.reset().is_err());
        root.reset().expect("top-level root resets");
        assert_eq!(root.delta_id(), 0);
    }

    #[test]
    fn null_handle_is_inert() {
        let mut null = DeltaGenerator::null();
        let returned = null.new_element(text("a"));
        assert!(returned.is_null());
        assert_eq!(null.delta_id(), 0);

        // Null short-circuits before the root check.
        assert!(null.add_rows(DataFrame::default()).is_ok());
        assert!(null.new_block().is_ok());
    }

    #[test]
    fn metrics_count_by_kind() {
        let fx = Fixture::new();
        let mut root = fx.root();
        root.new_element(text("a"));
        root.new_element(text("b"));
        root.new_element(Element::Empty);

        assert_eq!(fx.ctx.metrics().count("text"), 2);
        assert_eq!(fx.ctx.metrics().count("empty"), 1);
    }
}
