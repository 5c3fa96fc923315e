//! Per-session context threaded through every delta generator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rivulet_api::ForwardMsg;

use crate::widgets::Widgets;

/// Destination for envelopes produced by a generator.
pub trait DeltaSink: Send + Sync {
    /// Queue a message. Returns `false` if the message was not taken.
    fn enqueue(&self, msg: ForwardMsg) -> bool;
}

/// Count of enqueued deltas, labelled by element kind.
#[derive(Debug, Default)]
pub struct DeltaMetrics {
    counts: Mutex<HashMap<&'static str, u64>>,
}

impl DeltaMetrics {
    pub fn record(&self, kind: &'static str) {
        let mut counts = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        *counts.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: &str) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        counts.get(kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        counts.values().sum()
    }
}

/// Everything a generator needs besides its own address.
pub struct SessionContext {
    sink: Arc<dyn DeltaSink>,
    widgets: Arc<Widgets>,
    metrics: DeltaMetrics,
}

impl SessionContext {
    pub fn new(sink: Arc<dyn DeltaSink>, widgets: Arc<Widgets>) -> Arc<Self> {
        Arc::new(Self {
            sink,
            widgets,
            metrics: DeltaMetrics::default(),
        })
    }

    pub fn enqueue(&self, msg: ForwardMsg) -> bool {
        self.sink.enqueue(msg)
    }

    pub fn widgets(&self) -> &Widgets {
        &self.widgets
    }

    pub fn metrics(&self) -> &DeltaMetrics {
        &self.metrics
    }
}
