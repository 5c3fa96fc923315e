//! A session record: the durable master queue and the browser delivery queue.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rivulet_api::{Delta, ForwardMsg, ForwardMsgBody, Manifest};
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::context::DeltaSink;
use crate::error::DeltaError;
use crate::queue::ReportQueue;

/// One `(storage key, bytes)` pair of an exported session.
pub type ReportFile = (String, Vec<u8>);

/// Holds everything sent during a session.
///
/// Every message goes into both queues. The master queue keeps the
/// session's full content for export; the browser queue holds what the
/// renderer has not received yet and is drained by the delivery loop.
pub struct Report {
    name: String,
    script_path: PathBuf,
    argv: Vec<String>,
    config: ReportConfig,
    master_queue: ReportQueue,
    browser_queue: ReportQueue,
    /// Held while a message goes into both queues, and while they are cleared.
    queues_lock: Mutex<()>,
    report_id: Mutex<String>,
}

impl Report {
    pub fn new(script_path: impl Into<PathBuf>, argv: Vec<String>, config: ReportConfig) -> Self {
        let script_path = script_path.into();
        let name = script_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            name,
            script_path,
            argv,
            config,
            master_queue: ReportQueue::new(),
            browser_queue: ReportQueue::new(),
            queues_lock: Mutex::new(()),
            report_id: Mutex::new(new_report_id()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// The current run's id.
    pub fn report_id(&self) -> String {
        self.report_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Pick a fresh random id for the next run.
    pub fn generate_new_id(&self) -> String {
        let id = new_report_id();
        *self
            .report_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = id.clone();
        id
    }

    /// URL of a session served from `host_ip`.
    pub fn url(&self, host_ip: &str) -> String {
        format!("http://{}:{}", host_ip, self.config.browser_port())
    }

    /// Push a message into both queues as one step.
    pub fn enqueue(&self, msg: ForwardMsg) -> bool {
        tracing::trace!(delta_id = msg.metadata.delta_id, "enqueue");
        let _guard = self.lock_queues();
        self.master_queue.enqueue(msg.clone());
        self.browser_queue.enqueue(msg)
    }

    /// Empty both queues, keeping the master queue's initial message.
    pub fn clear(&self) {
        let _guard = self.lock_queues();
        let initial = self.master_queue.get_initial_msg();
        self.master_queue.clear();
        if let Some(initial) = initial {
            self.master_queue.enqueue(initial);
        }
        self.browser_queue.clear();
    }

    /// Remove and return the messages not yet delivered to the renderer.
    pub fn flush_browser_queue(&self) -> Vec<ForwardMsg> {
        self.browser_queue.flush()
    }

    /// The master queue's content, in order.
    pub fn master_messages(&self) -> Vec<ForwardMsg> {
        self.master_queue.messages()
    }

    /// A manifest pointing at the live server, for a session still running.
    pub fn serialize_running_report_to_files(
        &self,
        external_ip: Option<String>,
        internal_ip: Option<String>,
    ) -> Result<Vec<ReportFile>, DeltaError> {
        tracing::debug!("serializing running report");
        let manifest = Manifest::running(
            self.name.clone(),
            self.config.server_address.clone(),
            external_ip,
            internal_ip,
            self.config.server_port,
        );
        Ok(vec![(self.manifest_key(), serde_json::to_vec(&manifest)?)])
    }

    /// The finished session as message files followed by its manifest.
    ///
    /// The manifest is always the last pair so a reader never finds a
    /// manifest pointing at messages that have not been written yet.
    pub fn serialize_final_report_to_files(&self) -> Result<Vec<ReportFile>, DeltaError> {
        tracing::debug!("serializing final report");
        let mut messages: Vec<ForwardMsg> = self
            .master_queue
            .messages()
            .into_iter()
            .filter(should_save_report_msg)
            .collect();

        let mut first_delta_index = 0;
        let mut num_deltas = 0;
        for (index, msg) in messages.iter_mut().enumerate() {
            if msg.is_delta() {
                msg.metadata.delta_id = num_deltas as u32;
                if num_deltas == 0 {
                    first_delta_index = index;
                }
                num_deltas += 1;
            }
        }

        let manifest = Manifest::done(
            self.name.clone(),
            messages.len(),
            first_delta_index,
            num_deltas,
            self.config.server_port,
        );

        let report_id = self.report_id();
        let mut files = Vec::with_capacity(messages.len() + 1);
        for (index, msg) in messages.iter().enumerate() {
            let key = format!("reports/{}/{}.pb", report_id, index);
            files.push((key, rmp_serde::to_vec_named(msg)?));
        }
        files.push((self.manifest_key(), serde_json::to_vec(&manifest)?));

        tracing::debug!(files = files.len(), num_deltas, "serialized final report");
        Ok(files)
    }

    fn lock_queues(&self) -> MutexGuard<'_, ()> {
        self.queues_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn manifest_key(&self) -> String {
        format!("reports/{}/manifest.json", self.report_id())
    }
}

impl DeltaSink for Report {
    fn enqueue(&self, msg: ForwardMsg) -> bool {
        Report::enqueue(self, msg)
    }
}

fn new_report_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Whether a message belongs in an exported session.
///
/// Session metadata and deltas are kept; transient control messages and
/// empty placeholders are dropped.
fn should_save_report_msg(msg: &ForwardMsg) -> bool {
    match &msg.body {
        ForwardMsgBody::Delta(Delta::NewElement(element)) => !element.is_empty(),
        ForwardMsgBody::Initialize(_) | ForwardMsgBody::NewReport(_) | ForwardMsgBody::Delta(_) => {
            true
        }
        ForwardMsgBody::ReportFinished | ForwardMsgBody::UploadReportProgress(_) => false,
    }
}
