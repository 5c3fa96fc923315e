//! Ordered queue of outgoing envelopes with same-address coalescing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use rivulet_api::{AddRows, Delta, DeltaKey, ForwardMsg, ForwardMsgBody};

#[derive(Default)]
struct QueueState {
    messages: Vec<ForwardMsg>,
    /// Index into `messages` of the queued delta at each address.
    delta_index: HashMap<DeltaKey, usize>,
}

impl QueueState {
    fn clear(&mut self) {
        self.messages.clear();
        self.delta_index.clear();
    }
}

/// A queue of envelopes waiting to be delivered or exported.
///
/// A delta enqueued at an address that already has an undelivered delta is
/// composed into the queued one instead of being appended, so the queue
/// only ever holds the latest state of each element.
#[derive(Default)]
pub struct ReportQueue {
    state: Mutex<QueueState>,
}

impl ReportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // A panic while holding the lock leaves the vector intact.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a message, coalescing deltas that target the same address.
    pub fn enqueue(&self, msg: ForwardMsg) -> bool {
        let mut state = self.lock();

        if !msg.is_delta() {
            state.messages.push(msg);
            return true;
        }

        let key = msg.metadata.delta_key();
        if let Some(&index) = state.delta_index.get(&key) {
            let old = &state.messages[index];
            if let Some(composed) = compose(old, &msg) {
                tracing::trace!(?key, "coalesced delta into queued message");
                state.messages[index] = composed;
                return true;
            }
        }

        let index = state.messages.len();
        state.delta_index.insert(key, index);
        state.messages.push(msg);
        true
    }

    /// Remove and return everything in the queue.
    pub fn flush(&self) -> Vec<ForwardMsg> {
        let mut state = self.lock();
        state.delta_index.clear();
        std::mem::take(&mut state.messages)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// The first message in the queue, if any.
    pub fn get_initial_msg(&self) -> Option<ForwardMsg> {
        self.lock().messages.first().cloned()
    }

    /// A copy of the queue's content, in order, without draining it.
    pub fn messages(&self) -> Vec<ForwardMsg> {
        self.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }
}

/// Compose a newer delta into an older one at the same address.
///
/// Returns `None` when the two cannot be merged, in which case the newer
/// message has to be queued separately.
fn compose(old: &ForwardMsg, new: &ForwardMsg) -> Option<ForwardMsg> {
    let (ForwardMsgBody::Delta(old_delta), ForwardMsgBody::Delta(new_delta)) =
        (&old.body, &new.body)
    else {
        return None;
    };

    let delta = compose_deltas(old_delta, new_delta)?;
    Some(ForwardMsg::delta(new.metadata.clone(), delta))
}

pub(crate) fn compose_deltas(old: &Delta, new: &Delta) -> Option<Delta> {
    match (old, new) {
        (_, Delta::NewElement(_) | Delta::NewBlock) | (Delta::NewBlock, _) => Some(new.clone()),
        (Delta::NewElement(element), Delta::AddRows(rows)) => {
            let mut element = element.clone();
            let target = element.data_frame_mut(rows.dataset_name())?;
            target.append(rows.data.clone());
            Some(Delta::NewElement(element))
        }
        (Delta::AddRows(queued), Delta::AddRows(rows)) if queued.name == rows.name => {
            let mut data = queued.data.clone();
            data.append(rows.data.clone());
            Some(Delta::AddRows(AddRows {
                data,
                name: queued.name.clone(),
                has_name: queued.has_name,
            }))
        }
        _ => None,
    }
}
