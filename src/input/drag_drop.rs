//! Drag and Drop
//!
//! Tracks one drag operation at a time. Platform callbacks (pointer capture
//! changes, pointer release) may fire on any thread; they only push a
//! [`DragEvent`] into a bounded queue. The owning thread drains that queue
//! once per tick in [`DragAndDropManager::update`], which is the only place a
//! drag can end.
//!
//! ```rust,ignore
//! let mut drag = DragAndDropManager::new(settings.drag_event_capacity);
//! platform.on_capture_changed(drag.sender());
//!
//! drag.start_drag(SCENE_OBJECT, Arc::new(selection), true);
//!
//! // every tick
//! if let Some(outcome) = drag.update() {
//!     if outcome.processed { /* dropped on a target */ }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use flume::{Receiver, Sender, TrySendError};

pub type DragPayload = Arc<dyn Any + Send + Sync>;
pub type DropCallback = Box<dyn FnOnce(bool) + Send>;

/// Platform notification relevant to an active drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    /// Pointer capture was gained or lost. Each event flips the capture state.
    CaptureChanged,
    /// The pointer was released. `accepted` is what the drop target under
    /// the pointer reported; `false` when there was no target.
    PointerReleased { accepted: bool },
}

/// Cloneable handle used by platform callbacks.
#[derive(Debug, Clone)]
pub struct DragEventSender {
    sender: Sender<DragEvent>,
}

impl DragEventSender {
    /// Queues `event`. Returns `false` when the queue is full or the manager
    /// is gone; the event is dropped in both cases.
    pub fn send(&self, event: DragEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::warn!("Drag event queue is full, dropping {event:?}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// How a drag ended.
#[derive(Clone)]
pub struct DragOutcome {
    pub type_id: u32,
    pub payload: DragPayload,
    /// `true` when the payload was dropped somewhere that handled it.
    pub processed: bool,
}

impl std::fmt::Debug for DragOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragOutcome")
            .field("type_id", &self.type_id)
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}

struct ActiveDrag {
    type_id: u32,
    payload: DragPayload,
    needs_valid_drop_target: bool,
    capture_active: bool,
    capture_changed: bool,
}

/// Owner of the current drag.
///
/// A drag ends in one of two ways:
///
/// - Pointer released: processed when the drop target accepted the payload.
///   Drags started without `needs_valid_drop_target` count as processed
///   wherever they are released, even with no accepting target.
/// - Pointer capture lost without a release: never processed.
pub struct DragAndDropManager {
    active: Option<ActiveDrag>,
    drop_callbacks: Vec<DropCallback>,
    sender: Sender<DragEvent>,
    receiver: Receiver<DragEvent>,
}

impl DragAndDropManager {
    /// `event_capacity` bounds the events buffered between two updates.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(event_capacity.max(1));
        Self {
            active: None,
            drop_callbacks: Vec::new(),
            sender,
            receiver,
        }
    }

    #[must_use]
    pub fn sender(&self) -> DragEventSender {
        DragEventSender {
            sender: self.sender.clone(),
        }
    }

    /// Begins a drag, replacing any drag already in progress.
    ///
    /// With `needs_valid_drop_target`, releasing the pointer only counts as a
    /// successful drop when a target accepted the payload.
    pub fn start_drag(&mut self, type_id: u32, payload: DragPayload, needs_valid_drop_target: bool) {
        if self.active.is_some() {
            log::warn!("Starting a drag while another one is in progress, cancelling the old one");
            self.end_drag(false);
        }

        // Events queued before this drag don't concern it.
        let stale = self.receiver.drain().count();
        if stale > 0 {
            log::debug!("Discarded {stale} drag events queued before the drag started");
        }

        self.active = Some(ActiveDrag {
            type_id,
            payload,
            needs_valid_drop_target,
            capture_active: false,
            capture_changed: false,
        });
    }

    /// Registers a callback run once when the current drag ends, with
    /// whether the drop was processed.
    pub fn add_drop_callback(&mut self, callback: impl FnOnce(bool) + Send + 'static) {
        self.drop_callbacks.push(Box::new(callback));
    }

    #[inline]
    #[must_use]
    pub fn is_drag_in_progress(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn drag_type_id(&self) -> Option<u32> {
        self.active.as_ref().map(|drag| drag.type_id)
    }

    #[must_use]
    pub fn payload(&self) -> Option<&DragPayload> {
        self.active.as_ref().map(|drag| &drag.payload)
    }

    /// Consumes pending events. Returns the outcome if the drag ended.
    pub fn update(&mut self) -> Option<DragOutcome> {
        let Some(drag) = self.active.as_mut() else {
            let ignored = self.receiver.drain().count();
            if ignored > 0 {
                log::trace!("Ignoring {ignored} drag events, no drag in progress");
            }
            return None;
        };

        let mut released = None;
        for event in self.receiver.try_iter() {
            match event {
                DragEvent::CaptureChanged => {
                    drag.capture_active = !drag.capture_active;
                    drag.capture_changed = true;
                }
                DragEvent::PointerReleased { accepted } => {
                    released = Some(accepted || !drag.needs_valid_drop_target);
                    break;
                }
            }
        }

        if let Some(processed) = released {
            return self.end_drag(processed);
        }

        // Capture lost without a release, e.g. the window lost focus.
        if !drag.capture_active && drag.capture_changed {
            return self.end_drag(false);
        }

        None
    }

    fn end_drag(&mut self, processed: bool) -> Option<DragOutcome> {
        let drag = self.active.take()?;
        for callback in self.drop_callbacks.drain(..) {
            callback(processed);
        }

        log::debug!("Drag of type {} ended (processed: {processed})", drag.type_id);
        Some(DragOutcome {
            type_id: drag.type_id,
            payload: drag.payload,
            processed,
        })
    }
}

impl std::fmt::Debug for DragAndDropManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragAndDropManager")
            .field("type_id", &self.drag_type_id())
            .field("pending_events", &self.receiver.len())
            .finish_non_exhaustive()
    }
}
