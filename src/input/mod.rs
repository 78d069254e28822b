pub mod drag_drop;

pub use drag_drop::{
    DragAndDropManager, DragEvent, DragEventSender, DragOutcome, DragPayload, DropCallback,
};
