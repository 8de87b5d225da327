//! Undo/Redo history.
//!
//! Every store mutation records a snapshot of the document taken *before*
//! the mutation. Snapshots are MessagePack-encoded `AnnotationData`, so a
//! step is a whole-document swap rather than an inverse mutation chain.
//!
//! Floor backgrounds are kept out of the encoded bytes. Each snapshot holds
//! them as `Arc<str>` handles, and identical images are shared across every
//! step on both stacks.
//!
//! Drag gestures use **batching**: between `begin_batch` and `end_batch`
//! only the first snapshot is kept, so the whole gesture undoes in one step.

use std::sync::Arc;
use wayfind_core::model::AnnotationData;

/// One encoded document state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
    /// Floor id to background image.
    backgrounds: Vec<(String, Arc<str>)>,
    description: String,
}

impl Snapshot {
    /// `data` is expected without backgrounds; they are re-attached from
    /// `backgrounds` on decode.
    pub fn encode(
        data: &AnnotationData,
        backgrounds: Vec<(String, Arc<str>)>,
        description: &str,
    ) -> Result<Self, String> {
        let bytes = rmp_serde::to_vec_named(data).map_err(|e| format!("snapshot encode: {e}"))?;
        Ok(Self {
            bytes,
            backgrounds,
            description: description.to_string(),
        })
    }

    pub fn decode(&self) -> Result<AnnotationData, String> {
        let mut data: AnnotationData =
            rmp_serde::from_slice(&self.bytes).map_err(|e| format!("snapshot decode: {e}"))?;
        for floor in &mut data.floors {
            if let Some((_, src)) = self.backgrounds.iter().find(|(id, _)| *id == floor.id) {
                floor.background_image = Some(src.to_string());
            }
        }
        Ok(data)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn relabel(self, description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..self
        }
    }
}

/// Manages undo/redo stacks with batch grouping for drag gestures.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Whether the current batch already recorded its opening snapshot.
    batch_recorded: bool,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_recorded: false,
        }
    }

    /// Record the state before a mutation. Inside a batch only the
    /// first call is kept.
    pub fn record(&mut self, before: Snapshot) {
        if self.batch_depth > 0 {
            if self.batch_recorded {
                return;
            }
            self.batch_recorded = true;
        }
        self.undo_stack.push(before);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Whether the next `record` would be kept.
    pub fn wants_snapshot(&self) -> bool {
        self.batch_depth == 0 || !self.batch_recorded
    }

    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch_recorded = false;
        }
        self.batch_depth += 1;
    }

    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.batch_recorded = false;
        }
    }

    /// Pop the last state, pushing `current` onto the redo stack.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.relabel(previous.description()));
        Some(previous)
    }

    /// Pop the last undone state, pushing `current` back onto the undo stack.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.relabel(next.description()));
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// A handle for `src`, reusing one already held by a recorded step.
    pub fn shared_background(&self, src: &str) -> Arc<str> {
        self.undo_stack
            .iter()
            .rev()
            .chain(self.redo_stack.iter().rev())
            .flat_map(|s| s.backgrounds.iter())
            .find(|(_, held)| **held == *src)
            .map_or_else(|| Arc::from(src), |(_, held)| Arc::clone(held))
    }
}
