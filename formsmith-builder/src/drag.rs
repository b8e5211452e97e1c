//! Drag and drop: palette inserts and canvas reorders.
//!
//! The surface reports pointer geometry; the engine owns the placement
//! decision. A drag is a three-phase exchange (begin, a stream of
//! `drag_over` updates, then `complete_drag` or `cancel_drag`) and all of
//! its intermediate state lives in the session's [`DragContext`].

use tracing::debug;

use formsmith_fields::{FieldId, FieldRegistry, FieldTag};

use crate::error::{Result, SessionError};
use crate::session::BuilderSession;

/// Vertical extent of one rendered field row, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemBounds {
    pub top: f64,
    pub height: f64,
}

impl ItemBounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Where the drop index comes to rest for a pointer at `pointer_y`.
///
/// The pointer lands before the first item whose midpoint it has not yet
/// passed; a pointer at exactly the midpoint still inserts before. Past
/// every midpoint the index is the item count (append). An empty canvas
/// yields 0.
pub fn drop_index_for_pointer(pointer_y: f64, boxes: &[ItemBounds]) -> usize {
    boxes
        .iter()
        .position(|b| pointer_y <= b.midpoint())
        .unwrap_or(boxes.len())
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A new field from the palette; it does not exist in the session yet.
    Palette { tag: FieldTag },
    /// An existing field being reordered. `from_index` is its position when
    /// the drag began, kept for surfaces that render a gap at the origin.
    Reorder { field_id: FieldId, from_index: usize },
}

/// In-flight drag state. Empty between drags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragContext {
    pub(crate) source: Option<DragSource>,
    pub(crate) computed_drop_index: Option<usize>,
}

impl DragContext {
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// The live drop index, recomputed on every `drag_over`.
    pub fn computed_drop_index(&self) -> Option<usize> {
        self.computed_drop_index
    }

    pub fn source(&self) -> Option<&DragSource> {
        self.source.as_ref()
    }

    /// Whether this drag is moving the given field.
    pub fn involves(&self, id: &FieldId) -> bool {
        matches!(&self.source, Some(DragSource::Reorder { field_id, .. }) if field_id == id)
    }
}

impl BuilderSession {
    /// Start dragging a new field off the palette.
    pub fn begin_palette_drag(&mut self, tag: &FieldTag) -> Result<()> {
        if self.is_preview_mode {
            return Err(SessionError::PreviewMode);
        }
        self.drag = DragContext {
            source: Some(DragSource::Palette { tag: tag.clone() }),
            computed_drop_index: None,
        };
        Ok(())
    }

    /// Start dragging an existing field to a new position.
    pub fn begin_reorder_drag(&mut self, id: &FieldId) -> Result<()> {
        if self.is_preview_mode {
            return Err(SessionError::PreviewMode);
        }
        let from_index = self
            .fields
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| SessionError::field_not_found(id))?;
        self.drag = DragContext {
            source: Some(DragSource::Reorder {
                field_id: id.clone(),
                from_index,
            }),
            computed_drop_index: None,
        };
        Ok(())
    }

    /// Recompute the drop index from the pointer position and the rendered
    /// row geometry. `boxes` is one entry per field, in field order.
    pub fn drag_over(&mut self, pointer_y: f64, boxes: &[ItemBounds]) -> Result<usize> {
        if !self.drag.is_active() {
            return Err(SessionError::NoActiveDrag);
        }
        let index = drop_index_for_pointer(pointer_y, boxes);
        self.drag.computed_drop_index = Some(index);
        Ok(index)
    }

    /// Finish the drag at the last computed drop index.
    ///
    /// Without a computed index (the pointer never crossed the canvas) the
    /// drag dissolves into a cancel and `Ok(None)` is returned. A palette
    /// drop materializes the field at the index and returns its id; a
    /// reorder drop moves the field, or leaves the list untouched when the
    /// destination equals the origin. The drag context is cleared on every
    /// path.
    pub fn complete_drag(&mut self, registry: &FieldRegistry) -> Result<Option<FieldId>> {
        let source = self.drag.source.take().ok_or(SessionError::NoActiveDrag)?;
        let target = match self.drag.computed_drop_index.take() {
            Some(target) => target,
            None => {
                debug!("drag dropped outside the canvas, cancelled");
                return Ok(None);
            }
        };

        match source {
            DragSource::Palette { tag } => {
                let def = registry.create_default(&tag, FieldId::new(), tag.default_label());
                let id = def.id.clone();
                let index = target.min(self.fields.len());
                self.insert_definition(index, def)?;
                debug!(field = %id, index, "palette drop inserted field");
                Ok(Some(id))
            }
            DragSource::Reorder { field_id, .. } => {
                // Position at drop time, not at drag start: edits may have
                // shifted the list mid-drag.
                let from = self
                    .fields
                    .iter()
                    .position(|f| f.id == field_id)
                    .ok_or_else(|| SessionError::field_not_found(&field_id))?;
                let target = target.min(self.fields.len());
                // Removing the dragged row first shifts every later index
                // down by one.
                let effective = if from < target { target - 1 } else { target };
                if effective != from {
                    let def = self.fields.remove(from);
                    self.fields.insert(effective, def);
                    debug!(field = %field_id, from, to = effective, "reorder drop moved field");
                }
                Ok(Some(field_id))
            }
        }
    }

    /// Abandon the drag without touching the field list.
    pub fn cancel_drag(&mut self) {
        self.drag = DragContext::default();
    }

    /// The live drag state, for surfaces rendering an insertion indicator.
    pub fn drag_context(&self) -> &DragContext {
        &self.drag
    }
}
