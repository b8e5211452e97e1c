//! Builder session engine for Formsmith
//!
//! `formsmith-builder` owns the interactive editing model: one
//! [`BuilderSession`] per open form, drag and drop placement driven by
//! pointer geometry, last-write-wins validation feedback, and the save
//! round trip through a [`formsmith_store::FormStore`].
//!
//! # Architecture
//!
//! - `session`: the mutable editing state and its structural operations
//! - `drag`: palette inserts and canvas reorders from pointer midpoints
//! - `save`: the optimistic-concurrency save round trip
//! - `error`: session and save error types

pub mod drag;
pub mod error;
pub mod save;
pub mod session;

pub use drag::{drop_index_for_pointer, DragContext, DragSource, ItemBounds};
pub use error::{Result, SaveError, SessionError};
pub use save::save;
pub use session::{BuilderSession, ValidationTicket};
