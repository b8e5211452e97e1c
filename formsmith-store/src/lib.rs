//! Form persistence for Formsmith
//!
//! `formsmith-store` owns the persisted wire shape (one JSON document per
//! form), the `FormStore` collaborator boundary, and the save reconciliation:
//! optimistic version check, three-way field diff, version bump by exactly
//! one. Two implementations ship: a file-backed store in the
//! one-file-per-document idiom with atomic writes and an advisory lock, and
//! an in-memory store for tests.

pub mod assets;
pub mod error;
pub mod file;
pub mod memory;
pub mod roles;
pub mod store;
pub mod types;

pub use assets::{AssetStorage, MemoryAssetStorage};
pub use error::{Result, StoreError};
pub use file::FileFormStore;
pub use memory::MemoryFormStore;
pub use roles::UserRole;
pub use store::{reconcile, FormStore, ReconcileStats};
pub use types::{
    FieldRecord, FormAccess, FormDraft, FormId, FormRecord, FormSubmission, FormSummary,
};
