//! Orchestration engine: background task runner, batch coordinator, and the
//! transactional note/metadata stores.
//!
//! The engine sits on top of [`notelens_analysis`]'s registry and drives it:
//! the [`TaskRunner`] gives individual analyses bounded concurrency with
//! progress and cooperative cancellation, while the [`BatchCoordinator`]
//! walks whole note collections with per-item failure isolation.

/// Batch task types and the coordinator loop.
pub mod batch;
/// Single-flight gate for exclusive foreground work.
pub mod gate;
/// Bounded-concurrency operation runner.
pub mod runner;
/// Metadata and note stores.
pub mod store;

pub use batch::{BatchCoordinator, BatchTask};
pub use gate::{ForegroundGate, ForegroundPermit};
pub use runner::{OperationContext, OperationStatus, TaskRunner};
pub use store::{FileNoteStore, JsonFileStore, MetadataStore, NoteStore};
