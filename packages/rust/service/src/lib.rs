//! Orchestration service: wires the fetch/extract, merge, and render stages
//! to the external record and object stores.
//!
//! The stores are traits so the pipeline can be exercised end to end against
//! in-memory fakes; the HTTP implementations target PostgREST- and
//! Supabase-Storage-shaped APIs.

pub mod generator;
pub mod records;
pub mod storage;

pub use generator::{needs_regeneration, BatchSummary, InstructionService};
pub use records::{HttpRecordStore, RecordPatch, RecordStore};
pub use storage::{storage_key, HttpObjectStore, ObjectStore};
