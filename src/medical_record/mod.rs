//! Visit-based medical records: line-item synchronisation, the visit read
//! model and vitals capture.

pub mod sync;
pub mod vitals;

pub use sync::{list_line_items, load_visit_detail, sync_line_items, SyncStrategy};
pub use vitals::{edit_vitals, validate_vitals, FormValue, VitalsForm};
