//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a `&Connection`, so the same call works on a plain
//! pooled connection or inside a `Transaction` (which derefs to one).
//! All public functions are re-exported here.

mod access;
mod appointment;
mod catalog;
mod counter;
mod line_item;
mod patient;
mod user;
mod visit;

pub use access::*;
pub use appointment::*;
pub use catalog::*;
pub use counter::*;
pub use line_item::*;
pub use patient::*;
pub use user::*;
pub use visit::*;
