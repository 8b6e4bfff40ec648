pub mod access;
pub mod appointment;
pub mod catalog;
pub mod enums;
pub mod line_item;
pub mod patient;
pub mod user;
pub mod visit;

pub use access::*;
pub use appointment::*;
pub use catalog::*;
pub use enums::*;
pub use line_item::*;
pub use patient::*;
pub use user::*;
pub use visit::*;
