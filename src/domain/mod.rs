pub mod user;
pub mod announcement;
pub mod credit;
pub mod document;

pub use user::*;
pub use announcement::*;
pub use credit::*;
pub use document::*;
