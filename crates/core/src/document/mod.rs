pub mod id;
pub mod model;
pub mod validate;

pub use id::{new_id, SubRef};
pub use model::{Document, DocumentRow, Fields};
