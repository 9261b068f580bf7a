pub mod compose;
pub mod document_filter;
pub mod populate;
pub mod resolve;
pub mod validate;

pub use compose::*;
pub use document_filter::*;
pub use populate::*;
pub use resolve::*;
pub use validate::*;
