pub mod assistant;
pub mod canton;
pub mod child;
pub mod class;
pub mod common;
pub mod course;
pub mod document;
pub mod filter;
pub mod person;
pub mod teaching;
pub mod theme;
pub mod update;

pub use assistant::*;
pub use canton::*;
pub use child::*;
pub use class::*;
pub use common::*;
pub use course::*;
pub use document::*;
pub use filter::*;
pub use person::*;
pub use teaching::*;
pub use theme::*;
pub use update::*;
