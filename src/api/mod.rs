pub mod assistant_handlers;
pub mod canton_handlers;
pub mod child_handlers;
pub mod class_handlers;
pub mod course_handlers;
pub mod error;
pub mod handlers;
pub mod params;
pub mod person_handlers;
pub mod routes;
pub mod teaching_handlers;
pub mod theme_handlers;

pub use error::*;
pub use handlers::*;
pub use routes::*;
