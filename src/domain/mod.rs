pub mod content_coding;
pub mod entities;
pub mod errors;
pub mod value_objects;
