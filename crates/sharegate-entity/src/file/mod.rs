//! Library file entities.

pub mod model;

pub use model::{CreateFile, File, library_object_name, sanitize, split_file_name};
