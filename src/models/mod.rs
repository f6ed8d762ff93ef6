//! Domain models for course module reorganization.
//!
//! # Core Concepts
//!
//! - [`Course`]: The course a migration run operates on. Only its id is needed
//!   to address the remote API.
//! - [`Module`]: A named, ordered container of content inside a course.
//! - [`ModuleItem`]: A single entry inside a module (page, link, sub-header, ...).
//!
//! Every remote object is addressed by an opaque numeric id assigned by Canvas.
//! The `*Input` types mirror the request bodies the Canvas API accepts.

mod course;
mod item;
mod module;

pub use course::*;
pub use item::*;
pub use module::*;
