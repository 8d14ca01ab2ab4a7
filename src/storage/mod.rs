//! File storage
//!
//! Per-user namespaces, path resolution, content access and the profile
//! picture slot.

pub mod catalog;
pub mod codec;
pub mod docx;
pub mod filesystem;
pub mod namespace;
pub mod operations;
pub mod profile;
pub mod project;
pub mod results;

pub use namespace::UserId;
pub use operations::FileStore;
pub use profile::ProfilePictureStore;
pub use project::ProjectFiles;
pub use results::{ContentView, Disposition, Download, ProfilePictureLookup};
