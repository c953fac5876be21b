pub mod archive;
pub mod binary;
pub mod error;
pub mod format;
