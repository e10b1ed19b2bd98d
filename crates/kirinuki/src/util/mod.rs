pub mod format;
pub mod http;
pub mod path;
