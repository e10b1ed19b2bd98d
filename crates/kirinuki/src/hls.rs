mod resolver;
pub mod utils;

pub use m3u8_rs;
pub use resolver::M3u8Resolver;
