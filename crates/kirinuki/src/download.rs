mod orchestrator;
pub mod policy;
mod pool;
mod session;

pub use orchestrator::{DownloadHandle, Downloader, DownloaderBuilder};
pub use policy::ResizePolicy;
pub use pool::WorkerPool;
pub use session::{DownloadSession, Outcome};
