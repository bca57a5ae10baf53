pub mod classifier;
pub mod converter;
pub mod dispatcher;
pub mod pipeline;
pub mod planner;
pub mod window;

pub use dispatcher::Dispatcher;
pub use pipeline::{NotificationPipeline, RunSummary};
pub use window::ScanWindow;
