pub mod accuracy;
pub mod controller;
pub mod loop_worker;
pub mod oracle;
pub mod scheduler;

pub use controller::StationController;
pub use loop_worker::{station_loop, StationEnd, StationSummary};
pub use oracle::{Classifier, FaceLocator, Region};
pub use scheduler::{FrameOutcome, SamplingScheduler};
