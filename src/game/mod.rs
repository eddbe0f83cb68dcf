pub mod math;
pub mod scene;
pub mod snapshot;
