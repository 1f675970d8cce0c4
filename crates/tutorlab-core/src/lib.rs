pub mod analysis;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod resume;
pub mod storage;
