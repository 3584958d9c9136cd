// Infrastructure layer (shared components)
pub mod config;
pub mod storage;
pub mod telemetry;
pub mod transport;

// Domain layer (business logic)
pub mod connectivity;
pub mod notify;
pub mod queue;
pub mod sync;

// Application layer
pub mod service;
