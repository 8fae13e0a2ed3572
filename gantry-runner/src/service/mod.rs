//! Service layer
//!
//! Services contain the business logic of the runner: executing a run
//! through its stages and buffering the logs it produces.
//!
//! All services are trait-based to enable testing and dependency injection.

mod execution;
mod log_buffer;

// Re-export traits
pub use execution::ExecutionService;
pub use log_buffer::LogBufferService;

// Re-export implementations
pub use execution::StandardExecutionService;
pub use log_buffer::InMemoryLogBuffer;
