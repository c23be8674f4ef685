pub mod api_handler;
pub mod field_generator;
pub mod health_handler;
pub mod metrics_handler;
pub mod mock_engine;
pub mod pattern;
pub mod result_store;
pub mod scheduler;
pub mod schema_loader;
pub mod stream_emitter;
pub mod template;
pub mod workspace_store;

#[cfg(test)]
mod mock_engine_test;
#[cfg(test)]
mod template_test;
