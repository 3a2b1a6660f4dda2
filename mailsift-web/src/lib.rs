//! HTTP front-end for batch email validation
//!
//! # Endpoints
//!
//! - **`POST /validate`** - Run a batch and answer with the full summary
//! - **`POST /validate/stream`** - Run a batch, streaming progress as
//!   server-sent events; disconnecting cancels the batch
//! - **`GET /download/deliverable`**, **`GET /download/undeliverable`** -
//!   CSV exports of the most recent completed batch
//! - **`GET /health/live`** - Liveness probe
//!
//! Every batch started by this server goes through the same
//! [`BatchProcessor`](mailsift_verify::BatchProcessor), and therefore the same
//! rate limiter.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mailsift_web::{AppState, WebConfig, WebServer};
//! # use mailsift_verify::BatchProcessor;
//!
//! # async fn example(processor: BatchProcessor) -> Result<(), Box<dyn std::error::Error>> {
//! let server = WebServer::new(WebConfig::default(), AppState::new(processor)).await?;
//!
//! // server.serve(shutdown_receiver).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handlers;
mod server;
mod state;

pub use config::WebConfig;
pub use error::{ApiError, WebError};
pub use handlers::{BatchResponse, StreamEvent, ValidateRequest};
pub use server::{WebServer, router};
pub use state::AppState;
