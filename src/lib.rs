//! Backstop - a configurable HTTP mock server
//!
//! Registers virtual endpoints (a path plus a canned response) through a
//! JSON management API and answers requests to those paths from an
//! in-memory registry instead of a real backend. Useful as a stand-in
//! service with controllable latency and failure responses.
//!
//! # Features
//!
//! - **Virtual Endpoints**: Register path -> response mappings at runtime
//! - **Management API**: CRUD over endpoints at `/api/paths`
//! - **Latency Simulation**: Fixed or uniformly random delay per endpoint
//! - **Verbatim Responses**: Status, headers, and body emitted exactly as
//!   stored
//! - **Documentation Server**: Static files under `/docs`
//!
//! # Example Configuration
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8088
//! endpoints:
//!   - path: /hello
//!     returnCode: 200
//!     returnBody: "Hello, World!"
//!   - path: /flaky
//!     delayMinMs: 50
//!     delayMaxMs: 150
//!     returnCode: 503
//! ```

pub mod config;
pub mod registry;
pub mod server;
pub mod synth;

pub use config::ServerConfig;
pub use registry::{EndpointDefinition, EndpointRegistry, RegistryError};
pub use server::{AppState, DOCS_PREFIX, MANAGEMENT_PATH};
pub use synth::ResponseSynthesizer;
