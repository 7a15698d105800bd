//! Voice agent worker.
//!
//! One worker process serves one room. It announces the intro agent to the
//! external model runtime, exposes the agent's tools to that runtime over a
//! small HTTP bridge, and waits for the caller to join. The only side effect
//! the agent itself has on the outside world is the escalation tool, which
//! flips the room's signaling document to `PENDING`.

pub mod agent;
pub mod bridge;
pub mod config;
pub mod error;
pub mod escalation;
pub mod runtime;
pub mod session;
pub mod tools;
pub mod worker;

pub use agent::IntroAgent;
pub use error::AgentError;
pub use escalation::ConnectSupervisorTool;
pub use runtime::{ModelRuntime, WebhookRuntime};
pub use session::{AgentSession, SessionUserData};
pub use tools::{Tool, ToolRegistry};
pub use worker::{run_job, JobContext, JobOutcome, Worker};
