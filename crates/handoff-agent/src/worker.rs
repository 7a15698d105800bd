//! Entry point of a single agent job.

use crate::agent::IntroAgent;
use crate::config::Config;
use crate::error::AgentError;
use crate::runtime::WebhookRuntime;
use crate::session::{AgentSession, SessionUserData};
use handoff_types::is_supervisor_identity;
use handoff_voice::{wait_for_participant, LiveKitParticipantWatcher, ParticipantWatcher};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Everything a job needs besides the session itself.
pub struct JobContext {
    pub session: Arc<AgentSession>,
    pub watcher: Arc<dyn ParticipantWatcher>,
    /// Identity the agent joins under; never counted as the caller.
    pub agent_identity: String,
    pub participant_timeout: Duration,
}

/// How the job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A caller joined; the session keeps serving tool calls.
    CallerJoined { identity: String },
    /// A supervisor joined first; the agent stays out of the call.
    SupervisorJoined { identity: String },
}

/// A worker wired up from configuration, with its tool bridge bound but not
/// yet serving.
pub struct Worker {
    pub room: String,
    pub ctx: JobContext,
    pub listener: TcpListener,
    pub bridge_addr: SocketAddr,
}

impl Worker {
    /// Opens the signaling store, binds the tool bridge and builds the
    /// session for the configured room.
    ///
    /// # Errors
    ///
    /// `AgentError::Config` without a room, `AgentError::Store` if the store
    /// cannot be opened, `AgentError::Io` if the bridge address is taken.
    pub async fn from_config(config: &Config) -> Result<Self, AgentError> {
        let room = config
            .agent
            .room
            .clone()
            .filter(|room| !room.trim().is_empty())
            .ok_or_else(|| {
                AgentError::Config(
                    "agent.room (or HANDOFF_AGENT_ROOM) must name the room to serve".to_string(),
                )
            })?;

        let store = handoff_store::open_store(&config.store)?;

        let addr = SocketAddr::new(config.agent.bridge_host, config.agent.bridge_port);
        let listener = TcpListener::bind(addr).await?;
        let bridge_addr = listener.local_addr()?;
        let tool_endpoint = format!("http://{}/tools", bridge_addr);

        let runtime = WebhookRuntime::new(config.agent.runtime_url.clone(), Some(tool_endpoint))?;
        let session = Arc::new(AgentSession::new(
            IntroAgent::create(store),
            SessionUserData::for_room(Some(room.clone())),
            Arc::new(runtime),
        ));

        let ctx = JobContext {
            session,
            watcher: Arc::new(LiveKitParticipantWatcher::new(
                &config.livekit,
                config.agent.poll_interval(),
            )),
            agent_identity: config.agent.resolve_identity(),
            participant_timeout: config.agent.participant_timeout(),
        };

        Ok(Self {
            room,
            ctx,
            listener,
            bridge_addr,
        })
    }
}

/// Starts the session, then waits for the first participant.
///
/// # Errors
///
/// Fails if the runtime rejects the session, or if nobody joins within
/// `participant_timeout`.
pub async fn run_job(ctx: &JobContext) -> Result<JobOutcome, AgentError> {
    let room = ctx
        .session
        .userdata()
        .room_name()
        .ok_or_else(|| AgentError::Config("job has no room".to_string()))?
        .to_string();

    ctx.session.start().await?;

    let participant = wait_for_participant(
        ctx.watcher.as_ref(),
        &room,
        Some(ctx.agent_identity.as_str()),
        ctx.participant_timeout,
    )
    .await?;
    tracing::info!(room = %room, identity = %participant.identity, "participant joined");

    if is_supervisor_identity(&participant.identity) {
        tracing::info!(room = %room, identity = %participant.identity, "supervisor joined the room");
        return Ok(JobOutcome::SupervisorJoined {
            identity: participant.identity,
        });
    }

    tracing::info!(room = %room, "agent session started successfully");
    Ok(JobOutcome::CallerJoined {
        identity: participant.identity,
    })
}
