//! Per-connection session handling
//!
//! One session serves exactly one request:
//!
//! ```text
//! AwaitingLength -> AwaitingPayload -> Recognizing -> Deciding -> Logging -> Responding -> Closed
//! ```
//!
//! A framing failure or an expired session deadline jumps straight to
//! `Closed`: nothing is written to the audit log and no response is sent.
//! Once a complete image has been received the session always logs exactly
//! one record, even if recognition fails, and a failed audit write never
//! prevents the response.

use crate::audit::{append_with_retry, AuditStore, NewAuditRecord};
use crate::config::Config;
use crate::decision::{decide, AccessDecision};
use crate::protocol::{framing, write_response, FrameError};
use crate::recognizer::{CommandRecognizer, RecognitionResult, Recognizer};
use crate::spool::ImageSpool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

/// Session states, in the order a successful session visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    AwaitingLength,
    AwaitingPayload,
    Recognizing,
    Deciding,
    Logging,
    Responding,
    Closed,
}

/// Why a session ended without a decision
#[derive(Error, Debug)]
pub enum SessionAbort {
    #[error("framing failed: {0}")]
    Frame(#[from] FrameError),

    #[error("session deadline of {0:?} expired")]
    TimedOut(Duration),
}

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// A decision was made and sent (or at least attempted)
    Completed {
        decision: AccessDecision,
        /// Id of the audit record, `None` if persisting it failed
        audit_id: Option<i64>,
    },
    /// Closed early with no record and no response
    Aborted(SessionAbort),
}

/// Limits applied to every session
#[derive(Debug, Clone)]
pub struct SessionLimits {
    pub max_payload_bytes: u32,
    pub session_timeout: Duration,
    pub audit_write_retries: u32,
}

impl SessionLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_payload_bytes: config.session.max_payload_bytes,
            session_timeout: config.session.session_timeout(),
            audit_write_retries: config.database.write_retries,
        }
    }
}

/// Everything a session needs, injected by the listener
#[derive(Clone)]
pub struct SessionContext {
    pub store: Arc<dyn AuditStore>,
    pub recognizer: Arc<dyn Recognizer>,
    pub spool: ImageSpool,
    pub limits: SessionLimits,
}

impl SessionContext {
    /// Context with the external-process recognizer described by `config`
    pub fn from_config(config: &Config, store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            recognizer: Arc::new(CommandRecognizer::from_config(&config.recognizer)),
            spool: ImageSpool::new(config.session.spool_dir.clone()),
            limits: SessionLimits::from_config(config),
        }
    }
}

struct Session<'a, S> {
    id: Uuid,
    peer: SocketAddr,
    stream: S,
    ctx: &'a SessionContext,
    state: SessionState,
}

impl<'a, S> Session<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn advance(&mut self, next: SessionState) {
        debug_assert!(next > self.state, "{:?} -> {:?}", self.state, next);
        trace!(from = ?self.state, to = ?next, "Session state change");
        self.state = next;
    }

    /// Receive the image and run recognition
    async fn evaluate(&mut self) -> Result<RecognitionResult, FrameError> {
        let len = framing::read_length(&mut self.stream, self.ctx.limits.max_payload_bytes).await?;

        self.advance(SessionState::AwaitingPayload);
        let image = framing::read_payload(&mut self.stream, len).await?;
        debug!(bytes = image.as_bytes().len(), "Image received");

        self.advance(SessionState::Recognizing);
        let spooled = match self.ctx.spool.store(self.id, image).await {
            Ok(spooled) => spooled,
            Err(e) => {
                error!(error = %e, spool_dir = %self.ctx.spool.dir().display(), "Failed to spool image");
                return Ok(RecognitionResult::failure(format!("image could not be stored: {e}")));
            }
        };

        let result = self.ctx.recognizer.recognize(spooled.path()).await;
        debug!(recognizer = self.ctx.recognizer.name(), success = result.is_success(), "Recognition finished");
        Ok(result)
    }

    async fn run(mut self) -> SessionOutcome {
        let deadline = self.ctx.limits.session_timeout;

        let result = match tokio::time::timeout(deadline, self.evaluate()).await {
            Ok(Ok(result)) => result,
            Ok(Err(frame)) => return self.abort(SessionAbort::Frame(frame)),
            Err(_) => return self.abort(SessionAbort::TimedOut(deadline)),
        };

        self.advance(SessionState::Deciding);
        let decision = decide(result);

        self.advance(SessionState::Logging);
        let record = NewAuditRecord::new(self.peer.ip(), &decision);
        let audit_id = match append_with_retry(
            self.ctx.store.as_ref(),
            record,
            self.ctx.limits.audit_write_retries,
        )
        .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                error!(error = %e, status = %decision.status, user = %decision.label, "Failed to write audit record");
                None
            }
        };

        self.advance(SessionState::Responding);
        if let Err(e) = write_response(&mut self.stream, &decision).await {
            warn!(error = %e, "Failed to send response");
        }

        self.advance(SessionState::Closed);
        info!(status = %decision.status, user = %decision.label, audit_id = ?audit_id, "Access decision");

        SessionOutcome::Completed { decision, audit_id }
    }

    fn abort(mut self, reason: SessionAbort) -> SessionOutcome {
        debug!(state = ?self.state, reason = %reason, "Session aborted");
        self.state = SessionState::Closed;
        SessionOutcome::Aborted(reason)
    }
}

/// Serve one connection to completion
///
/// The stream is dropped (closing the connection) when this returns.
pub async fn handle_session<S>(stream: S, peer: SocketAddr, ctx: &SessionContext) -> SessionOutcome
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let id = Uuid::new_v4();
    let session = Session {
        id,
        peer,
        stream,
        ctx,
        state: SessionState::AwaitingLength,
    };

    session
        .run()
        .instrument(info_span!("session", session_id = %id, peer = %peer))
        .await
}
