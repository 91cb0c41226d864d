//! One chat session: transcript ownership and the idle/loading request lifecycle.
//!
//! `submit` is the only mutator. While a request is outstanding further submits are
//! ignored, which is what keeps assistant turns in call order. Every completed request
//! appends exactly one assistant turn, either the relay's reply or a canned fallback.
//! A submit future dropped mid-request settles the same way, with the fallback.
//! After `close` the pending reply (if any) is dropped and nothing changes again.

use std::sync::{Arc, Mutex, MutexGuard};

use grace_core::Turn;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::fallback::{self, FallbackCategory};
use crate::transcript::Transcript;
use crate::transport::RelayTransport;

pub const DEFAULT_GREETING: &str =
    "Hi! I'm Grace, Guardian's claims specialist. How can I help you today?";

pub const QUICK_ACTIONS: [&str; 4] = [
    "I have storm damage",
    "How do insurance claims work?",
    "Schedule an inspection",
    "What will I pay?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

/// What a host renders: the transcript and whether a reply is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub transcript: Transcript,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Blank after trimming.
    Empty,
    /// Another submission is still loading.
    Busy,
    /// The conversation was closed.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The relay answered; its reply was appended.
    Replied,
    /// The relay failed; a canned reply for this category was appended.
    FellBack(FallbackCategory),
    /// Nothing was appended and no request was made.
    Ignored(IgnoreReason),
    /// Closed while waiting; the reply was discarded.
    Abandoned,
}

struct Session {
    transcript: Transcript,
    phase: Phase,
}

impl Session {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            transcript: self.transcript.clone(),
            phase: self.phase,
        }
    }
}

pub struct Conversation {
    transport: Arc<dyn RelayTransport>,
    session: Mutex<Session>,
    updates: watch::Sender<Snapshot>,
    closed: CancellationToken,
}

impl Conversation {
    pub fn new(transport: Arc<dyn RelayTransport>, greeting: Option<&str>) -> Self {
        let transcript = match greeting {
            Some(g) => Transcript::with_greeting(g),
            None => Transcript::new(),
        };
        let session = Session {
            transcript,
            phase: Phase::Idle,
        };
        let (updates, _) = watch::channel(session.snapshot());

        Self {
            transport,
            session: Mutex::new(session),
            updates,
            closed: CancellationToken::new(),
        }
    }

    pub fn with_default_greeting(transport: Arc<dyn RelayTransport>) -> Self {
        Self::new(transport, Some(DEFAULT_GREETING))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session().snapshot()
    }

    /// Receiver that sees every transcript/phase change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.session().phase == Phase::Loading
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Unmount: abandon any pending reply and refuse further submits.
    /// The in-flight network call itself is not cancelled, only its result.
    pub fn close(&self) {
        let _session = self.session();
        self.closed.cancel();
        tracing::debug!("Conversation closed");
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::Empty);
        }

        let outbound = {
            let mut session = self.session();
            if self.closed.is_cancelled() {
                return SubmitOutcome::Ignored(IgnoreReason::Closed);
            }
            if session.phase == Phase::Loading {
                tracing::debug!("Submit ignored while a reply is pending");
                return SubmitOutcome::Ignored(IgnoreReason::Busy);
            }

            session.transcript.push(Turn::user(text));
            session.phase = Phase::Loading;
            self.publish(&session);
            session.transcript.outbound().to_vec()
        };
        let mut in_flight = InFlight {
            conversation: self,
            text,
            armed: true,
        };

        let result = tokio::select! {
            _ = self.closed.cancelled() => {
                tracing::debug!("Reply abandoned: conversation closed while loading");
                return SubmitOutcome::Abandoned;
            }
            result = self.transport.send(&outbound) => result,
        };
        in_flight.armed = false;

        let mut session = self.session();
        if self.closed.is_cancelled() {
            return SubmitOutcome::Abandoned;
        }

        let (reply, outcome) = match result {
            Ok(reply) => (reply, SubmitOutcome::Replied),
            Err(e) => {
                let (category, canned) = fallback::reply_for(text);
                tracing::warn!(
                    error = %e,
                    %category,
                    "Relay unavailable — substituting canned reply"
                );
                (canned.to_string(), SubmitOutcome::FellBack(category))
            }
        };

        session.transcript.push(Turn::assistant(reply));
        session.phase = Phase::Idle;
        self.publish(&session);

        outcome
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // Session is only mutated in short non-panicking sections; a poisoned
        // lock still holds a consistent transcript.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, session: &Session) {
        self.updates.send_replace(session.snapshot());
    }
}

/// Settles a submit whose future is dropped while its request is outstanding,
/// e.g. by a task abort or a losing `select!` branch. No-op once closed.
struct InFlight<'a> {
    conversation: &'a Conversation,
    text: &'a str,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.conversation.session();
        if self.conversation.closed.is_cancelled() {
            return;
        }

        let (category, canned) = fallback::reply_for(self.text);
        tracing::debug!(%category, "Submit dropped while loading; substituting canned reply");
        session.transcript.push(Turn::assistant(canned));
        session.phase = Phase::Idle;
        self.conversation.publish(&session);
    }
}
