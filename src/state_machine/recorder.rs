//! Recorder lifecycle: `Idle → Recording → Finalizing → Idle`, or
//! `Idle → Recording → Failed → Idle` when the device fails.

use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub enum State {
    #[default]
    Idle,
    Recording {
        session_id: Uuid,
        started_at: Instant,
    },
    Finalizing {
        session_id: Uuid,
    },
    Failed {
        session_id: Uuid,
        message: String,
    },
}

impl State {
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            State::Idle => None,
            State::Recording { session_id, .. }
            | State::Finalizing { session_id }
            | State::Failed { session_id, .. } => Some(*session_id),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, State::Idle)
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    /// User asked to start recording.
    Start,
    /// User asked to stop recording.
    Stop,
    /// View went away; drop everything.
    Cancel,
    /// Opening the device failed.
    DeviceFail { id: Uuid, err: String },
    /// Blob assembly finished.
    FinalizeOk { id: Uuid },
    FinalizeFail { id: Uuid, err: String },
    /// The failure has been reported to the caller.
    Acknowledge { id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenDevice { id: Uuid },
    CloseDevice { id: Uuid },
    /// Stop the stream and assemble the blob.
    Finalize { id: Uuid },
    /// Hand the finished blob to the completion.
    Deliver { id: Uuid },
    ReportFailure { id: Uuid, message: String },
    /// Throw away whatever was captured.
    Discard { id: Uuid },
}

/// Reducer: (state, event) -> (next_state, effects)
///
/// - Start while a session exists is rejected (no second capture)
/// - Stop while idle produces nothing
/// - Events with a stale session id are ignored
pub fn reduce(state: &State, event: Event) -> (State, Vec<Effect>) {
    use Effect::*;
    use Event::*;

    let current_id = state.session_id();
    let is_stale = |eid: Uuid| Some(eid) != current_id;

    match (state, event) {
        // -----------------
        // Idle
        // -----------------
        (State::Idle, Start) => {
            let id = Uuid::new_v4();
            (
                State::Recording {
                    session_id: id,
                    started_at: Instant::now(),
                },
                vec![OpenDevice { id }],
            )
        }
        (State::Idle, Stop) | (State::Idle, Cancel) => (State::Idle, vec![]),

        // -----------------
        // Recording
        // -----------------
        (State::Recording { .. }, Start) => {
            log::warn!("Start ignored: a recording is already in progress");
            (state.clone(), vec![])
        }
        (State::Recording { session_id, .. }, Stop) => (
            State::Finalizing {
                session_id: *session_id,
            },
            vec![Finalize { id: *session_id }],
        ),
        (State::Recording { session_id, .. }, DeviceFail { id, err }) if *session_id == id => (
            State::Failed {
                session_id: id,
                message: err.clone(),
            },
            vec![CloseDevice { id }, ReportFailure { id, message: err }],
        ),
        (State::Recording { session_id, .. }, Cancel) => (
            State::Idle,
            vec![CloseDevice { id: *session_id }, Discard { id: *session_id }],
        ),

        // -----------------
        // Finalizing
        // -----------------
        (State::Finalizing { session_id }, FinalizeOk { id }) if *session_id == id => {
            (State::Idle, vec![Deliver { id }])
        }
        (State::Finalizing { session_id }, FinalizeFail { id, err }) if *session_id == id => (
            State::Failed {
                session_id: id,
                message: err.clone(),
            },
            vec![Discard { id }, ReportFailure { id, message: err }],
        ),
        (State::Finalizing { session_id }, Cancel) => {
            (State::Idle, vec![Discard { id: *session_id }])
        }

        // -----------------
        // Failed
        // -----------------
        (State::Failed { session_id, .. }, Acknowledge { id }) if *session_id == id => {
            (State::Idle, vec![])
        }
        (State::Failed { .. }, Cancel) => (State::Idle, vec![]),

        // -----------------
        // Stale events (drop silently)
        // -----------------
        (_, DeviceFail { id, .. })
        | (_, FinalizeOk { id })
        | (_, FinalizeFail { id, .. })
        | (_, Acknowledge { id })
            if is_stale(id) =>
        {
            log::debug!("Dropping stale recorder event for session {}", id);
            (state.clone(), vec![])
        }

        // -----------------
        // Unhandled: no transition
        // -----------------
        _ => (state.clone(), vec![]),
    }
}
