//! Synthesis capture lifecycle.
//!
//! `Arming → Pending → Speaking → Finalizing → Completed`, with `Failed`
//! reachable from any non-terminal state. The first engine end/error signal
//! wins; once the machine left `Pending`/`Speaking` for a terminal path,
//! later engine signals are ignored.

use uuid::Uuid;

use crate::error::SynthesisError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Recorder is being armed on the context stream.
    Arming { session_id: Uuid },
    /// Synthesis requested, engine has not reported start yet.
    Pending { session_id: Uuid },
    Speaking { session_id: Uuid },
    /// Engine ended; recorder stopped, blob being assembled.
    Finalizing { session_id: Uuid },
    Completed { session_id: Uuid },
    Failed { session_id: Uuid, error: SynthesisError },
}

impl State {
    pub fn new(session_id: Uuid) -> Self {
        State::Arming { session_id }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            State::Arming { session_id }
            | State::Pending { session_id }
            | State::Speaking { session_id }
            | State::Finalizing { session_id }
            | State::Completed { session_id }
            | State::Failed { session_id, .. } => *session_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Completed { .. } | State::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    RecorderArmed { id: Uuid },
    EngineStarted { id: Uuid },
    EngineEnded { id: Uuid },
    EngineFailed { id: Uuid, err: String },
    /// The engine dropped its signal channel without end/error.
    EngineVanished { id: Uuid },
    FinalizeOk { id: Uuid },
    FinalizeFail { id: Uuid, err: SynthesisError },
}

impl Event {
    fn id(&self) -> Uuid {
        match self {
            Event::RecorderArmed { id }
            | Event::EngineStarted { id }
            | Event::EngineEnded { id }
            | Event::EngineFailed { id, .. }
            | Event::EngineVanished { id }
            | Event::FinalizeOk { id }
            | Event::FinalizeFail { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartSynthesis,
    StopRecorder,
    CloseContext,
    /// Concatenate recorded chunks into the result blob.
    Finalize,
    DiscardPartial,
    Resolve,
    Reject(SynthesisError),
}

fn fail(session_id: Uuid, error: SynthesisError) -> (State, Vec<Effect>) {
    (
        State::Failed {
            session_id,
            error: error.clone(),
        },
        vec![
            Effect::StopRecorder,
            Effect::CloseContext,
            Effect::DiscardPartial,
            Effect::Reject(error),
        ],
    )
}

/// Reducer: (state, event) -> (next_state, effects)
pub fn reduce(state: &State, event: Event) -> (State, Vec<Effect>) {
    use Event::*;

    let session_id = state.session_id();
    if event.id() != session_id {
        log::debug!("Dropping stale synthesis event for session {}", event.id());
        return (state.clone(), vec![]);
    }

    match (state, event) {
        (State::Arming { .. }, RecorderArmed { .. }) => (
            State::Pending { session_id },
            vec![Effect::StartSynthesis],
        ),

        (State::Pending { .. }, EngineStarted { .. }) => (State::Speaking { session_id }, vec![]),

        // Engines may skip the start signal for very short utterances.
        (State::Pending { .. } | State::Speaking { .. }, EngineEnded { .. }) => (
            State::Finalizing { session_id },
            vec![Effect::StopRecorder, Effect::CloseContext, Effect::Finalize],
        ),

        (
            State::Arming { .. } | State::Pending { .. } | State::Speaking { .. },
            EngineFailed { err, .. },
        ) => fail(session_id, SynthesisError::EngineFailed(err)),

        (State::Arming { .. } | State::Pending { .. } | State::Speaking { .. }, EngineVanished { .. }) => {
            fail(session_id, SynthesisError::EngineVanished)
        }

        (State::Finalizing { .. }, FinalizeOk { .. }) => {
            (State::Completed { session_id }, vec![Effect::Resolve])
        }
        (State::Finalizing { .. }, FinalizeFail { err, .. }) => (
            State::Failed {
                session_id,
                error: err.clone(),
            },
            vec![Effect::DiscardPartial, Effect::Reject(err)],
        ),

        // Duplicate or late engine signals after the first terminal signal.
        (
            State::Finalizing { .. } | State::Completed { .. } | State::Failed { .. },
            ev @ (EngineEnded { .. } | EngineFailed { .. } | EngineVanished { .. } | EngineStarted { .. }),
        ) => {
            log::debug!("Ignoring engine signal after completion: {:?}", ev);
            (state.clone(), vec![])
        }

        (_, ev) => {
            log::debug!("Unhandled synthesis event in {:?}: {:?}", state, ev);
            (state.clone(), vec![])
        }
    }
}
