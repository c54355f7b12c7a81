use thiserror::Error;
use tracing::debug;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::dialog::states::{
    DialogAction, DialogEvent, DialogState, ListPhase, PendingContext, Prompt, Signal,
    TransitionOutcome,
};
use crate::domain::catalog::{MatchSet, MediaKind};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogTransitionError {
    #[error("reply `{}` is not expected in state {state:?}", signal.as_str())]
    InvalidTransition { state: DialogState, signal: Signal },
}

/// Owns the pending context of one conversation and applies events to it.
///
/// A rejected event leaves the pending context untouched.
#[derive(Clone, Debug, Default)]
pub struct DialogEngine {
    pending: PendingContext,
}

impl DialogEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DialogState {
        self.pending.state()
    }

    pub fn pending(&self) -> &PendingContext {
        &self.pending
    }

    /// Drops whatever is pending without speaking.
    pub fn reset(&mut self) {
        self.pending = PendingContext::None;
    }

    pub fn apply(
        &mut self,
        event: DialogEvent,
    ) -> Result<TransitionOutcome, DialogTransitionError> {
        let from = self.pending.state();
        let (next, actions) = transition(&self.pending, &event)?;

        let starts_new_context =
            matches!(event, DialogEvent::Resolved { .. } | DialogEvent::PlaylistOffered { .. });
        if starts_new_context && !self.pending.is_idle() {
            debug!(
                event_name = "dialog.context_replaced",
                previous_state = ?from,
                "new request replaced the pending dialog context"
            );
        }

        self.pending = next;
        Ok(TransitionOutcome { from, to: self.pending.state(), event, actions })
    }

    pub fn apply_with_audit<S>(
        &mut self,
        event: DialogEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, DialogTransitionError>
    where
        S: AuditSink,
    {
        let event_name = event.name();
        let result = self.apply(event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "dialog.transition_applied",
                        AuditCategory::Dialog,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", event_name)
                    .with_metadata("action_count", outcome.actions.len().to_string()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "dialog.transition_rejected",
                        AuditCategory::Dialog,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("event", event_name)
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

fn transition(
    current: &PendingContext,
    event: &DialogEvent,
) -> Result<(PendingContext, Vec<DialogAction>), DialogTransitionError> {
    use DialogAction::{PlayCinemavision, PlayEntry, PlayUrl, Speak};
    use Signal::{Cancel, Next, No, Play, Stop, Yes};

    let signal = match event {
        DialogEvent::Resolved { matches, cinemavision_available } => {
            return Ok(resolved(matches, *cinemavision_available));
        }
        DialogEvent::PlaylistOffered { links } => {
            return Ok((
                PendingContext::PlaylistChoice { links: links.clone() },
                vec![Speak(Prompt::PlaylistQuestion)],
            ));
        }
        DialogEvent::Signal(signal) => *signal,
    };

    let cancelled = || (PendingContext::None, vec![Speak(Prompt::Cancelled)]);

    let next = match (current, signal) {
        (_, Cancel) => cancelled(),
        (PendingContext::NavigateList { items, cursor, phase: ListPhase::Offered }, Yes) => (
            PendingContext::NavigateList {
                items: items.clone(),
                cursor: *cursor,
                phase: ListPhase::Browsing,
            },
            vec![Speak(item_prompt(items, *cursor))],
        ),
        (PendingContext::NavigateList { phase: ListPhase::Offered, .. }, No | Stop) => cancelled(),
        (PendingContext::NavigateList { items, cursor, phase: ListPhase::Browsing }, Next) => {
            let advanced = cursor + 1;
            if advanced < items.len() {
                (
                    PendingContext::NavigateList {
                        items: items.clone(),
                        cursor: advanced,
                        phase: ListPhase::Browsing,
                    },
                    vec![Speak(item_prompt(items, advanced))],
                )
            } else {
                (PendingContext::None, vec![Speak(Prompt::ListEnd)])
            }
        }
        (PendingContext::NavigateList { items, cursor, phase: ListPhase::Browsing }, Play) => {
            match items.get(*cursor) {
                Some(entry) => (
                    PendingContext::None,
                    vec![PlayEntry { id: entry.id, kind: entry.kind, label: entry.label.clone() }],
                ),
                None => (PendingContext::None, vec![Speak(Prompt::ListEnd)]),
            }
        }
        (PendingContext::NavigateList { phase: ListPhase::Browsing, .. }, Stop) => cancelled(),
        (PendingContext::CinemavisionChoice { movie_id, label }, Yes) => (
            PendingContext::None,
            vec![PlayCinemavision { movie_id: *movie_id, label: label.clone() }],
        ),
        (PendingContext::CinemavisionChoice { movie_id, label }, No) => (
            PendingContext::None,
            vec![PlayEntry { id: *movie_id, kind: MediaKind::Movie, label: label.clone() }],
        ),
        (PendingContext::PlaylistChoice { links }, Yes) => {
            (PendingContext::None, vec![PlayUrl { url: links.playlist_url() }])
        }
        (PendingContext::PlaylistChoice { links }, No) => {
            (PendingContext::None, vec![PlayUrl { url: links.single_url() }])
        }
        (
            PendingContext::CinemavisionChoice { .. } | PendingContext::PlaylistChoice { .. },
            Stop,
        ) => cancelled(),
        (context, signal) => {
            return Err(DialogTransitionError::InvalidTransition { state: context.state(), signal });
        }
    };

    Ok(next)
}

fn resolved(
    matches: &MatchSet,
    cinemavision_available: bool,
) -> (PendingContext, Vec<DialogAction>) {
    match matches.len() {
        0 => (PendingContext::None, vec![DialogAction::Speak(Prompt::NoResults)]),
        1 => {
            let Some(entry) = matches.first() else {
                return (PendingContext::None, vec![DialogAction::Speak(Prompt::NoResults)]);
            };
            if entry.kind == MediaKind::Movie && cinemavision_available {
                (
                    PendingContext::CinemavisionChoice {
                        movie_id: entry.id,
                        label: entry.label.clone(),
                    },
                    vec![DialogAction::Speak(Prompt::CinemavisionQuestion {
                        label: entry.label.clone(),
                    })],
                )
            } else {
                (
                    PendingContext::None,
                    vec![DialogAction::PlayEntry {
                        id: entry.id,
                        kind: entry.kind,
                        label: entry.label.clone(),
                    }],
                )
            }
        }
        count => (
            PendingContext::NavigateList {
                items: matches.clone(),
                cursor: 0,
                phase: ListPhase::Offered,
            },
            vec![DialogAction::Speak(Prompt::ResultsFound { count })],
        ),
    }
}

fn item_prompt(items: &MatchSet, cursor: usize) -> Prompt {
    match items.get(cursor) {
        Some(entry) => Prompt::ItemLabel {
            label: entry.label.clone(),
            position: cursor + 1,
            total: items.len(),
        },
        None => Prompt::ListEnd,
    }
}
