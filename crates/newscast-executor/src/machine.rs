//! Pure playback state machine.
//!
//! [`transition`] maps the current [`PlaybackState`] and an [`Event`] to the
//! next state plus the [`Effect`]s the executor must carry out. Effects with
//! an outcome (creating or starting a resource) report back as new events,
//! so a toggle or restart always resolves through `StartSucceeded`,
//! `StartBlocked` or `StartFailed`.

use newscast_bridge::{Broadcast, PlaybackState};

/// Inputs of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A new commentary was requested for this tab.
    Trigger,
    /// The commentary audio arrived and is now retained.
    Generated,
    GenerationFailed(String),
    StartSucceeded,
    /// The platform refused to start without a user gesture.
    StartBlocked(String),
    StartFailed(String),
    Toggle,
    Stop,
    /// Replay the retained audio. Only valid while audio is retained.
    Restart,
    /// The live resource played to its end.
    Ended,
    /// The live resource failed asynchronously.
    ResourceFailed(String),
}

/// Side effects requested by a transition, carried out in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Abort the in-flight generation, if any, and ignore its result.
    CancelGeneration,
    /// Pause, rewind and clear the live resource, then drop it.
    ReleaseResource,
    /// Forget the retained audio bytes.
    DiscardAsset,
    RequestGeneration,
    /// Build a new resource from the retained audio bytes.
    CreateResource,
    /// Start (or resume) the live resource.
    StartResource,
    PauseResource,
    Broadcast(Broadcast),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: PlaybackState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: PlaybackState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    fn stay(state: PlaybackState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Compute the transition for `event` in `state`. Events that make no sense
/// in a state leave it unchanged and produce no effects.
pub fn transition(state: PlaybackState, event: Event) -> Transition {
    use PlaybackState::*;

    match (state, event) {
        (_, Event::Trigger) => Transition::to(
            Loading,
            vec![
                Effect::CancelGeneration,
                Effect::ReleaseResource,
                Effect::DiscardAsset,
                Effect::RequestGeneration,
            ],
        ),

        (Loading, Event::Generated) => Transition::to(
            Loading,
            vec![
                Effect::ReleaseResource,
                Effect::CreateResource,
                Effect::StartResource,
            ],
        ),
        (Loading, Event::GenerationFailed(error)) => {
            Transition::to(Error, vec![Effect::Broadcast(Broadcast::Error { error })])
        }

        (Loading | NeedsInteraction | Paused | Stopped, Event::StartSucceeded) => {
            Transition::to(Playing, vec![Effect::Broadcast(Broadcast::Started)])
        }
        (Loading | Paused | Stopped, Event::StartBlocked(message)) => Transition::to(
            NeedsInteraction,
            vec![Effect::Broadcast(Broadcast::NeedsUserInteraction { message })],
        ),
        (Loading | NeedsInteraction | Paused | Stopped, Event::StartFailed(error)) => {
            Transition::to(
                Error,
                vec![
                    Effect::ReleaseResource,
                    Effect::Broadcast(Broadcast::Error { error }),
                ],
            )
        }

        (Playing, Event::Ended) => {
            Transition::to(Stopped, vec![Effect::Broadcast(Broadcast::Completed)])
        }

        (Playing, Event::Toggle) => Transition::to(
            Paused,
            vec![
                Effect::PauseResource,
                Effect::Broadcast(Broadcast::Paused),
            ],
        ),
        (Paused | NeedsInteraction, Event::Toggle) => {
            Transition::to(state, vec![Effect::StartResource])
        }

        (Playing | Paused | NeedsInteraction, Event::Stop) => {
            Transition::to(Stopped, vec![Effect::ReleaseResource])
        }
        (Loading, Event::Stop) => Transition::to(Stopped, vec![Effect::CancelGeneration]),

        (Playing | Paused | NeedsInteraction | Stopped | Error, Event::Restart) => Transition::to(
            Stopped,
            vec![
                Effect::ReleaseResource,
                Effect::CreateResource,
                Effect::StartResource,
            ],
        ),

        (Error, Event::ResourceFailed(_)) => Transition::stay(Error),
        (Idle, Event::ResourceFailed(_)) => Transition::stay(Idle),
        (_, Event::ResourceFailed(error)) => Transition::to(
            Error,
            vec![
                Effect::ReleaseResource,
                Effect::Broadcast(Broadcast::Error { error }),
            ],
        ),

        (state, _) => Transition::stay(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackState::*;

    fn broadcasts(transition: &Transition) -> Vec<&Broadcast> {
        transition
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Broadcast(broadcast) => Some(broadcast),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn trigger_tears_down_before_requesting() {
        for state in [Idle, Loading, NeedsInteraction, Playing, Paused, Stopped, Error] {
            let next = transition(state, Event::Trigger);
            assert_eq!(next.state, Loading);
            assert_eq!(
                next.effects,
                vec![
                    Effect::CancelGeneration,
                    Effect::ReleaseResource,
                    Effect::DiscardAsset,
                    Effect::RequestGeneration,
                ]
            );
            assert!(broadcasts(&next).is_empty());
        }
    }

    #[test]
    fn generated_audio_is_started_from_loading() {
        let next = transition(Loading, Event::Generated);
        assert_eq!(next.state, Loading);
        assert_eq!(
            next.effects.last(),
            Some(&Effect::StartResource),
            "the start attempt reports back as a follow-up event"
        );
        assert_eq!(
            transition(Loading, Event::StartSucceeded).effects,
            vec![Effect::Broadcast(Broadcast::Started)]
        );
    }

    #[test]
    fn blocked_autoplay_waits_for_interaction() {
        let next = transition(Loading, Event::StartBlocked("needs a click".into()));
        assert_eq!(next.state, NeedsInteraction);
        assert_eq!(
            broadcasts(&next),
            vec![&Broadcast::NeedsUserInteraction {
                message: "needs a click".into()
            }]
        );

        let toggled = transition(NeedsInteraction, Event::Toggle);
        assert_eq!(toggled.state, NeedsInteraction);
        assert_eq!(toggled.effects, vec![Effect::StartResource]);
        assert_eq!(
            transition(NeedsInteraction, Event::StartSucceeded).state,
            Playing
        );
    }

    #[test]
    fn failures_while_loading_surface_as_errors() {
        let failed = transition(Loading, Event::GenerationFailed("server error".into()));
        assert_eq!(failed.state, Error);
        assert_eq!(
            broadcasts(&failed),
            vec![&Broadcast::Error {
                error: "server error".into()
            }]
        );

        let start_failed = transition(Loading, Event::StartFailed("bad data".into()));
        assert_eq!(start_failed.state, Error);
        assert_eq!(start_failed.effects[0], Effect::ReleaseResource);
    }

    #[test]
    fn toggle_flips_between_playing_and_paused() {
        let paused = transition(Playing, Event::Toggle);
        assert_eq!(paused.state, Paused);
        assert_eq!(broadcasts(&paused), vec![&Broadcast::Paused]);

        let resumed = transition(Paused, Event::Toggle);
        assert_eq!(resumed.effects, vec![Effect::StartResource]);
        let started = transition(Paused, Event::StartSucceeded);
        assert_eq!(started.state, Playing);
        assert_eq!(broadcasts(&started), vec![&Broadcast::Started]);
    }

    #[test]
    fn natural_end_keeps_the_resource() {
        let next = transition(Playing, Event::Ended);
        assert_eq!(next.state, Stopped);
        assert_eq!(next.effects, vec![Effect::Broadcast(Broadcast::Completed)]);
    }

    #[test]
    fn stop_releases_the_resource_but_not_the_asset() {
        for state in [Playing, Paused, NeedsInteraction] {
            let next = transition(state, Event::Stop);
            assert_eq!(next.state, Stopped);
            assert_eq!(next.effects, vec![Effect::ReleaseResource]);
        }
        let early = transition(Loading, Event::Stop);
        assert_eq!(early.state, Stopped);
        assert_eq!(early.effects, vec![Effect::CancelGeneration]);
    }

    #[test]
    fn restart_always_builds_a_fresh_resource() {
        for state in [Playing, Paused, NeedsInteraction, Stopped, Error] {
            let next = transition(state, Event::Restart);
            assert_eq!(next.state, Stopped);
            assert_eq!(
                next.effects,
                vec![
                    Effect::ReleaseResource,
                    Effect::CreateResource,
                    Effect::StartResource,
                ]
            );
        }
        assert_eq!(transition(Stopped, Event::StartSucceeded).state, Playing);
    }

    #[test]
    fn resource_errors_are_reported_once() {
        let failed = transition(Playing, Event::ResourceFailed("decode".into()));
        assert_eq!(failed.state, Error);
        assert_eq!(broadcasts(&failed).len(), 1);

        let again = transition(Error, Event::ResourceFailed("decode".into()));
        assert_eq!(again, Transition::stay(Error));
    }

    #[test]
    fn meaningless_events_change_nothing() {
        assert_eq!(transition(Idle, Event::Toggle), Transition::stay(Idle));
        assert_eq!(transition(Idle, Event::Stop), Transition::stay(Idle));
        assert_eq!(transition(Stopped, Event::Ended), Transition::stay(Stopped));
        assert_eq!(
            transition(Playing, Event::Generated),
            Transition::stay(Playing)
        );
        assert_eq!(
            transition(Error, Event::StartSucceeded),
            Transition::stay(Error)
        );
    }

    #[test]
    fn every_state_change_out_of_loading_broadcasts_exactly_once() {
        let outcomes = [
            Event::GenerationFailed("x".into()),
            Event::StartSucceeded,
            Event::StartBlocked("x".into()),
            Event::StartFailed("x".into()),
        ];
        for event in outcomes {
            let next = transition(Loading, event);
            assert_ne!(next.state, Loading);
            assert_eq!(broadcasts(&next).len(), 1);
        }
    }
}
