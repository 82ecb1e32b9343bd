use std::fmt;

/// The closed set of in-process message kinds, plus the `Unknown` sentinel
/// used for backwards-compatible label evolution: an `elem` the receiving
/// side doesn't recognize is never an error, it is carried through under
/// its original label so rolling upgrades don't break.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Heartbeat,
    Error,
    ClientRegistryRequest,
    ClientRegistryResponse,
    SquareRequest,
    SquareResponse,
    StartSimulation,
    StopSimulation,
    PauseSimulation,
    ResumeSimulation,
    ResetSimulation,
    GetSimulationStatus,
    StatusUpdate,
    SimulationStarted,
    SimulationStopped,
    SimulationPaused,
    SimulationResumed,
    /// Carries the original `elem` label verbatim.
    Unknown(String),
}

/// The static bidirectional kind <-> `elem` table. Both the broker and the
/// peer library go through this single table; neither hand-rolls its own
/// copy.
const PROTOCOL_TABLE: &[(MessageKindTag, &str)] = &[
    (MessageKindTag::Heartbeat, "heartbeat"),
    (MessageKindTag::Error, "error"),
    (
        MessageKindTag::ClientRegistryRequest,
        "client_registry_request",
    ),
    (
        MessageKindTag::ClientRegistryResponse,
        "client_registry_response",
    ),
    (MessageKindTag::SquareRequest, "square_request"),
    (MessageKindTag::SquareResponse, "square_response"),
    (MessageKindTag::StartSimulation, "start_simulation"),
    (MessageKindTag::StopSimulation, "stop_simulation"),
    (MessageKindTag::PauseSimulation, "pause_simulation"),
    (MessageKindTag::ResumeSimulation, "resume_simulation"),
    (MessageKindTag::ResetSimulation, "reset_simulation"),
    (
        MessageKindTag::GetSimulationStatus,
        "get_simulation_status",
    ),
    (MessageKindTag::StatusUpdate, "status_update"),
    (MessageKindTag::SimulationStarted, "simulation_started"),
    (MessageKindTag::SimulationStopped, "simulation_stopped"),
    (MessageKindTag::SimulationPaused, "simulation_paused"),
    (MessageKindTag::SimulationResumed, "simulation_resumed"),
];

/// Tag-only mirror of `MessageKind` (no payload on `Unknown`), so the table
/// above can be a plain `&[(tag, &str)]` slice instead of allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKindTag {
    Heartbeat,
    Error,
    ClientRegistryRequest,
    ClientRegistryResponse,
    SquareRequest,
    SquareResponse,
    StartSimulation,
    StopSimulation,
    PauseSimulation,
    ResumeSimulation,
    ResetSimulation,
    GetSimulationStatus,
    StatusUpdate,
    SimulationStarted,
    SimulationStopped,
    SimulationPaused,
    SimulationResumed,
}

impl MessageKindTag {
    const fn to_kind(self) -> MessageKind {
        match self {
            MessageKindTag::Heartbeat => MessageKind::Heartbeat,
            MessageKindTag::Error => MessageKind::Error,
            MessageKindTag::ClientRegistryRequest => MessageKind::ClientRegistryRequest,
            MessageKindTag::ClientRegistryResponse => MessageKind::ClientRegistryResponse,
            MessageKindTag::SquareRequest => MessageKind::SquareRequest,
            MessageKindTag::SquareResponse => MessageKind::SquareResponse,
            MessageKindTag::StartSimulation => MessageKind::StartSimulation,
            MessageKindTag::StopSimulation => MessageKind::StopSimulation,
            MessageKindTag::PauseSimulation => MessageKind::PauseSimulation,
            MessageKindTag::ResumeSimulation => MessageKind::ResumeSimulation,
            MessageKindTag::ResetSimulation => MessageKind::ResetSimulation,
            MessageKindTag::GetSimulationStatus => MessageKind::GetSimulationStatus,
            MessageKindTag::StatusUpdate => MessageKind::StatusUpdate,
            MessageKindTag::SimulationStarted => MessageKind::SimulationStarted,
            MessageKindTag::SimulationStopped => MessageKind::SimulationStopped,
            MessageKindTag::SimulationPaused => MessageKind::SimulationPaused,
            MessageKindTag::SimulationResumed => MessageKind::SimulationResumed,
        }
    }
}

impl MessageKind {
    /// Converts a wire `elem` label to a `MessageKind`. Never fails: an
    /// unrecognized label becomes `Unknown(label)` and logs a warning, per
    /// the "backwards-compatible label evolution" design note.
    pub fn from_elem(elem: &str) -> Self {
        for (tag, label) in PROTOCOL_TABLE {
            if *label == elem {
                return tag.to_kind();
            }
        }
        tracing::warn!(elem, "unrecognized elem; surfacing as Unknown");
        MessageKind::Unknown(elem.to_owned())
    }

    /// Converts a `MessageKind` back to its wire `elem` label. `Unknown`
    /// re-emits its original label verbatim so it round-trips through a
    /// broker restart or version skew unchanged.
    pub fn as_elem(&self) -> &str {
        match self {
            MessageKind::Unknown(label) => label.as_str(),
            known => {
                for (tag, label) in PROTOCOL_TABLE {
                    if tag.to_kind() == *known {
                        return label;
                    }
                }
                unreachable!("every non-Unknown MessageKind has a PROTOCOL_TABLE entry")
            }
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_elem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_kind() {
        for (tag, label) in PROTOCOL_TABLE {
            let kind = tag.to_kind();
            assert_eq!(kind.as_elem(), *label);
            assert_eq!(MessageKind::from_elem(label), kind);
        }
    }

    #[test]
    fn unknown_elem_preserves_original_label() {
        let kind = MessageKind::from_elem("future_feature_v7");
        assert_eq!(kind, MessageKind::Unknown("future_feature_v7".to_owned()));
        assert_eq!(kind.as_elem(), "future_feature_v7");
    }
}
