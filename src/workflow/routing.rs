//! Coordinator reply parsing. This is the only place model free text is
//! inspected for routing markers.

use super::state::Specialist;

/// What the coordinator decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Hand off to a specialist with the reply text (markers removed) as the request.
    Route { specialist: Specialist, request: String },
    /// The reply is the final answer.
    Answer(String),
}

/// Classify a coordinator reply. External data wins when both markers appear.
pub fn parse(reply: &str) -> Decision {
    let specialist = [Specialist::Scout, Specialist::Trained]
        .into_iter()
        .find(|s| reply.contains(s.marker()));

    match specialist {
        Some(specialist) => Decision::Route { specialist, request: strip_markers(reply) },
        None => Decision::Answer(reply.to_string()),
    }
}

fn strip_markers(reply: &str) -> String {
    let mut text = reply.to_string();
    for s in [Specialist::Scout, Specialist::Trained] {
        text = text.replace(s.marker(), "");
    }
    text.trim().to_string()
}
