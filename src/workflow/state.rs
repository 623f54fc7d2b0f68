use std::fmt;

use crate::llm::{ChatMessage, Role};

use super::routing::Decision;

/// Workflow stages. `FinalComposer` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Coordinator,
    ExternalDataSpecialist,
    DomainExpertSpecialist,
    FinalComposer,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Coordinator => "coordinator",
            Stage::ExternalDataSpecialist => "external_data_specialist",
            Stage::DomainExpertSpecialist => "domain_expert_specialist",
            Stage::FinalComposer => "final_composer",
        }
    }

    /// The specialist that runs at this stage, if any.
    pub fn specialist(self) -> Option<Specialist> {
        match self {
            Stage::ExternalDataSpecialist => Some(Specialist::Scout),
            Stage::DomainExpertSpecialist => Some(Specialist::Trained),
            Stage::Coordinator | Stage::FinalComposer => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two specialist personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specialist {
    /// External / live data.
    Scout,
    /// Domain expertise.
    Trained,
}

impl Specialist {
    pub fn name(self) -> &'static str {
        match self {
            Specialist::Scout => "Scout",
            Specialist::Trained => "Trained",
        }
    }

    /// Marker the coordinator emits to request this specialist.
    pub fn marker(self) -> &'static str {
        match self {
            Specialist::Scout => "ROUTE_TO_SCOUT",
            Specialist::Trained => "ROUTE_TO_TRAINED",
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            Specialist::Scout => Stage::ExternalDataSpecialist,
            Specialist::Trained => Stage::DomainExpertSpecialist,
        }
    }

    fn routing_prefix(self) -> &'static str {
        match self {
            Specialist::Scout => "James routing to Scout:",
            Specialist::Trained => "James routing to Trained:",
        }
    }

    fn report_prefix(self) -> &'static str {
        match self {
            Specialist::Scout => "Scout report:",
            Specialist::Trained => "Expert analysis:",
        }
    }
}

impl fmt::Display for Specialist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-request conversation state, threaded by value through the stages.
///
/// A single `pending` slot holds the outstanding specialist request, so at
/// most one specialist can be waiting at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    stage: Stage,
    pending: Option<Specialist>,
    final_response: Option<String>,
    context: Option<String>,
}

impl ConversationState {
    /// Fresh state at the coordinator stage.
    pub fn new(prompt: impl Into<String>, context: Option<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            stage: Stage::Coordinator,
            pending: None,
            final_response: None,
            context: context.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Same conversation, forced to `stage`. Used to drive a stage out of
    /// its normal order.
    pub fn at_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    pub fn pending(&self) -> Option<Specialist> {
        self.pending
    }

    pub fn needs_external_data(&self) -> bool {
        self.pending == Some(Specialist::Scout)
    }

    pub fn needs_domain_expert(&self) -> bool {
        self.pending == Some(Specialist::Trained)
    }

    /// Most recent user message.
    pub fn latest_user_message(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// First user message; the question the final reply answers.
    pub fn original_user_message(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// The request recorded for `specialist`, if the coordinator routed to it.
    pub fn routing_request(&self, specialist: Specialist) -> Option<String> {
        let prefix = specialist.routing_prefix();
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .find_map(|m| m.content.strip_prefix(prefix))
            .map(|rest| rest.trim().to_string())
            .filter(|rest| !rest.is_empty())
    }

    /// Whole conversation as `User: ...` / `System: ...` lines.
    pub fn history(&self) -> String {
        self.messages
            .iter()
            .map(|m| {
                let who = if m.role == Role::User { "User" } else { "System" };
                format!("{who}: {}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Coordinator transition.
    pub fn route(mut self, decision: Decision) -> Self {
        match decision {
            Decision::Route { specialist, request } => {
                let request = if request.is_empty() {
                    self.latest_user_message().to_string()
                } else {
                    request
                };
                self.messages.push(ChatMessage::assistant(format!(
                    "{} {request}",
                    specialist.routing_prefix()
                )));
                self.pending = Some(specialist);
                self.stage = specialist.stage();
            }
            Decision::Answer(answer) => {
                self.final_response = Some(answer);
                self.stage = Stage::FinalComposer;
            }
        }
        self
    }

    /// Specialist transition: record the report and move to the composer.
    pub fn with_report(mut self, specialist: Specialist, report: &str) -> Self {
        self.messages.push(ChatMessage::assistant(format!(
            "{} {report}",
            specialist.report_prefix()
        )));
        self.skip_specialist()
    }

    /// Specialist transition without a report.
    pub fn skip_specialist(mut self) -> Self {
        self.pending = None;
        self.stage = Stage::FinalComposer;
        self
    }

    /// Terminal transition.
    pub fn finish(mut self, reply: String) -> Self {
        self.final_response = Some(reply);
        self.stage = Stage::FinalComposer;
        self
    }
}
