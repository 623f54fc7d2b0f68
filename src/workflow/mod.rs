//! Routed specialist workflow.
//!
//! A fixed four-stage graph:
//!
//! ```text
//! coordinator ──ROUTE_TO_SCOUT──▶ external_data_specialist ──┐
//!      │      ──ROUTE_TO_TRAINED─▶ domain_expert_specialist ──┤
//!      └──────────── direct answer ──────────────────────────▶ final_composer
//! ```
//!
//! [`Workflow::step`] is the transition function: it runs the current stage of
//! a [`ConversationState`] and returns the next state. [`Workflow::run`] drives
//! a fresh state from the coordinator to the final composer. Model calls are
//! strictly sequential.
//!
//! Specialist failures never abort a run: they are recorded as
//! [`StageFault`]s and the composer answers from the history it has.

pub mod routing;
mod state;

pub use state::{ConversationState, Specialist, Stage};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::providers::PersonaProviders;
use crate::llm::{ChatMessage, LlmProvider, ProviderError};
use crate::prompts::Personas;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("prompt is empty")]
    EmptyPrompt,

    /// A specialist ran without a routing request addressed to it.
    #[error("no routing request for {0}")]
    MissingRequest(Specialist),

    #[error("upstream model failed: {0}")]
    Upstream(#[from] ProviderError),
}

/// A specialist stage that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFault {
    pub stage: Stage,
    pub message: String,
}

/// Result of one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub reply: String,
    /// Stages visited, in order. Always ends with one `FinalComposer`.
    pub path: Vec<Stage>,
    pub faults: Vec<StageFault>,
}

/// The three personas the workflow talks to.
#[derive(Debug, Clone)]
pub struct Workflow {
    coordinator: LlmProvider,
    scout: LlmProvider,
    trained: LlmProvider,
    personas: Personas,
}

impl Workflow {
    pub fn new(
        coordinator: LlmProvider,
        scout: LlmProvider,
        trained: LlmProvider,
        personas: Personas,
    ) -> Self {
        Self { coordinator, scout, trained, personas }
    }

    pub fn from_providers(providers: &PersonaProviders, personas: Personas) -> Self {
        Self::new(
            providers.coordinator.clone(),
            providers.scout.clone(),
            providers.trained.clone(),
            personas,
        )
    }

    /// Route `prompt` through the graph and return the final reply.
    pub async fn run(
        &self,
        prompt: &str,
        context: Option<String>,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(WorkflowError::EmptyPrompt);
        }

        let mut state = ConversationState::new(prompt, context);
        let mut path = Vec::with_capacity(3);
        let mut faults = Vec::new();

        loop {
            let stage = state.stage();
            path.push(stage);
            debug!(%stage, "workflow stage");

            match self.step(state).await {
                Ok(next) => state = next,
                Err(StepFailure::Fatal(e)) => return Err(e),
                Err(StepFailure::Skipped(next, e)) => {
                    warn!(%stage, error = %e, "specialist stage failed, composing without it");
                    faults.push(StageFault { stage, message: e.to_string() });
                    state = next;
                }
            }

            if stage == Stage::FinalComposer {
                break;
            }
        }

        let reply = state
            .final_response()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Request("empty final answer".into()))?;

        info!(
            path = ?path.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            faults = faults.len(),
            "workflow complete"
        );
        Ok(WorkflowOutcome { reply, path, faults })
    }

    /// Run the current stage of `state` and return the next state.
    pub async fn step(&self, state: ConversationState) -> Result<ConversationState, StepFailure> {
        match state.stage() {
            Stage::Coordinator => {
                let reply = self.coordinate(&state).await.map_err(StepFailure::Fatal)?;
                Ok(state.route(routing::parse(&reply)))
            }
            stage @ (Stage::ExternalDataSpecialist | Stage::DomainExpertSpecialist) => {
                let Some(specialist) = stage.specialist() else {
                    return Ok(state.skip_specialist());
                };
                match self.consult(specialist, &state).await {
                    Ok(report) => Ok(state.with_report(specialist, &report)),
                    Err(e) => Err(StepFailure::Skipped(state.skip_specialist(), e)),
                }
            }
            Stage::FinalComposer => {
                if state.final_response().is_some() {
                    return Ok(state);
                }
                let reply = self.compose(&state).await.map_err(StepFailure::Fatal)?;
                Ok(state.finish(reply))
            }
        }
    }

    async fn coordinate(&self, state: &ConversationState) -> Result<String, WorkflowError> {
        let user = state.latest_user_message();
        let system = self.personas.coordinator(state.context().unwrap_or(""), user);
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        Ok(self.coordinator.complete(&messages).await?)
    }

    async fn consult(
        &self,
        specialist: Specialist,
        state: &ConversationState,
    ) -> Result<String, WorkflowError> {
        let request = state
            .routing_request(specialist)
            .ok_or(WorkflowError::MissingRequest(specialist))?;

        let (provider, system) = match specialist {
            Specialist::Scout => (&self.scout, self.personas.scout(&request)),
            Specialist::Trained => (&self.trained, self.personas.trained(&request)),
        };
        info!(%specialist, model = provider.model(), "consulting specialist");

        let messages = [ChatMessage::system(system), ChatMessage::user(request)];
        Ok(provider.complete(&messages).await?)
    }

    async fn compose(&self, state: &ConversationState) -> Result<String, WorkflowError> {
        let system = self.personas.final_composer(&state.history());
        let messages = [
            ChatMessage::system(system),
            ChatMessage::user(state.original_user_message()),
        ];
        Ok(self.coordinator.complete(&messages).await?)
    }
}

/// Why [`Workflow::step`] could not advance normally.
#[derive(Debug)]
pub enum StepFailure {
    /// The run cannot continue.
    Fatal(WorkflowError),
    /// The stage was skipped; the state has already moved on.
    Skipped(ConversationState, WorkflowError),
}
