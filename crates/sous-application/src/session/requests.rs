//! Ticketed request lifecycle.
//!
//! Each backend operation is a `begin_*`/`complete_*` pair. `begin_*`
//! validates the action against the current view, records a pending
//! [`RequestTicket`], and returns everything the backend call needs.
//! `complete_*` applies the response only while that ticket is still the live
//! one for its kind; otherwise the response is discarded.

use sous_core::SousError;
use sous_core::agent_log::{AgentLogEntry, LogLevel};
use sous_core::backend::{ChatAnswer, FetchedDetail, GeneratedOptions, StepExplanation};
use sous_core::conversation::{ConversationContext, ConversationMessage};
use sous_core::cooking::CookingStep;
use sous_core::error::Result;
use sous_core::meal::MealRequest;
use sous_core::recipe::{ProfileData, RecipeDetail, UserProfile};
use sous_core::session::{RequestKind, RequestTicket, View};

use super::machine::{OverlaySlot, RecipeSelection, SessionStateMachine};

const EXPLAINER_ACTOR: &str = "Step Explainer";
const CHAT_ACTOR: &str = "Recipe Chat";

/// Outcome of a `complete_*` call that did not surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response was applied to session state.
    Applied,
    /// The owning state was torn down; the response was dropped.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsRequest {
    pub ticket: RequestTicket,
    pub meal: MealRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub ticket: RequestTicket,
    pub user_profile: UserProfile,
    pub dish_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainRequest {
    pub ticket: RequestTicket,
    pub instruction_text: String,
    pub recipe_context: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub ticket: RequestTicket,
    pub recipe_context: String,
    pub anchor_step: Option<CookingStep>,
    pub transcript: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDataRequest {
    pub ticket: RequestTicket,
}

impl SessionStateMachine {
    // ============================================================================
    // Recipe options: Requesting → Selecting
    // ============================================================================

    /// Validates the meal form and issues the "generate options" request.
    ///
    /// # Errors
    ///
    /// [`SousError::Validation`] for an incomplete form, and
    /// [`SousError::RequestPending`] while a previous submission is in flight.
    /// Neither changes any state.
    pub fn begin_generate_options(&mut self) -> Result<OptionsRequest> {
        self.require_view(View::Requesting, "submit a meal request")?;
        self.log.user_action("Submit meal request");
        self.log.info("New request initiated...");

        let meal = match self.form.to_request() {
            Ok(meal) => meal,
            Err(err) => return Err(self.fail(err)),
        };
        let ticket = self.issue(RequestKind::GenerateOptions, None)?;

        tracing::info!(
            "[Session] Requesting recipe options for {} ({} chars of custom text)",
            meal.meal_type(),
            meal.free_text().len()
        );
        self.log.info("Input validated. Submitting to backend...");
        Ok(OptionsRequest { ticket, meal })
    }

    /// Applies the "generate options" response.
    ///
    /// On success the profile and options are replaced together and the
    /// session moves to `Selecting`. On failure nothing changes and the error
    /// is returned.
    pub fn complete_generate_options(
        &mut self,
        ticket: RequestTicket,
        result: Result<GeneratedOptions>,
    ) -> Result<Completion> {
        if !self.settle(&ticket) {
            return Ok(Completion::Discarded);
        }

        let outcome = match result {
            Ok(generated) if generated.recipe_options.is_empty() => {
                self.log.extend(generated.agent_logs);
                Err(SousError::transport(
                    None,
                    "The backend returned no recipe options.",
                ))
            }
            Ok(generated) => {
                self.log.extend(generated.agent_logs);
                let count = generated.recipe_options.len();
                self.user_profile = Some(generated.user_profile);
                self.options = generated.recipe_options;
                self.enter_view(View::Selecting);
                self.log.success(format!("Received {count} recipe options."));
                Ok(Completion::Applied)
            }
            Err(err) => Err(err),
        };

        let outcome = outcome.map_err(|err| self.fail(err));
        self.log.info("Process complete. Ready for new input.");
        outcome
    }

    // ============================================================================
    // Recipe detail: Selecting → Detail
    // ============================================================================

    /// Selects the option titled `title`, moves to `Detail`, and issues the
    /// detail request.
    pub fn begin_fetch_detail(&mut self, title: &str) -> Result<DetailRequest> {
        self.require_view(View::Selecting, "select a recipe")?;
        self.log.user_action(format!("Selected recipe: {title}"));

        let Some(option) = self.options.iter().find(|o| o.title == title).cloned() else {
            return Err(self.fail(SousError::validation(format!(
                "No recipe option named '{title}'."
            ))));
        };
        let Some(user_profile) = self.user_profile.clone() else {
            return Err(self.fail(SousError::internal(
                "recipe options are present without a user profile",
            )));
        };

        self.enter_view(View::Detail);
        self.selection = Some(RecipeSelection::loading(option));
        let ticket = self.issue(RequestKind::FetchDetail, None)?;

        tracing::info!("[Session] Fetching recipe detail for '{}'", title);
        Ok(DetailRequest {
            ticket,
            user_profile,
            dish_title: title.to_string(),
        })
    }

    /// Applies the detail response and runs section extraction.
    ///
    /// On failure the `Detail` view keeps an inline error and no detail.
    pub fn complete_fetch_detail(
        &mut self,
        ticket: RequestTicket,
        result: Result<FetchedDetail>,
    ) -> Result<Completion> {
        if !self.settle(&ticket) {
            return Ok(Completion::Discarded);
        }
        let Some(selection) = self.selection.as_mut() else {
            return Err(self.fail(SousError::internal("detail response without a selection")));
        };

        match result {
            Ok(fetched) => {
                let detail = RecipeDetail {
                    title: selection.option.title.clone(),
                    raw_content: fetched.recipe_html,
                    hero_image_url: fetched.hero_image_url,
                };
                let sections = self.extractor.extract(&detail.raw_content);
                let missing = sections.missing();
                selection.detail = Some(detail);
                selection.sections = Some(sections);
                selection.error = None;

                self.log.extend(fetched.agent_logs);
                for section in missing {
                    self.fail(SousError::extraction(section.placeholder()));
                }
                self.log.success("Recipe detail loaded.");
                Ok(Completion::Applied)
            }
            Err(err) => {
                selection.error = Some(err.to_string());
                Err(self.fail(err))
            }
        }
    }

    // ============================================================================
    // Step explanation overlay
    // ============================================================================

    /// Opens a fresh explanation overlay for `step` and issues its single
    /// request. Any previous explanation is discarded first.
    ///
    /// The step is passed explicitly and frozen into the conversation.
    pub fn begin_explanation(&mut self, step: CookingStep) -> Result<ExplainRequest> {
        let recipe_text = self.require_overlay_context("explain a step")?;
        self.discard_explanation();
        self.log.user_action(format!("Explain step {}", step.number));

        let mut context = ConversationContext::explanation(step.instruction.clone(), recipe_text.clone())
            .with_anchor(step.clone());
        context.begin_explanation()?;
        let instance = self.allocate_instance();
        self.explanation = Some(OverlaySlot { instance, context });
        let ticket = self.issue(RequestKind::ExplainStep, Some(instance))?;

        Ok(ExplainRequest {
            ticket,
            instruction_text: step.instruction,
            recipe_context: recipe_text,
        })
    }

    /// Explains the current cooking step.
    pub fn begin_explain_current_step(&mut self) -> Result<ExplainRequest> {
        let Some(step) = self.current_step().cloned() else {
            return Err(self.fail(SousError::invalid_transition(self.view, "explain the current step")));
        };
        self.begin_explanation(step)
    }

    pub fn complete_explanation(
        &mut self,
        ticket: RequestTicket,
        result: Result<StepExplanation>,
    ) -> Result<Completion> {
        if !self.settle(&ticket) {
            return Ok(Completion::Discarded);
        }
        let Some(slot) = self.explanation.as_mut() else {
            return Ok(Completion::Discarded);
        };

        match result {
            Ok(StepExplanation { explanation }) => {
                let question = slot.context.question().unwrap_or_default().to_string();
                slot.context.record_reply(explanation.clone());
                self.log.append(
                    AgentLogEntry::new(EXPLAINER_ACTOR, LogLevel::Success)
                        .with_input(question)
                        .with_output(explanation),
                );
                Ok(Completion::Applied)
            }
            Err(err) => {
                slot.context.record_failure(err.to_string());
                Err(self.fail(err))
            }
        }
    }

    // ============================================================================
    // Chat overlay
    // ============================================================================

    /// Records the user's message in the open chat and issues the chat request.
    ///
    /// # Errors
    ///
    /// Fails when no chat is open, the text is empty, or a reply is pending.
    pub fn begin_chat_message(&mut self, text: &str) -> Result<ChatRequest> {
        let Some(slot) = self.chat.as_mut() else {
            return Err(self.fail(SousError::validation("Open the recipe chat first.")));
        };
        if let Err(err) = slot.context.push_user_message(text) {
            return Err(self.fail(err));
        }
        let instance = slot.instance;
        let recipe_context = slot.context.recipe_text().to_string();
        let anchor_step = slot.context.anchor_step().cloned();
        let transcript = slot.context.transcript().to_vec();

        self.log.user_action("Send chat message");
        let ticket = self.issue(RequestKind::Chat, Some(instance))?;
        Ok(ChatRequest {
            ticket,
            recipe_context,
            anchor_step,
            transcript,
        })
    }

    /// Applies a chat reply. A failure keeps the user's message in the
    /// transcript and shows the error on the chat surface only.
    pub fn complete_chat_message(
        &mut self,
        ticket: RequestTicket,
        result: Result<ChatAnswer>,
    ) -> Result<Completion> {
        if !self.settle(&ticket) {
            return Ok(Completion::Discarded);
        }
        let Some(slot) = self.chat.as_mut() else {
            return Ok(Completion::Discarded);
        };

        match result {
            Ok(ChatAnswer { answer }) => {
                let question = slot
                    .context
                    .transcript()
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                slot.context.record_reply(answer.clone());
                self.log.append(
                    AgentLogEntry::new(CHAT_ACTOR, LogLevel::Success)
                        .with_input(question)
                        .with_output(answer),
                );
                Ok(Completion::Applied)
            }
            Err(err) => {
                slot.context.record_failure(err.to_string());
                Err(self.fail(err))
            }
        }
    }

    // ============================================================================
    // Profile data feed (display only)
    // ============================================================================

    pub fn begin_profile_data(&mut self) -> Result<ProfileDataRequest> {
        let ticket = self.issue(RequestKind::ProfileData, None)?;
        Ok(ProfileDataRequest { ticket })
    }

    pub fn complete_profile_data(
        &mut self,
        ticket: RequestTicket,
        result: Result<ProfileData>,
    ) -> Result<Completion> {
        if !self.settle(&ticket) {
            return Ok(Completion::Discarded);
        }
        match result {
            Ok(data) => {
                self.profile_data = Some(data);
                Ok(Completion::Applied)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    // ============================================================================
    // Ticket bookkeeping
    // ============================================================================

    /// Whether `ticket` is still the live request for its kind under the
    /// current generation.
    pub fn is_live(&self, ticket: &RequestTicket) -> bool {
        let current = self.pending.get(&ticket.kind) == Some(ticket);
        let same_generation =
            ticket.kind == RequestKind::ProfileData || ticket.generation == self.generation;
        current && same_generation
    }

    fn issue(&mut self, kind: RequestKind, instance: Option<u64>) -> Result<RequestTicket> {
        if self.pending.contains_key(&kind) {
            return Err(self.fail(SousError::RequestPending(kind.to_string())));
        }
        self.next_sequence += 1;
        let ticket = RequestTicket {
            kind,
            generation: self.generation,
            instance,
            sequence: self.next_sequence,
        };
        self.pending.insert(kind, ticket);
        Ok(ticket)
    }

    /// Clears a live ticket and returns `true`; returns `false` for a stale one.
    fn settle(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_live(ticket) {
            tracing::debug!(
                "[Session] Discarding stale {} response (issued in generation {}, now {})",
                ticket.kind,
                ticket.generation,
                self.generation
            );
            self.log.info(format!("Discarded stale {} response.", ticket.kind));
            return false;
        }
        self.pending.remove(&ticket.kind);
        true
    }
}
