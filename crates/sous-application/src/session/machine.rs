use std::collections::HashMap;

use sous_core::SousError;
use sous_core::agent_log::AgentCallLog;
use sous_core::content::{ParsedRecipeSections, StructuredContentExtractor};
use sous_core::conversation::ConversationContext;
use sous_core::cooking::{CookingSession, CookingStep, CookingStepSequencer};
use sous_core::error::Result;
use sous_core::meal::{MealForm, MealType};
use sous_core::recipe::{ProfileData, RecipeDetail, RecipeOption, UserProfile};
use sous_core::session::{Overlay, RequestKind, RequestTicket, View};

/// The recipe currently drilled into from the options list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSelection {
    pub option: RecipeOption,
    /// Set once the detail request succeeds; replaced, never merged.
    pub detail: Option<RecipeDetail>,
    /// Recomputed from `detail` every time it is set.
    pub sections: Option<ParsedRecipeSections>,
    /// Inline error shown when the detail request failed.
    pub error: Option<String>,
}

impl RecipeSelection {
    pub(crate) fn loading(option: RecipeOption) -> Self {
        Self {
            option,
            detail: None,
            sections: None,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.detail.is_none() && self.error.is_none()
    }

    /// Whether cook and explain actions are available.
    pub fn is_ready(&self) -> bool {
        self.detail.is_some()
    }
}

/// An overlay conversation together with the instance id its requests carry.
#[derive(Debug, Clone)]
pub(crate) struct OverlaySlot {
    pub(crate) instance: u64,
    pub(crate) context: ConversationContext,
}

/// Top-level controller for one recipe session.
///
/// Owns the active view, the user profile, the recipe options, the selected
/// recipe and its cooking session, and the two assistant overlays. Every
/// backend operation is split into a `begin_*` call that validates the action
/// and issues a [`RequestTicket`], and a `complete_*` call that applies the
/// response only if the ticket is still live.
#[derive(Debug)]
pub struct SessionStateMachine {
    pub(crate) view: View,
    pub(crate) generation: u64,
    pub(crate) form: MealForm,
    pub(crate) user_profile: Option<UserProfile>,
    pub(crate) options: Vec<RecipeOption>,
    pub(crate) selection: Option<RecipeSelection>,
    pub(crate) cooking: Option<CookingSession>,
    pub(crate) explanation: Option<OverlaySlot>,
    pub(crate) chat: Option<OverlaySlot>,
    pub(crate) profile_data: Option<ProfileData>,
    pub(crate) pending: HashMap<RequestKind, RequestTicket>,
    pub(crate) next_sequence: u64,
    pub(crate) next_instance: u64,
    pub(crate) extractor: StructuredContentExtractor,
    pub(crate) log: AgentCallLog,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    /// Creates a session in the `Requesting` view.
    pub fn new() -> Self {
        let mut log = AgentCallLog::new();
        log.info("Session initialized.");
        Self {
            view: View::Requesting,
            generation: 0,
            form: MealForm::new(),
            user_profile: None,
            options: Vec::new(),
            selection: None,
            cooking: None,
            explanation: None,
            chat: None,
            profile_data: None,
            pending: HashMap::new(),
            next_sequence: 0,
            next_instance: 0,
            extractor: StructuredContentExtractor::new(),
            log,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn view(&self) -> View {
        self.view
    }

    /// Increments on every view change; requests are tagged with it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn form(&self) -> &MealForm {
        &self.form
    }

    pub fn user_profile(&self) -> Option<&UserProfile> {
        self.user_profile.as_ref()
    }

    pub fn options(&self) -> &[RecipeOption] {
        &self.options
    }

    pub fn selection(&self) -> Option<&RecipeSelection> {
        self.selection.as_ref()
    }

    pub fn cooking(&self) -> Option<&CookingSession> {
        self.cooking.as_ref()
    }

    pub fn current_step(&self) -> Option<&CookingStep> {
        self.cooking.as_ref().map(CookingSession::current)
    }

    pub fn explanation(&self) -> Option<&ConversationContext> {
        self.explanation.as_ref().map(|slot| &slot.context)
    }

    pub fn chat(&self) -> Option<&ConversationContext> {
        self.chat.as_ref().map(|slot| &slot.context)
    }

    /// The overlay on top, if any. An explanation opened over a chat covers it.
    pub fn open_overlay(&self) -> Option<Overlay> {
        if self.explanation.is_some() {
            Some(Overlay::Explain)
        } else if self.chat.is_some() {
            Some(Overlay::Chat)
        } else {
            None
        }
    }

    pub fn profile_data(&self) -> Option<&ProfileData> {
        self.profile_data.as_ref()
    }

    pub fn log(&self) -> &AgentCallLog {
        &self.log
    }

    /// Whether a request of `kind` is outstanding (its action is disabled).
    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Whether `Detail → Cooking` would currently be accepted.
    pub fn can_enter_cooking(&self) -> bool {
        self.view == View::Detail
            && self
                .selection
                .as_ref()
                .and_then(|s| s.sections.as_ref())
                .and_then(|s| s.instructions.as_ref())
                .is_some_and(|table| !CookingStepSequencer::steps_from_table(table).is_empty())
    }

    // ============================================================================
    // Meal form
    // ============================================================================

    pub fn select_meal_type(&mut self, meal_type: MealType) {
        self.form.select(meal_type);
        if meal_type.requires_free_text() {
            self.log.info("Custom meal selected. Please provide details.");
        } else {
            self.log.info(format!("Meal type set to: {meal_type}"));
        }
    }

    pub fn set_free_text(&mut self, text: impl Into<String>) {
        self.form.set_free_text(text);
    }

    // ============================================================================
    // View transitions
    // ============================================================================

    /// `Detail → Cooking`.
    ///
    /// # Errors
    ///
    /// [`SousError::Sequencing`] when the recipe has no detail or no usable
    /// instructions table; the view does not change.
    pub fn enter_cooking(&mut self) -> Result<()> {
        self.require_view(View::Detail, "enter cooking mode")?;
        self.log.user_action("Start cooking mode");

        let built = match self.selection.as_ref().and_then(|s| s.sections.as_ref()) {
            Some(sections) => CookingStepSequencer::build(sections.instructions.as_ref()),
            None => Err(SousError::sequencing(
                "Cannot start cooking mode: the recipe detail is not available.",
            )),
        };
        let session = match built {
            Ok(session) => session,
            Err(err) => return Err(self.fail(err)),
        };

        tracing::info!("[Session] Entering cooking mode with {} steps", session.len());
        self.enter_view(View::Cooking);
        self.cooking = Some(session);
        Ok(())
    }

    /// `Cooking → Detail`. The cooking session is discarded.
    pub fn exit_cooking(&mut self) -> Result<()> {
        self.require_view(View::Cooking, "exit cooking mode")?;
        self.log.user_action("Exit cooking mode");
        self.cooking = None;
        self.enter_view(View::Detail);
        Ok(())
    }

    /// `Detail → Selecting`. Profile and options are kept.
    pub fn back_to_options(&mut self) -> Result<()> {
        self.require_view(View::Detail, "go back to the recipe options")?;
        self.log.user_action("Back to recipe options");
        self.selection = None;
        self.enter_view(View::Selecting);
        Ok(())
    }

    /// `Selecting → Requesting`. Profile and options are kept.
    pub fn back_to_request(&mut self) -> Result<()> {
        self.require_view(View::Selecting, "go back to the meal request")?;
        self.log.user_action("Back to meal request");
        self.enter_view(View::Requesting);
        Ok(())
    }

    /// Returns to a fresh `Requesting` view, dropping all session state.
    /// The diagnostic log is kept.
    pub fn reset(&mut self) {
        self.log.user_action("Reset session");
        self.form = MealForm::new();
        self.user_profile = None;
        self.options.clear();
        self.selection = None;
        self.cooking = None;
        self.pending.clear();
        self.enter_view(View::Requesting);
    }

    // ============================================================================
    // Cooking navigation
    // ============================================================================

    /// Moves to the next step; `Ok(false)` when already on the last one.
    pub fn next_step(&mut self) -> Result<bool> {
        self.navigate(true)
    }

    /// Moves to the previous step; `Ok(false)` when already on the first one.
    pub fn previous_step(&mut self) -> Result<bool> {
        self.navigate(false)
    }

    fn navigate(&mut self, forward: bool) -> Result<bool> {
        let action = if forward { "go to the next step" } else { "go to the previous step" };
        self.require_view(View::Cooking, action)?;
        let Some(session) = self.cooking.as_mut() else {
            return Err(SousError::internal("cooking view without a cooking session"));
        };
        let moved = if forward { session.advance() } else { session.retreat() };
        if moved {
            let step = session.current();
            let description = format!("Moved to step {}", step.number);
            self.log.user_action(description);
        }
        Ok(moved)
    }

    // ============================================================================
    // Overlays
    // ============================================================================

    /// Closes the explanation overlay, discarding its conversation.
    pub fn close_explanation(&mut self) {
        if self.discard_explanation() {
            self.log.user_action("Close step explanation");
        }
    }

    /// Drops the explanation overlay and its in-flight request, if any.
    pub(crate) fn discard_explanation(&mut self) -> bool {
        if self.explanation.take().is_some() {
            self.pending.remove(&RequestKind::ExplainStep);
            true
        } else {
            false
        }
    }

    /// Opens the chat overlay bound to `anchor_step`, replacing any open chat.
    ///
    /// # Errors
    ///
    /// Fails outside `Detail`/`Cooking` or before the recipe detail is loaded.
    pub fn open_chat(&mut self, anchor_step: Option<CookingStep>) -> Result<()> {
        let recipe_text = self.require_overlay_context("open the recipe chat")?;
        self.close_chat();
        let label = anchor_step
            .as_ref()
            .map(|s| format!(" at step {}", s.number))
            .unwrap_or_default();
        self.log.user_action(format!("Open recipe chat{label}"));
        let instance = self.allocate_instance();
        self.chat = Some(OverlaySlot {
            instance,
            context: ConversationContext::chat(recipe_text, anchor_step),
        });
        Ok(())
    }

    /// Closes the chat overlay, discarding its conversation.
    pub fn close_chat(&mut self) {
        if self.chat.take().is_some() {
            self.pending.remove(&RequestKind::Chat);
            self.log.user_action("Close recipe chat");
        }
    }

    // ============================================================================
    // Internal helpers
    // ============================================================================

    /// Switches view, tearing down everything scoped to the previous one:
    /// both overlays and any view-scoped request still in flight.
    pub(crate) fn enter_view(&mut self, view: View) {
        tracing::debug!("[Session] View {} -> {}", self.view, view);
        self.view = view;
        self.generation += 1;
        self.explanation = None;
        self.chat = None;
        self.pending.retain(|kind, _| {
            matches!(kind, RequestKind::GenerateOptions | RequestKind::ProfileData)
        });
    }

    pub(crate) fn require_view(&mut self, expected: View, action: &str) -> Result<()> {
        if self.view == expected {
            Ok(())
        } else {
            Err(self.fail(SousError::invalid_transition(self.view, action)))
        }
    }

    /// Returns the recipe text overlays are anchored to.
    pub(crate) fn require_overlay_context(&mut self, action: &str) -> Result<String> {
        if !self.view.allows_overlays() {
            return Err(self.fail(SousError::invalid_transition(self.view, action)));
        }
        match self.selection.as_ref().and_then(|s| s.detail.as_ref()) {
            Some(detail) => Ok(detail.raw_content.clone()),
            None => Err(self.fail(SousError::validation(
                "The recipe detail has not been loaded.",
            ))),
        }
    }

    pub(crate) fn allocate_instance(&mut self) -> u64 {
        self.next_instance += 1;
        self.next_instance
    }

    /// Records an error in the diagnostic log and hands it back.
    pub(crate) fn fail(&mut self, err: SousError) -> SousError {
        tracing::warn!("[Session] {}", err);
        self.log.error(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sous_core::agent_log::{LogLevel, USER_ACTION_ACTOR};

    #[test]
    fn test_new_session_starts_requesting() {
        let session = SessionStateMachine::new();
        assert_eq!(session.view(), View::Requesting);
        assert!(session.user_profile().is_none());
        assert!(session.options().is_empty());
        assert!(!session.can_enter_cooking());
    }

    #[test]
    fn test_transition_from_wrong_view_is_rejected_and_logged() {
        let mut session = SessionStateMachine::new();
        let err = session.enter_cooking().unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(session.view(), View::Requesting);
        let last = session.log().entries().last().unwrap();
        assert_eq!(last.level, LogLevel::Error);
    }

    #[test]
    fn test_meal_selection_is_logged() {
        let mut session = SessionStateMachine::new();
        session.select_meal_type(MealType::Custom);
        session.set_free_text("leftover rice");
        assert_eq!(session.form().free_text(), "leftover rice");

        session.select_meal_type(MealType::Breakfast);
        assert_eq!(session.form().free_text(), "");
        let last = session.log().entries().last().unwrap();
        assert_eq!(last.output.as_deref(), Some("Meal type set to: Breakfast"));
    }

    #[test]
    fn test_reset_keeps_log() {
        let mut session = SessionStateMachine::new();
        let before = session.log().len();
        session.reset();
        assert_eq!(session.view(), View::Requesting);
        assert_eq!(session.log().len(), before + 1);
        assert_eq!(session.log().entries().last().unwrap().actor, USER_ACTION_ACTOR);
    }

    #[test]
    fn test_overlays_require_detail() {
        let mut session = SessionStateMachine::new();
        let err = session.open_chat(None).unwrap_err();
        assert!(err.is_invalid_transition());
        assert!(session.chat().is_none());
        assert_eq!(session.open_overlay(), None);
    }
}
