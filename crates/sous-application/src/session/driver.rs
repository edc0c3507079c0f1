//! Async drivers pairing each `begin_*` with its backend call and `complete_*`.
//!
//! These hold the session for the whole exchange, which suits a sequential
//! front end such as the REPL. Front ends that keep the UI live while a
//! request is in flight call the `begin_*`/`complete_*` pairs directly.

use sous_core::backend::RecipeBackend;
use sous_core::cooking::CookingStep;
use sous_core::error::Result;

use super::machine::SessionStateMachine;
use super::requests::Completion;

impl SessionStateMachine {
    /// Submits the meal form and applies the generated options.
    pub async fn submit_request<B>(&mut self, backend: &B) -> Result<Completion>
    where
        B: RecipeBackend + ?Sized,
    {
        let request = self.begin_generate_options()?;
        let result = backend
            .generate_recipe_options(request.meal.meal_type(), request.meal.free_text())
            .await;
        self.complete_generate_options(request.ticket, result)
    }

    /// Drills into the option titled `title` and loads its detail.
    pub async fn select_recipe<B>(&mut self, backend: &B, title: &str) -> Result<Completion>
    where
        B: RecipeBackend + ?Sized,
    {
        let request = self.begin_fetch_detail(title)?;
        let result = backend
            .fetch_recipe_detail(&request.user_profile, &request.dish_title)
            .await;
        self.complete_fetch_detail(request.ticket, result)
    }

    /// Opens an explanation overlay for `step` and fetches its explanation.
    pub async fn explain_step<B>(&mut self, backend: &B, step: CookingStep) -> Result<Completion>
    where
        B: RecipeBackend + ?Sized,
    {
        let request = self.begin_explanation(step)?;
        let result = backend
            .explain_step(&request.instruction_text, &request.recipe_context)
            .await;
        self.complete_explanation(request.ticket, result)
    }

    pub async fn explain_current_step<B>(&mut self, backend: &B) -> Result<Completion>
    where
        B: RecipeBackend + ?Sized,
    {
        let request = self.begin_explain_current_step()?;
        let result = backend
            .explain_step(&request.instruction_text, &request.recipe_context)
            .await;
        self.complete_explanation(request.ticket, result)
    }

    /// Sends one chat message and records the reply.
    pub async fn send_chat_message<B>(&mut self, backend: &B, text: &str) -> Result<Completion>
    where
        B: RecipeBackend + ?Sized,
    {
        let request = self.begin_chat_message(text)?;
        let result = backend
            .ask_chatbot(
                &request.recipe_context,
                request.anchor_step.as_ref(),
                &request.transcript,
            )
            .await;
        self.complete_chat_message(request.ticket, result)
    }

    /// Loads the read-only profile data feed.
    pub async fn load_profile_data<B>(&mut self, backend: &B) -> Result<Completion>
    where
        B: RecipeBackend + ?Sized,
    {
        let request = self.begin_profile_data()?;
        let result = backend.get_all_profile_data().await;
        self.complete_profile_data(request.ticket, result)
    }
}
