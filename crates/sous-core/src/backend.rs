//! Contract for the multi-agent recipe backend.
//!
//! The session core drives these operations but never implements them; the
//! HTTP client lives in `sous-interaction`, and tests supply scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent_log::AgentLogEntry;
use crate::conversation::ConversationMessage;
use crate::cooking::CookingStep;
use crate::error::Result;
use crate::meal::MealType;
use crate::recipe::{ProfileData, RecipeOption, UserProfile};

/// Result of `generate_recipe_options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedOptions {
    pub user_profile: UserProfile,
    pub recipe_options: Vec<RecipeOption>,
    #[serde(default)]
    pub agent_logs: Vec<AgentLogEntry>,
}

/// Result of `fetch_recipe_detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedDetail {
    pub recipe_html: String,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub agent_logs: Vec<AgentLogEntry>,
}

/// Result of `explain_step`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepExplanation {
    pub explanation: String,
}

/// Result of `ask_chatbot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

/// The backend operations consumed by the session.
///
/// Every operation is a single request/response. Failures are reported as
/// [`crate::SousError::Transport`] carrying a human-readable message.
#[async_trait]
pub trait RecipeBackend: Send + Sync {
    async fn generate_recipe_options(
        &self,
        meal_type: MealType,
        free_text: &str,
    ) -> Result<GeneratedOptions>;

    async fn fetch_recipe_detail(
        &self,
        user_profile: &UserProfile,
        dish_title: &str,
    ) -> Result<FetchedDetail>;

    async fn explain_step(
        &self,
        instruction_text: &str,
        recipe_context: &str,
    ) -> Result<StepExplanation>;

    async fn ask_chatbot(
        &self,
        recipe_context: &str,
        anchor_step: Option<&CookingStep>,
        transcript: &[ConversationMessage],
    ) -> Result<ChatAnswer>;

    /// Read-only preference/calendar/ruleset feed, for display only.
    async fn get_all_profile_data(&self) -> Result<ProfileData>;
}
