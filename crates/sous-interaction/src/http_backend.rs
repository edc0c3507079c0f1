//! HttpRecipeBackend - JSON-over-HTTP client for the multi-agent recipe backend.
//!
//! Every operation is a single request. Non-success responses carry
//! `{ "error": string }`, which is surfaced verbatim when present.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sous_core::SousError;
use sous_core::backend::{ChatAnswer, FetchedDetail, GeneratedOptions, RecipeBackend, StepExplanation};
use sous_core::config::BackendConfig;
use sous_core::conversation::ConversationMessage;
use sous_core::cooking::CookingStep;
use sous_core::error::Result;
use sous_core::meal::MealType;
use sous_core::recipe::{ProfileData, UserProfile};

/// [`RecipeBackend`] implementation that talks to the backend over HTTP.
#[derive(Clone)]
pub struct HttpRecipeBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpRecipeBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Uses a caller-provided client (proxies, timeouts, test servers).
    pub fn with_client(client: Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        tracing::debug!("[Backend] POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;
        read_response(response).await
    }

    async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        tracing::debug!("[Backend] GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;
        read_response(response).await
    }
}

#[async_trait]
impl RecipeBackend for HttpRecipeBackend {
    async fn generate_recipe_options(
        &self,
        meal_type: MealType,
        free_text: &str,
    ) -> Result<GeneratedOptions> {
        let body = GenerateOptionsBody {
            meal_type: meal_type.to_string(),
            free_text,
        };
        let response: GenerateOptionsResponse =
            self.post(&self.config.generate_options_path, &body).await?;
        Ok(GeneratedOptions {
            user_profile: response.user_profile,
            recipe_options: response.recipe_options,
            agent_logs: response.agent_logs,
        })
    }

    async fn fetch_recipe_detail(
        &self,
        user_profile: &UserProfile,
        dish_title: &str,
    ) -> Result<FetchedDetail> {
        let body = RecipeDetailBody {
            user_profile,
            dish_title,
        };
        let response: RecipeDetailResponse =
            self.post(&self.config.recipe_detail_path, &body).await?;
        Ok(FetchedDetail {
            recipe_html: response.recipe_html,
            hero_image_url: response.hero_image_url.filter(|url| !url.trim().is_empty()),
            agent_logs: response.agent_logs,
        })
    }

    async fn explain_step(
        &self,
        instruction_text: &str,
        recipe_context: &str,
    ) -> Result<StepExplanation> {
        let body = ExplainStepBody {
            instruction_text,
            recipe_context,
        };
        self.post(&self.config.explain_step_path, &body).await
    }

    async fn ask_chatbot(
        &self,
        recipe_context: &str,
        anchor_step: Option<&CookingStep>,
        transcript: &[ConversationMessage],
    ) -> Result<ChatAnswer> {
        let body = ChatBody {
            recipe_context,
            anchor_step,
            transcript,
        };
        self.post(&self.config.chat_path, &body).await
    }

    async fn get_all_profile_data(&self) -> Result<ProfileData> {
        self.get(&self.config.profile_data_path).await
    }
}

#[derive(Serialize)]
struct GenerateOptionsBody<'a> {
    meal_type: String,
    free_text: &'a str,
}

#[derive(Serialize)]
struct RecipeDetailBody<'a> {
    user_profile: &'a UserProfile,
    dish_title: &'a str,
}

#[derive(Serialize)]
struct ExplainStepBody<'a> {
    instruction_text: &'a str,
    recipe_context: &'a str,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    recipe_context: &'a str,
    anchor_step: Option<&'a CookingStep>,
    transcript: &'a [ConversationMessage],
}

#[derive(Deserialize)]
struct GenerateOptionsResponse {
    #[serde(alias = "userProfile")]
    user_profile: UserProfile,
    #[serde(alias = "recipeOptions")]
    recipe_options: Vec<sous_core::recipe::RecipeOption>,
    #[serde(default, alias = "agentLogs")]
    agent_logs: Vec<sous_core::agent_log::AgentLogEntry>,
}

#[derive(Deserialize)]
struct RecipeDetailResponse {
    #[serde(alias = "recipeHtml")]
    recipe_html: String,
    #[serde(default, alias = "heroImageUrl")]
    hero_image_url: Option<String>,
    #[serde(default, alias = "agentLogs")]
    agent_logs: Vec<sous_core::agent_log::AgentLogEntry>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

async fn read_response<T>(response: reqwest::Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body_text = response.text().await.map_err(map_request_error)?;

    if !status.is_success() {
        tracing::warn!("[Backend] Request failed with status {}", status);
        return Err(map_http_error(status, &body_text));
    }

    serde_json::from_str(&body_text).map_err(|err| {
        SousError::transport(
            Some(status.as_u16()),
            format!("Invalid response from backend: {err}"),
        )
    })
}

fn map_request_error(err: reqwest::Error) -> SousError {
    SousError::transport(
        err.status().map(|s| s.as_u16()),
        format!("Backend request failed: {err}"),
    )
}

/// Uses the server's `{ "error": ... }` message when the body carries one.
pub(crate) fn map_http_error(status: StatusCode, body: &str) -> SousError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|wrapper| wrapper.error);
    SousError::from_status(status.as_u16(), message)
}
