use serde::{Deserialize, Serialize};

/// Opaque user context produced by the backend from a meal request.
///
/// The client never inspects it; it is threaded unchanged into the detail
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(String);

impl UserProfile {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One candidate recipe returned for a meal request.
///
/// `title` is the natural key used for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOption {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "estimatedCookTime", alias = "cook_time")]
    pub estimated_cook_time: Option<String>,
    #[serde(default, alias = "mainIngredients")]
    pub main_ingredients: Option<Vec<String>>,
    /// One-line reason the option fits the user's profile.
    #[serde(default, alias = "whyPerfect")]
    pub why_perfect: Option<String>,
}

/// Full detail for the selected recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub title: String,
    /// Semi-structured markup (HTML or markdown) holding the recipe sections.
    pub raw_content: String,
    pub hero_image_url: Option<String>,
}

/// Read-only profile data feed shown alongside the workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub ingredients: Vec<serde_json::Value>,
    #[serde(default)]
    pub calendar: Vec<serde_json::Value>,
    #[serde(default)]
    pub ruleset: Vec<serde_json::Value>,
}
