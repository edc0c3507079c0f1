//! Recipe domain module.
//!
//! - `model`: backend-produced recipe data (`UserProfile`, `RecipeOption`,
//!   `RecipeDetail`, `ProfileData`)

mod model;

pub use model::{ProfileData, RecipeDetail, RecipeOption, UserProfile};
