//! Backend integrations for Sous Chef.
//!
//! - `http_backend`: [`HttpRecipeBackend`], the JSON-over-HTTP implementation
//!   of [`sous_core::backend::RecipeBackend`]

pub mod http_backend;

pub use http_backend::HttpRecipeBackend;
