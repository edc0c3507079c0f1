//! Meal request types and the request form that produces them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Result, SousError};

/// The kind of meal the user is asking for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    /// Free-form situation described by the user.
    Custom,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Custom,
    ];

    /// Whether this meal type requires a free-text description.
    pub fn requires_free_text(self) -> bool {
        matches!(self, MealType::Custom)
    }
}

/// A validated meal request.
///
/// `free_text` is non-empty iff `meal_type` is [`MealType::Custom`]; for the
/// other meal types it is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRequest {
    meal_type: MealType,
    free_text: String,
}

impl MealRequest {
    /// Builds a request, enforcing the custom-text rule.
    ///
    /// # Errors
    ///
    /// Returns [`SousError::Validation`] when `meal_type` is `Custom` and the
    /// text is empty or whitespace.
    pub fn new(meal_type: MealType, free_text: impl Into<String>) -> Result<Self> {
        let free_text = free_text.into();
        if meal_type.requires_free_text() {
            let trimmed = free_text.trim();
            if trimmed.is_empty() {
                return Err(SousError::validation(
                    "Please describe your custom situation in the text box.",
                ));
            }
            Ok(Self {
                meal_type,
                free_text: trimmed.to_string(),
            })
        } else {
            Ok(Self {
                meal_type,
                free_text: String::new(),
            })
        }
    }

    pub fn meal_type(&self) -> MealType {
        self.meal_type
    }

    pub fn free_text(&self) -> &str {
        &self.free_text
    }
}

/// Editable form state behind the request view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealForm {
    meal_type: Option<MealType>,
    free_text: String,
}

impl MealForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a meal type. Choosing anything other than `Custom` clears any
    /// previously typed free text.
    pub fn select(&mut self, meal_type: MealType) {
        if !meal_type.requires_free_text() {
            self.free_text.clear();
        }
        self.meal_type = Some(meal_type);
    }

    /// Updates the free-text field. Ignored unless `Custom` is selected.
    pub fn set_free_text(&mut self, text: impl Into<String>) {
        if self.meal_type.is_some_and(MealType::requires_free_text) {
            self.free_text = text.into();
        }
    }

    pub fn meal_type(&self) -> Option<MealType> {
        self.meal_type
    }

    pub fn free_text(&self) -> &str {
        &self.free_text
    }

    /// Whether the free-text box should be visible.
    pub fn shows_free_text(&self) -> bool {
        self.meal_type.is_some_and(MealType::requires_free_text)
    }

    /// Validates the form into a [`MealRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`SousError::Validation`] when no meal type is selected or when
    /// `Custom` is selected without a description.
    pub fn to_request(&self) -> Result<MealRequest> {
        let meal_type = self.meal_type.ok_or_else(|| {
            SousError::validation("Please select a meal type (Breakfast, Lunch, etc.).")
        })?;
        MealRequest::new(meal_type, self.free_text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_custom_requires_text() {
        let err = MealRequest::new(MealType::Custom, "   ").unwrap_err();
        assert!(err.is_validation());

        let request = MealRequest::new(MealType::Custom, " leftover chicken ").unwrap();
        assert_eq!(request.free_text(), "leftover chicken");
    }

    #[test]
    fn test_non_custom_ignores_text() {
        let request = MealRequest::new(MealType::Lunch, "ignored").unwrap();
        assert_eq!(request.meal_type(), MealType::Lunch);
        assert_eq!(request.free_text(), "");
    }

    #[test]
    fn test_form_requires_meal_type() {
        let form = MealForm::new();
        let err = form.to_request().unwrap_err();
        assert!(err.to_string().contains("select a meal type"));
    }

    #[test]
    fn test_form_clears_text_when_switching_away_from_custom() {
        let mut form = MealForm::new();
        form.select(MealType::Custom);
        form.set_free_text("rice and eggs");
        assert!(form.shows_free_text());

        form.select(MealType::Dinner);
        assert_eq!(form.free_text(), "");
        assert!(!form.shows_free_text());

        form.set_free_text("not stored");
        assert_eq!(form.free_text(), "");
    }

    #[test]
    fn test_meal_type_parse() {
        assert_eq!(MealType::from_str("dinner").unwrap(), MealType::Dinner);
        assert_eq!(MealType::Custom.to_string(), "Custom");
        assert!(MealType::from_str("brunch").is_err());
    }
}
