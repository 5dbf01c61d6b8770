//! Search-or-create for the model field of the entry form.
//!
//! Typing a name searches the selected device's models. A name with no
//! match can be turned into a new model, but only after an explicit
//! confirmation step; `add_model` is never called straight from a search.

use crate::shop::models::Model;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModelLookup {
    #[default]
    Idle,
    Searching {
        query: String,
        matches: Vec<Model>,
    },
    NoMatch {
        query: String,
    },
    ConfirmCreate {
        name: String,
    },
    Created {
        model: Model,
    },
}

impl ModelLookup {
    /// Search `models` for names containing `query` (case-insensitive).
    ///
    /// A blank query resets to `Idle`. Inactive models never match.
    #[must_use]
    pub fn search(query: &str, models: &[Model]) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return Self::Idle;
        }

        let needle = query.to_lowercase();
        let matches: Vec<Model> = models
            .iter()
            .filter(|m| m.is_active && m.model_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        if matches.is_empty() {
            Self::NoMatch {
                query: query.to_string(),
            }
        } else {
            Self::Searching {
                query: query.to_string(),
                matches,
            }
        }
    }

    /// Ask to create the searched name as a new model.
    ///
    /// Allowed from `NoMatch`, and from `Searching` when no match has exactly
    /// that name. Any other state is returned unchanged.
    #[must_use]
    pub fn request_create(self) -> Self {
        match self {
            Self::NoMatch { query } => Self::ConfirmCreate { name: query },
            Self::Searching { query, matches } => {
                if matches
                    .iter()
                    .any(|m| m.model_name.eq_ignore_ascii_case(&query))
                {
                    Self::Searching { query, matches }
                } else {
                    Self::ConfirmCreate { name: query }
                }
            }
            other => other,
        }
    }

    /// Record the model the backend created. Only valid after confirmation.
    #[must_use]
    pub fn created(self, model: Model) -> Self {
        match self {
            Self::ConfirmCreate { .. } => Self::Created { model },
            other => other,
        }
    }

    #[must_use]
    pub fn cancel(self) -> Self {
        Self::Idle
    }

    /// Name awaiting confirmation, if any.
    #[must_use]
    pub fn pending_name(&self) -> Option<&str> {
        match self {
            Self::ConfirmCreate { name } => Some(name),
            _ => None,
        }
    }

    /// Current query text in any state that has one.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Searching { query, .. } | Self::NoMatch { query } => Some(query),
            Self::ConfirmCreate { name } => Some(name),
            Self::Created { model } => Some(&model.model_name),
            Self::Idle => None,
        }
    }

    #[must_use]
    pub fn matches(&self) -> &[Model] {
        match self {
            Self::Searching { matches, .. } => matches,
            _ => &[],
        }
    }

    /// The model a `Created` lookup settled on.
    #[must_use]
    pub fn created_model(&self) -> Option<&Model> {
        match self {
            Self::Created { model } => Some(model),
            _ => None,
        }
    }
}
