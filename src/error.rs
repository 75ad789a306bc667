use serde::Serialize;
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Group,
    Quiz,
    Learner,
    View,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::Quiz => "quiz",
            EntityKind::Learner => "learner",
            EntityKind::View => "view",
        }
    }
}

/// Value-level failures of the view-model layer. None of these are fatal;
/// the rendering side decides how an empty state looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    NotFound { kind: EntityKind, id: String },
    UnrecognizedContext(String),
    NoData,
    NotLoaded,
}

impl ViewError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        ViewError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ViewError::NotFound { .. } => "not_found",
            ViewError::UnrecognizedContext(_) => "unrecognized_context",
            ViewError::NoData => "no_data",
            ViewError::NotLoaded => "not_loaded",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ViewError::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
            ViewError::UnrecognizedContext(tag) => Some(json!({ "optionsFor": tag })),
            ViewError::NoData | ViewError::NotLoaded => None,
        }
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::NotFound { kind, id } => write!(f, "{} not found: {}", kind.as_str(), id),
            ViewError::UnrecognizedContext(tag) => {
                write!(f, "optionsFor must be one of: plan, report (got {:?})", tag)
            }
            ViewError::NoData => write!(f, "no scored recipients"),
            ViewError::NotLoaded => write!(f, "select a workspace first"),
        }
    }
}

impl std::error::Error for ViewError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            ViewError::not_found(EntityKind::Group, "g1"),
            ViewError::UnrecognizedContext("lesson".into()),
            ViewError::NoData,
            ViewError::NotLoaded,
        ];
        let mut codes: Vec<&str> = all.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn not_found_details_name_the_entity() {
        let e = ViewError::not_found(EntityKind::Quiz, "q9");
        assert_eq!(e.details(), Some(json!({ "kind": "quiz", "id": "q9" })));
        assert_eq!(e.to_string(), "quiz not found: q9");
    }
}
