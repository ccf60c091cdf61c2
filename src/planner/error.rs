//! Planning errors. Every variant is caused by the request, never the server.

use thiserror::Error;

/// Where in the request a field name appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Fields,
    Group,
    Order,
    Filter,
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Clause::Fields => "fields",
            Clause::Group => "group",
            Clause::Order => "order",
            Clause::Filter => "filter",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no such field: {field} (in {clause})")]
    UnknownField { field: String, clause: Clause },

    #[error("cannot order by {field}: it is not in the selected fields")]
    Unorderable { field: String },

    #[error("no fields selected")]
    EmptySelect,
}

impl PlanError {
    /// The offending field name, if the error is about one.
    pub fn field(&self) -> Option<&str> {
        match self {
            PlanError::UnknownField { field, .. } | PlanError::Unorderable { field } => Some(field),
            PlanError::EmptySelect => None,
        }
    }

    /// Unknown names are resolution failures; the rest are plan-shape failures.
    pub fn is_resolution(&self) -> bool {
        matches!(self, PlanError::UnknownField { .. })
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
