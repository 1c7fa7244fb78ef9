use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{common::audience::Audience, common::form::FormStatus, mongodb::Id};

use super::form::ScheduleView;

/// A deployment request. Missing dates take defaults: the start date is
/// "now", the end date is the start plus the configured window.
///
/// When `recipients` is given, the listed accounts are assigned directly
/// (an author hand-picking individuals); otherwise the audience description
/// is resolved against the directory.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct DeployRequest {
    pub audience: Audience,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recipients: Option<Vec<Id>>,
}

/// What a deployment did. A deployment to zero recipients succeeds with a
/// warning; the author decides whether that was intended.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct DeployOutcome {
    pub form_id: Id,
    pub status: FormStatus,
    pub schedule: ScheduleView,
    pub recipient_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}
