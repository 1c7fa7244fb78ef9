use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The cohorts a form can target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudienceType {
    /// Everyone in the directory, regardless of role.
    AllUsers,
    Students,
    Instructors,
    Alumni,
    /// Employer accounts, presented as "Staff" in the UI.
    Staff,
}

/// A target-audience description, as authored. The structural filters are
/// mutually exclusive per audience type: department and course/section only
/// apply to students, department alone to instructors, company to alumni.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    pub audience_type: AudienceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_year_section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Audience {
    /// An audience with no structural filter.
    pub fn everyone(audience_type: AudienceType) -> Self {
        Self {
            audience_type,
            department: None,
            course_year_section: None,
            company: None,
        }
    }
}

/// A concrete recipient, resolved from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Id,
    pub display_name: String,
    /// Role-dependent context shown next to the name, e.g. department or company.
    pub detail_label: String,
}

/// Authoring-time selection state over a resolved recipient pool.
///
/// The pool itself is owned by whoever resolved it; this struct only tracks
/// which of those recipients remain selected, and which are currently
/// visible under the search term. Changing filters means resolving a fresh
/// pool and building a fresh selection: the selection can never contain
/// recipients outside the current pool.
#[derive(Debug, Clone)]
pub struct AudienceSelection {
    recipients: Vec<Recipient>,
    selected: HashSet<Id>,
    search: String,
}

impl AudienceSelection {
    /// Wrap a freshly-resolved pool. Everyone starts selected.
    pub fn new(recipients: Vec<Recipient>) -> Self {
        let selected = recipients.iter().map(|recipient| recipient.id).collect();
        Self {
            recipients,
            selected,
            search: String::new(),
        }
    }

    /// The full resolved pool, regardless of search term.
    pub fn pool(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Toggle a single recipient in or out of the selection.
    /// Returns false (and does nothing) for an ID outside the pool.
    pub fn toggle(&mut self, id: Id) -> bool {
        if !self.recipients.iter().any(|recipient| recipient.id == id) {
            return false;
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        true
    }

    /// Is every recipient in the pool currently selected?
    pub fn all_selected(&self) -> bool {
        self.selected.len() == self.recipients.len()
    }

    /// Select everyone if anyone is unselected, otherwise clear the
    /// selection. Always relative to the current pool.
    pub fn toggle_select_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected = self.recipients.iter().map(|recipient| recipient.id).collect();
        }
    }

    /// Narrow the visible list by a case-insensitive substring of the
    /// display name. The pool and the selection are untouched: a recipient
    /// hidden by the search cannot be unchecked, by design.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// The recipients matching the current search term.
    pub fn visible(&self) -> Vec<&Recipient> {
        let needle = self.search.to_lowercase();
        self.recipients
            .iter()
            .filter(|recipient| recipient.display_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Is the given recipient currently selected?
    pub fn is_selected(&self, id: Id) -> bool {
        self.selected.contains(&id)
    }

    /// The selected recipient IDs, in pool order.
    pub fn selected_ids(&self) -> Vec<Id> {
        self.recipients
            .iter()
            .map(|recipient| recipient.id)
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    /// True if the resolved pool itself is empty (deployment warning, not an error).
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl Recipient {
        pub fn example(name: &str) -> Self {
            Self {
                id: Id::new(),
                display_name: name.to_string(),
                detail_label: "Computer Science".to_string(),
            }
        }
    }
}
