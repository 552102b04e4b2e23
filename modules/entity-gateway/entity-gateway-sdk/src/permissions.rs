//! Role/action permission model, resolved from configuration at load time.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::PolicyExpression;

/// Action named in a permission entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    Create,
    Read,
    Update,
    UpsertIncremental,
    Upsert,
    Delete,
    #[serde(rename = "*")]
    All,
}

/// Operation kind of an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    UpsertIncremental,
    Upsert,
    Delete,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::UpsertIncremental => "upsert_incremental",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }

    /// The permission action this operation is checked against.
    #[must_use]
    pub fn action(self) -> EntityAction {
        match self {
            Self::Create => EntityAction::Create,
            Self::Read => EntityAction::Read,
            Self::Update => EntityAction::Update,
            Self::UpsertIncremental => EntityAction::UpsertIncremental,
            Self::Upsert => EntityAction::Upsert,
            Self::Delete => EntityAction::Delete,
        }
    }

    /// Operations that carry a request body.
    #[must_use]
    pub fn has_body(self) -> bool {
        matches!(
            self,
            Self::Create | Self::Update | Self::UpsertIncremental | Self::Upsert
        )
    }
}

impl EntityAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "*",
            Self::Create => Operation::Create.as_str(),
            Self::Read => Operation::Read.as_str(),
            Self::Update => Operation::Update.as_str(),
            Self::UpsertIncremental => Operation::UpsertIncremental.as_str(),
            Self::Upsert => Operation::Upsert.as_str(),
            Self::Delete => Operation::Delete.as_str(),
        }
    }
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a field rule: everything (`*`) or an explicit set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSelector {
    All,
    Only(BTreeSet<String>),
}

impl FieldSelector {
    /// Build from a configured list; any `*` entry selects everything.
    #[must_use]
    pub fn from_list<S: AsRef<str>>(fields: &[S]) -> Self {
        if fields.iter().any(|f| f.as_ref() == "*") {
            return Self::All;
        }
        Self::Only(fields.iter().map(|f| f.as_ref().to_owned()).collect())
    }

    #[must_use]
    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    #[must_use]
    pub fn matches(&self, column: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(column),
        }
    }

    /// Explicitly named fields (empty for `All`).
    pub fn named(&self) -> impl Iterator<Item = &str> {
        let set = match self {
            Self::All => None,
            Self::Only(set) => Some(set),
        };
        set.into_iter().flatten().map(String::as_str)
    }
}

/// Include/exclude rules of one action entry. Exclude always dominates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    pub include: FieldSelector,
    pub exclude: FieldSelector,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            include: FieldSelector::All,
            exclude: FieldSelector::none(),
        }
    }
}

impl FieldRules {
    #[must_use]
    pub fn allows(&self, column: &str) -> bool {
        self.include.matches(column) && !self.exclude.matches(column)
    }

    /// Columns allowed by these rules, in the order given.
    pub fn project<'c>(&self, columns: impl Iterator<Item = &'c str>) -> Vec<String> {
        columns
            .filter(|c| self.allows(c))
            .map(ToOwned::to_owned)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPermission {
    pub action: EntityAction,
    pub fields: FieldRules,
    pub policy: Option<PolicyExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role: String,
    pub actions: Vec<ActionPermission>,
}

impl RolePermission {
    /// Entry for exactly `action`, else the `*` entry.
    #[must_use]
    pub fn action(&self, action: EntityAction) -> Option<&ActionPermission> {
        self.actions
            .iter()
            .find(|a| a.action == action)
            .or_else(|| self.actions.iter().find(|a| a.action == EntityAction::All))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPermissions {
    pub roles: Vec<RolePermission>,
}

impl EntityPermissions {
    /// Role names compare case-insensitively.
    #[must_use]
    pub fn for_role(&self, role: &str) -> Option<&RolePermission> {
        self.roles.iter().find(|r| r.role.eq_ignore_ascii_case(role))
    }
}
