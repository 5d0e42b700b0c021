use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::classifier::DepartmentLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComplaintId(pub u64);

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Citizen,
    Admin,
}

/// Identity and claims of whoever is acting, passed explicitly with each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user: UserId,
    pub role: Role,
}

impl Caller {
    pub fn citizen(user: u64) -> Self {
        Self { user: UserId(user), role: Role::Citizen }
    }

    pub fn admin(user: u64) -> Self {
        Self { user: UserId(user), role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A filed complaint. The text never changes after creation and the
/// department is assigned at most once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Complaint {
    id: ComplaintId,
    creator: UserId,
    text: String,
    status: ComplaintStatus,
    department: Option<DepartmentLabel>,
    supporters: BTreeSet<UserId>,
}

impl Complaint {
    pub(crate) fn new(id: ComplaintId, creator: UserId, text: String) -> Self {
        Self {
            id,
            creator,
            text,
            status: ComplaintStatus::Pending,
            department: None,
            supporters: BTreeSet::from([creator]),
        }
    }

    pub fn id(&self) -> ComplaintId {
        self.id
    }

    pub fn creator(&self) -> UserId {
        self.creator
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    /// `None` until the classifier has routed the complaint
    pub fn department(&self) -> Option<&DepartmentLabel> {
        self.department.as_ref()
    }

    pub fn supporters(&self) -> &BTreeSet<UserId> {
        &self.supporters
    }

    /// Returns `false` if a department was already assigned.
    pub(crate) fn assign_department(&mut self, label: DepartmentLabel) -> bool {
        if self.department.is_some() {
            return false;
        }
        self.department = Some(label);
        true
    }

    pub(crate) fn add_supporter(&mut self, user: UserId) -> bool {
        self.supporters.insert(user)
    }

    pub(crate) fn set_status(&mut self, status: ComplaintStatus) {
        self.status = status;
    }
}
