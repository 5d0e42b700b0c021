use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{error, info, warn};

use super::complaint::{Caller, Complaint, ComplaintId, ComplaintStatus, UserId};
use crate::classifier::{ClassifierError, DepartmentClassifier, DepartmentLabel};

#[derive(Debug, thiserror::Error)]
pub enum ComplaintError {
    #[error("A complaint with the same text already exists ({0})")]
    Duplicate(ComplaintId),
    #[error("Complaint {0} not found")]
    NotFound(ComplaintId),
    #[error("Invalid complaint text: {0}")]
    InvalidText(String),
    #[error("Unknown department: {0}")]
    UnknownDepartment(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Complaint {id} could not be routed: {source}")]
    Routing {
        id: ComplaintId,
        #[source]
        source: ClassifierError,
    },
}

/// What the submission flow does when a new complaint cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Keep the complaint with no department
    #[default]
    KeepUnclassified,
    /// Withdraw the complaint and report the failure
    RejectSubmission,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    /// Published complaints, visible to every caller
    complaints: BTreeMap<ComplaintId, Complaint>,
    /// Recorded but still being routed; only the duplicate check sees these
    staged: HashMap<ComplaintId, Complaint>,
    by_text: HashMap<String, ComplaintId>,
}

impl Inner {
    fn publish(&mut self, id: ComplaintId) -> Result<Complaint, ComplaintError> {
        let complaint = self.staged.remove(&id).ok_or(ComplaintError::NotFound(id))?;
        self.complaints.insert(id, complaint.clone());
        Ok(complaint)
    }

    fn withdraw(&mut self, id: ComplaintId) {
        if let Some(removed) = self.staged.remove(&id) {
            self.by_text.remove(removed.text());
        }
    }
}

/// In-memory complaint records plus the submission flow that routes each
/// new complaint through the department classifier exactly once.
#[derive(Debug)]
pub struct ComplaintRegistry {
    classifier: Arc<DepartmentClassifier>,
    policy: RoutingPolicy,
    inner: RwLock<Inner>,
}

impl ComplaintRegistry {
    pub fn new(classifier: Arc<DepartmentClassifier>) -> Self {
        Self::with_policy(classifier, RoutingPolicy::default())
    }

    pub fn with_policy(classifier: Arc<DepartmentClassifier>, policy: RoutingPolicy) -> Self {
        Self {
            classifier,
            policy,
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Files a complaint for `caller` and routes it to a department.
    ///
    /// Identical text is rejected before any classification happens. The
    /// complaint is staged as `Pending` and classified outside the lock; other
    /// callers only see it once routing has finished. See [`RoutingPolicy`]
    /// for what happens when classification fails.
    pub fn submit(&self, caller: &Caller, text: &str) -> Result<Complaint, ComplaintError> {
        self.classifier
            .check_text(text)
            .map_err(|e| ComplaintError::InvalidText(invalid_reason(e)))?;

        let id = {
            let mut inner = self.write();
            if let Some(&existing) = inner.by_text.get(text) {
                info!("Rejected duplicate of complaint {}", existing);
                return Err(ComplaintError::Duplicate(existing));
            }
            inner.next_id += 1;
            let id = ComplaintId(inner.next_id);
            inner.by_text.insert(text.to_string(), id);
            inner
                .staged
                .insert(id, Complaint::new(id, caller.user, text.to_string()));
            id
        };
        info!("Complaint {} recorded for user {}", id, caller.user.0);

        match self.route(text) {
            Ok(label) => {
                let mut inner = self.write();
                let complaint = inner.staged.get_mut(&id).ok_or(ComplaintError::NotFound(id))?;
                if complaint.assign_department(label.clone()) {
                    info!("Complaint {} routed to {}", id, label);
                }
                inner.publish(id)
            }
            Err(e) => self.handle_routing_failure(id, e),
        }
    }

    /// One classification attempt, plus a single retry for model failures
    fn route(&self, text: &str) -> Result<DepartmentLabel, ClassifierError> {
        match self.classifier.classify_one(text) {
            Err(ClassifierError::ClassificationFailure(reason)) => {
                warn!("Classification failed ({}), retrying once", reason);
                self.classifier.classify_one(text)
            }
            other => other,
        }
    }

    fn handle_routing_failure(
        &self,
        id: ComplaintId,
        err: ClassifierError,
    ) -> Result<Complaint, ComplaintError> {
        let mut inner = self.write();
        let keep = self.policy == RoutingPolicy::KeepUnclassified
            && !matches!(err, ClassifierError::InvalidInput { .. });

        if !keep {
            inner.withdraw(id);
            error!("Complaint {} withdrawn, routing failed: {}", id, err);
            return Err(match err {
                ClassifierError::InvalidInput { .. } => {
                    ComplaintError::InvalidText(invalid_reason(err))
                }
                source => ComplaintError::Routing { id, source },
            });
        }

        let complaint = inner.publish(id)?;
        match err {
            ClassifierError::ModelUnavailable(_) => {
                error!(
                    "Complaint {} left unclassified, department model unavailable: {}",
                    id, err
                );
                Err(ComplaintError::Routing { id, source: err })
            }
            _ => {
                warn!("Complaint {} left unclassified: {}", id, err);
                Ok(complaint)
            }
        }
    }

    /// Adds `caller` to the supporters of a complaint. Joining twice is a no-op.
    pub fn join(&self, caller: &Caller, id: ComplaintId) -> Result<Complaint, ComplaintError> {
        let mut inner = self.write();
        let complaint = inner.complaints.get_mut(&id).ok_or(ComplaintError::NotFound(id))?;
        if complaint.add_supporter(caller.user) {
            info!("User {} joined complaint {}", caller.user.0, id);
        }
        Ok(complaint.clone())
    }

    pub fn get(&self, id: ComplaintId) -> Option<Complaint> {
        self.read().complaints.get(&id).cloned()
    }

    /// Pending complaints, oldest first, optionally limited to one department.
    /// The department must be part of the classifier's vocabulary.
    pub fn list_pending(
        &self,
        department: Option<&str>,
    ) -> Result<Vec<Complaint>, ComplaintError> {
        let filter = match department {
            Some(name) => Some(
                self.classifier
                    .vocabulary()
                    .find(name)
                    .cloned()
                    .ok_or_else(|| ComplaintError::UnknownDepartment(name.to_string()))?,
            ),
            None => None,
        };

        Ok(self
            .read()
            .complaints
            .values()
            .filter(|c| c.status() == ComplaintStatus::Pending)
            .filter(|c| match &filter {
                Some(label) => c.department() == Some(label),
                None => true,
            })
            .cloned()
            .collect())
    }

    pub fn list_created_by(&self, user: UserId) -> Vec<Complaint> {
        self.read()
            .complaints
            .values()
            .filter(|c| c.creator() == user)
            .cloned()
            .collect()
    }

    /// Moves a complaint through its lifecycle. Admins only.
    pub fn update_status(
        &self,
        caller: &Caller,
        id: ComplaintId,
        status: ComplaintStatus,
    ) -> Result<Complaint, ComplaintError> {
        if !caller.is_admin() {
            return Err(ComplaintError::Forbidden(format!(
                "user {} cannot change complaint status",
                caller.user.0
            )));
        }
        let mut inner = self.write();
        let complaint = inner.complaints.get_mut(&id).ok_or(ComplaintError::NotFound(id))?;
        complaint.set_status(status);
        info!("Complaint {} marked {:?} by user {}", id, status, caller.user.0);
        Ok(complaint.clone())
    }

    pub fn len(&self) -> usize {
        self.read().complaints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn invalid_reason(err: ClassifierError) -> String {
    match err {
        ClassifierError::InvalidInput { reason, .. } => reason,
        other => other.to_string(),
    }
}
