/// Role-based authorization policy
///
/// Every authenticated request is turned into a [`Caller`] once. Handlers
/// then ask the caller for what they need:
///
/// 1. **Role capabilities**: [`Caller::require_manager`] and
///    [`Caller::require_employee`] return a [`ManagerCap`] / [`EmployeeCap`].
///    Mutating store operations take these values as parameters, so they
///    cannot be called without a prior decision.
/// 2. **Team membership**: [`ManagerCap::require_team_member`] checks that an
///    employee reports to the manager.
/// 3. **Form submission**: [`Caller::form_submitter`] lets the owning
///    manager submit for a team member, or an employee of that manager
///    submit about themselves.
/// 4. **Record visibility**: [`Caller::feedback_scope`],
///    [`Caller::can_read_feedback`] and [`Caller::form_visibility`].
///
/// All decisions here are pure; loading the records is the caller's job.
///
/// # Example
///
/// ```
/// use feedtrack_shared::auth::authorization::{Caller, FeedbackScope};
/// use uuid::Uuid;
///
/// let manager_id = Uuid::new_v4();
/// let caller = Caller::Manager { user_id: manager_id };
///
/// assert!(caller.require_employee().is_err());
/// let cap = caller.require_manager().unwrap();
/// assert_eq!(cap.manager_id(), manager_id);
/// assert_eq!(caller.feedback_scope(), FeedbackScope::AuthoredBy(manager_id));
/// ```

use uuid::Uuid;

use crate::models::feedback::Feedback;
use crate::models::form::Form;
use crate::models::user::{User, UserRole};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Manager access required")]
    ManagerRequired,

    #[error("Employee access required")]
    EmployeeRequired,

    /// Employee does not report to the acting manager
    #[error("Employee is not a member of your team")]
    NotInTeam,

    /// Caller is neither author, recipient nor owner
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// The authenticated subject of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Manager { user_id: Uuid },
    Employee { user_id: Uuid, manager_id: Option<Uuid> },
}

/// Proof that the caller is a manager
///
/// Only obtainable through [`Caller::require_manager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerCap {
    manager_id: Uuid,
}

/// Proof that the caller is an employee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmployeeCap {
    employee_id: Uuid,
    manager_id: Option<Uuid>,
}

/// Proof that an employee may file one of their manager's forms about
/// themselves
///
/// Only obtainable through [`Caller::form_submitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfSubmissionCap {
    employee_id: Uuid,
    manager_id: Uuid,
}

/// Who is submitting a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSubmitter {
    /// The owning manager, filling the form in for a team member
    Owner(ManagerCap),

    /// An employee of the owning manager, filling the form in about themselves
    TeamMember(SelfSubmissionCap),
}

/// Which feedback a caller may list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackScope {
    /// Feedback written by this manager
    AuthoredBy(Uuid),

    /// Feedback addressed to this employee
    AddressedTo(Uuid),
}

/// Whether a caller may read a given form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormVisibility {
    Visible,

    /// The form exists in the caller's scope but is inactive; reported as
    /// absent rather than forbidden
    Hidden,

    Denied,
}

impl Caller {
    /// Derives the caller from a loaded user row
    pub fn from_user(user: &User) -> Self {
        match user.role {
            UserRole::Manager => Caller::Manager { user_id: user.id },
            UserRole::Employee => Caller::Employee {
                user_id: user.id,
                manager_id: user.manager_id,
            },
        }
    }

    pub fn user_id(&self) -> Uuid {
        match *self {
            Caller::Manager { user_id } | Caller::Employee { user_id, .. } => user_id,
        }
    }

    pub fn role(&self) -> UserRole {
        match self {
            Caller::Manager { .. } => UserRole::Manager,
            Caller::Employee { .. } => UserRole::Employee,
        }
    }

    pub fn require_manager(&self) -> Result<ManagerCap, AuthzError> {
        match *self {
            Caller::Manager { user_id } => Ok(ManagerCap { manager_id: user_id }),
            Caller::Employee { .. } => Err(AuthzError::ManagerRequired),
        }
    }

    pub fn require_employee(&self) -> Result<EmployeeCap, AuthzError> {
        match *self {
            Caller::Employee { user_id, manager_id } => Ok(EmployeeCap {
                employee_id: user_id,
                manager_id,
            }),
            Caller::Manager { .. } => Err(AuthzError::EmployeeRequired),
        }
    }

    /// Feedback visible in listings: authored for managers, received for
    /// employees. There is no cross-role visibility.
    pub fn feedback_scope(&self) -> FeedbackScope {
        match *self {
            Caller::Manager { user_id } => FeedbackScope::AuthoredBy(user_id),
            Caller::Employee { user_id, .. } => FeedbackScope::AddressedTo(user_id),
        }
    }

    /// Only the author and the recipient may read a feedback record
    pub fn can_read_feedback(&self, feedback: &Feedback) -> Result<(), AuthzError> {
        let allowed = match self.feedback_scope() {
            FeedbackScope::AuthoredBy(id) => feedback.manager_id == id,
            FeedbackScope::AddressedTo(id) => feedback.employee_id == id,
        };

        if allowed {
            Ok(())
        } else {
            Err(AuthzError::NotAuthorized)
        }
    }

    /// Manager whose forms the caller sees
    ///
    /// None for an employee without a manager.
    pub fn form_scope(&self) -> Option<Uuid> {
        match *self {
            Caller::Manager { user_id } => Some(user_id),
            Caller::Employee { manager_id, .. } => manager_id,
        }
    }

    /// Managers read their own forms; employees read their manager's active
    /// forms
    pub fn form_visibility(&self, form: &Form) -> FormVisibility {
        match *self {
            Caller::Manager { user_id } if form.manager_id == user_id => FormVisibility::Visible,
            Caller::Employee { manager_id: Some(manager_id), .. } if form.manager_id == manager_id => {
                if form.is_active {
                    FormVisibility::Visible
                } else {
                    FormVisibility::Hidden
                }
            }
            _ => FormVisibility::Denied,
        }
    }

    /// Returns the manager capability if the caller owns `form`
    pub fn require_form_owner(&self, form: &Form) -> Result<ManagerCap, AuthzError> {
        let cap = self.require_manager()?;
        if form.manager_id == cap.manager_id {
            Ok(cap)
        } else {
            Err(AuthzError::NotAuthorized)
        }
    }

    /// The owner submits for their team; an employee of the owner submits
    /// for themselves. Everyone else is refused.
    pub fn form_submitter(&self, form: &Form) -> Result<FormSubmitter, AuthzError> {
        match *self {
            Caller::Manager { .. } => self.require_form_owner(form).map(FormSubmitter::Owner),
            Caller::Employee { user_id, manager_id: Some(manager_id) }
                if form.manager_id == manager_id =>
            {
                Ok(FormSubmitter::TeamMember(SelfSubmissionCap {
                    employee_id: user_id,
                    manager_id,
                }))
            }
            Caller::Employee { .. } => Err(AuthzError::NotAuthorized),
        }
    }
}

impl ManagerCap {
    pub fn manager_id(&self) -> Uuid {
        self.manager_id
    }

    /// Checks that `user` is an employee reporting to this manager
    pub fn require_team_member(&self, user: &User) -> Result<(), AuthzError> {
        if user.reports_to(self.manager_id) {
            Ok(())
        } else {
            Err(AuthzError::NotInTeam)
        }
    }
}

impl SelfSubmissionCap {
    pub fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    /// Manager the submission is attributed to
    pub fn manager_id(&self) -> Uuid {
        self.manager_id
    }
}

impl EmployeeCap {
    pub fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    pub fn manager_id(&self) -> Option<Uuid> {
        self.manager_id
    }
}
