use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for employees. Holds either the final external ID or a
/// temporary placeholder issued at onboarding (see [`super::identity`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for company-leave requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveRequestId(pub String);

impl fmt::Display for LeaveRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Privilege levels resolved by the identity boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Staff,
    Guest,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Guest => "guest",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Admin => 2,
            Self::Staff => 1,
            Self::Guest => 0,
        }
    }

    /// Whether this role meets or exceeds the required privilege floor.
    pub const fn covers(self, required: ActorRole) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The person (or system component) performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Consumed identity boundary: token in, resolved actor out. Credential
/// management stays outside the core.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Actor;
}

/// Company-leave categories handled by the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyLeaveKind {
    Despido,
    Voluntaria,
    Nspp,
    Anulacion,
}

impl CompanyLeaveKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Despido => "despido",
            Self::Voluntaria => "voluntaria",
            Self::Nspp => "nspp",
            Self::Anulacion => "anulacion",
        }
    }
}

/// Flat status labels backing the transition graph and serialized views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    PendienteActivacion,
    Active,
    ItLeave,
    CompanyLeavePending,
    CompanyLeaveApproved,
    PendingLaboral,
    Penalizado,
}

impl EmployeeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendienteActivacion => "pendiente_activacion",
            Self::Active => "active",
            Self::ItLeave => "it_leave",
            Self::CompanyLeavePending => "company_leave_pending",
            Self::CompanyLeaveApproved => "company_leave_approved",
            Self::PendingLaboral => "pending_laboral",
            Self::Penalizado => "penalizado",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Employee state as a tagged union. Preserved hours exist only inside the
/// variants that zero the live allocation, and a penalization end date only
/// inside `Penalizado`, so the illegal combinations the flat status + nullable
/// columns allowed are unrepresentable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmployeeState {
    PendienteActivacion,
    Active,
    ItLeave {
        preserved_hours: u32,
    },
    CompanyLeavePending {
        request_id: LeaveRequestId,
        preserved_hours: u32,
    },
    CompanyLeaveApproved {
        preserved_hours: u32,
    },
    PendingLaboral,
    Penalizado {
        ends_on: NaiveDate,
        preserved_hours: u32,
    },
}

impl EmployeeState {
    pub fn status(&self) -> EmployeeStatus {
        match self {
            Self::PendienteActivacion => EmployeeStatus::PendienteActivacion,
            Self::Active => EmployeeStatus::Active,
            Self::ItLeave { .. } => EmployeeStatus::ItLeave,
            Self::CompanyLeavePending { .. } => EmployeeStatus::CompanyLeavePending,
            Self::CompanyLeaveApproved { .. } => EmployeeStatus::CompanyLeaveApproved,
            Self::PendingLaboral => EmployeeStatus::PendingLaboral,
            Self::Penalizado { .. } => EmployeeStatus::Penalizado,
        }
    }

    /// The banked hours figure, when this state carries one.
    pub fn preserved_hours(&self) -> Option<u32> {
        match self {
            Self::ItLeave { preserved_hours }
            | Self::CompanyLeavePending {
                preserved_hours, ..
            }
            | Self::CompanyLeaveApproved { preserved_hours }
            | Self::Penalizado {
                preserved_hours, ..
            } => Some(*preserved_hours),
            Self::PendienteActivacion | Self::Active | Self::PendingLaboral => None,
        }
    }

    pub fn penalization_end(&self) -> Option<NaiveDate> {
        match self {
            Self::Penalizado { ends_on, .. } => Some(*ends_on),
            _ => None,
        }
    }
}

/// Personal, contract, and lifecycle fields tracked for every employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub assigned_hours: u32,
    #[serde(flatten)]
    pub state: EmployeeState,
    pub hired_on: NaiveDate,
    pub updated_on: NaiveDate,
}

impl Employee {
    pub fn status(&self) -> EmployeeStatus {
        self.state.status()
    }

    pub fn status_view(&self) -> EmployeeView {
        EmployeeView {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            status: self.status().label(),
            assigned_hours: self.assigned_hours,
            preserved_hours: self.state.preserved_hours(),
            penalization_ends_on: self.state.penalization_end(),
        }
    }
}

/// Intake payload for onboarding a new employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Final external identifier. Absent when the hire is admitted before the
    /// external system has issued one; a temporary placeholder is allocated
    /// instead, which only a top-privilege actor may do.
    pub external_id: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub assigned_hours: u32,
    pub hired_on: NaiveDate,
}

/// Serialized employee summary for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    pub id: EmployeeId,
    pub full_name: String,
    pub status: &'static str,
    pub assigned_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserved_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalization_ends_on: Option<NaiveDate>,
}
