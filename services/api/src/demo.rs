use crate::infra::{InMemoryEmployeeRepository, InMemoryNotificationPublisher};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use staffline::error::AppError;
use staffline::lifecycle::{
    Actor, ActorRole, CompanyLeaveKind, EmployeeId, EmployeeLifecycleService, EmployeeView,
    LeaveDecision, NewEmployee, TransitionOutcome, TransitionRequest,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Anchor date for the walkthrough (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn intake(external_id: Option<&str>, name: &str, hours: u32, hired_on: NaiveDate) -> NewEmployee {
    NewEmployee {
        external_id: external_id.map(str::to_string),
        full_name: name.to_string(),
        email: Some(format!(
            "{}@example.com",
            name.to_ascii_lowercase().replace(' ', ".")
        )),
        phone: None,
        assigned_hours: hours,
        hired_on,
    }
}

fn print_view(label: &str, view: &EmployeeView) {
    let banked = view
        .preserved_hours
        .map(|hours| format!(" | {hours}h banked"))
        .unwrap_or_default();
    let until = view
        .penalization_ends_on
        .map(|date| format!(" | until {date}"))
        .unwrap_or_default();
    println!(
        "- {label}: {} [{}] {}h{banked}{until}",
        view.id, view.status, view.assigned_hours
    );
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let admin = Actor::new("operations-admin", ActorRole::Admin);
    let staff = Actor::new("operations-staff", ActorRole::Staff);

    let repository = Arc::new(InMemoryEmployeeRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = EmployeeLifecycleService::new(repository, notifications.clone());

    println!("Employee lifecycle demo (anchor date {today})");

    println!("\nOnboarding");
    let ana = service.onboard(
        intake(Some("E-1001"), "Ana Soler", 40, today - Duration::days(90)),
        &staff,
        today,
    )?;
    print_view("hired with final ID", &ana.employee.status_view());
    let bruno = service.onboard(
        intake(Some("E-1002"), "Bruno Ortiz", 35, today - Duration::days(60)),
        &staff,
        today,
    )?;
    print_view("hired with final ID", &bruno.employee.status_view());
    let placeholder = service.onboard(intake(None, "Clara Ibanez", 20, today), &admin, today)?;
    print_view("admitted on placeholder", &placeholder.employee.status_view());

    println!("\nMedical leave and return");
    let outcome = service.apply_transition(
        &ana.employee.id,
        TransitionRequest::ItLeave,
        &staff,
        today + Duration::days(1),
    )?;
    if let TransitionOutcome::Applied { employee } = &outcome {
        print_view("medical leave opened", employee);
    }
    let outcome = service.apply_transition(
        &ana.employee.id,
        TransitionRequest::Reactivate,
        &staff,
        today + Duration::days(10),
    )?;
    if let TransitionOutcome::Applied { employee } = &outcome {
        print_view("back on the roster", employee);
    }

    println!("\nPenalization and automatic expiry");
    let outcome = service.apply_transition(
        &bruno.employee.id,
        TransitionRequest::Penalize {
            ends_on: today + Duration::days(2),
        },
        &staff,
        today,
    )?;
    if let TransitionOutcome::Applied { employee } = &outcome {
        print_view("penalized", employee);
    }
    let expiring = service.expiring_within(7, today)?;
    for entry in &expiring {
        println!(
            "- expiry alert: {} ends {} ({} days left)",
            entry.employee_id, entry.ends_on, entry.days_left
        );
    }
    let reactivated = service.sweep_expired(today + Duration::days(3))?;
    for view in &reactivated {
        print_view("swept back to active", view);
    }

    println!("\nCompany leave approval workflow");
    let request = service.propose_company_leave(
        &ana.employee.id,
        CompanyLeaveKind::Voluntaria,
        today + Duration::days(30),
        &staff,
        today + Duration::days(12),
    )?;
    println!(
        "- request {} ({}) pending for {}",
        request.id,
        request.kind.label(),
        request.employee_id
    );
    let resolved = service.resolve_company_leave(
        &request.id,
        LeaveDecision::Approve,
        &admin,
        today + Duration::days(13),
    )?;
    println!(
        "- request {} {} by {}",
        resolved.id,
        resolved.status.label(),
        resolved.resolved_by.as_deref().unwrap_or("-")
    );
    let history = service.leave_history(&ana.employee.id)?;
    for snapshot in &history.company {
        println!(
            "- archived: {} ({}) leaves on {}, {}h preserved in the snapshot",
            snapshot.full_name,
            snapshot.kind.label(),
            snapshot.leave_date,
            snapshot.preserved_hours
        );
    }

    println!("\nIdentity resolution");
    let activated = service.resolve_identity(
        &placeholder.employee.id,
        EmployeeId("X-2077".to_string()),
        &admin,
        today + Duration::days(5),
    )?;
    print_view("placeholder resolved", &activated.employee.status_view());

    println!("\nNotifications handed to the delivery layer");
    for event in notifications.events() {
        println!("- [{:?}] {}", event.status, event.message);
    }

    Ok(())
}
