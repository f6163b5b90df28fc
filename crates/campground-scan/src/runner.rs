//! One scheduled invocation: load state, reconcile, alert, persist.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::AppConfig;
use crate::notifier::{AlertDispatcher, AlertOutcome, NotificationError};
use crate::reconciler::{ReconcileReport, reconcile};
use crate::scan_types::VacancyInfo;
use crate::source::AvailabilitySource;
use crate::state_store::{StateError, StateStore, VacancyState};

/// How an invocation treats its side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Send alerts for due vacancies and persist state
    Live,
    /// Print would-be alerts; no notifications, no persistence
    DryRun,
    /// Always send one forced notification, bypassing quiet hours and dedup
    TestNotify,
}

/// Errors that abort an invocation
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Alert delivery failed
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// State could not be persisted
    #[error(transparent)]
    State(#[from] StateError),
}

/// Result of an invocation
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// State after the pass (persisted unless dry run)
    pub state: VacancyState,
    /// Vacancies that were due for announcement
    pub alerts: Vec<VacancyInfo>,
    /// Pass statistics
    pub report: ReconcileReport,
    /// Delivery details, when a notification was sent
    pub delivery: Option<AlertOutcome>,
}

/// Placeholder announced by a test notification when nothing is due
pub fn test_vacancy() -> VacancyInfo {
    VacancyInfo {
        park: "Test Park".to_string(),
        name: "Test Site".to_string(),
        dates: "test".to_string(),
        url: "https://www.recreation.gov".to_string(),
    }
}

/// Lines printed by a dry run
pub fn dry_run_summary(alerts: &[VacancyInfo]) -> Vec<String> {
    let mut lines = vec![format!(
        "[DRY RUN] Would alert for {} vacancy(ies):",
        alerts.len()
    )];
    lines.extend(
        alerts
            .iter()
            .map(|v| format!("  - {} ({}): {}", v.name, v.park, v.url)),
    );
    lines
}

/// Run one full reconciliation pass and deliver its alerts.
///
/// State is saved only after delivery succeeds, and never in dry-run mode; a
/// failed alert leaves the previous state on disk so the vacancies are
/// announced again on the next run.
pub async fn run(
    config: &AppConfig,
    mode: RunMode,
    source: &dyn AvailabilitySource,
    dispatcher: &AlertDispatcher,
    store: &StateStore,
    now: DateTime<Utc>,
) -> Result<RunOutcome, RunError> {
    let prior = store.load();
    info!(
        "Starting {:?} run with {} tracked vacancies and {} targets",
        mode,
        prior.len(),
        config.targets.len()
    );

    let pass = reconcile(
        &config.targets,
        source,
        prior,
        now,
        &config.reconcile_options(),
    )
    .await;

    let delivery = match mode {
        RunMode::DryRun => {
            for line in dry_run_summary(&pass.alerts) {
                println!("{}", line);
            }
            None
        }
        RunMode::TestNotify => {
            let payload = if pass.alerts.is_empty() {
                vec![test_vacancy()]
            } else {
                pass.alerts.clone()
            };
            dispatcher.send_alert(&payload, true, now).await?
        }
        RunMode::Live => dispatcher.send_alert(&pass.alerts, false, now).await?,
    };

    if mode != RunMode::DryRun {
        store.save(&pass.state)?;
    }

    Ok(RunOutcome {
        state: pass.state,
        alerts: pass.alerts,
        report: pass.report,
        delivery,
    })
}
