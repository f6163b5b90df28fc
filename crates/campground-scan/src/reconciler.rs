//! Turns one poll's observations into state changes and due alerts.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};

use crate::scan_types::{Site, VacancyInfo, WatchTarget};
use crate::source::AvailabilitySource;
use crate::state_store::{DEFAULT_REALERT_AFTER, VacancyState};
use crate::vacancy_key::{VacancyKey, derive_key};

/// Tuning for a reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// How long a vacancy stays quiet after being announced
    pub realert_after: Duration,

    /// Keep a target's tracked vacancies when its fetch fails instead of
    /// pruning them. Off by default: a failed fetch counts as "not observed".
    pub retain_on_fetch_error: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            realert_after: DEFAULT_REALERT_AFTER,
            retain_on_fetch_error: false,
        }
    }
}

/// A target whose fetch failed during the pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    /// Park of the failed target
    pub park: String,
    /// Error reported by the source
    pub error: String,
}

/// Counters describing one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Active targets fetched successfully
    pub targets_checked: usize,
    /// Inactive targets
    pub targets_skipped: usize,
    /// Active targets whose fetch failed
    pub failed_targets: Vec<TargetFailure>,
    /// Site observations returned across all targets
    pub sites_observed: usize,
    /// Vacancies announced for the first time
    pub new_vacancies: usize,
    /// Vacancies announced again after the re-alert threshold
    pub realerts: usize,
    /// Tracked vacancies dropped because they were not observed
    pub pruned: usize,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked={} skipped={} failed={} sites={} new={} realerts={} pruned={}",
            self.targets_checked,
            self.targets_skipped,
            self.failed_targets.len(),
            self.sites_observed,
            self.new_vacancies,
            self.realerts,
            self.pruned
        )
    }
}

/// Outcome of a pass
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// State after updates and pruning
    pub state: VacancyState,
    /// Vacancies due for announcement, in target, observation, range order
    pub alerts: Vec<VacancyInfo>,
    /// Pass statistics
    pub report: ReconcileReport,
}

/// Run one reconciliation pass over all watch targets.
///
/// A failing fetch is logged and skipped; it never aborts the pass. Keys not
/// observed as open anywhere in this pass are pruned once at the end.
pub async fn reconcile(
    targets: &[WatchTarget],
    source: &dyn AvailabilitySource,
    state: VacancyState,
    now: DateTime<Utc>,
    options: &ReconcileOptions,
) -> Reconciliation {
    let mut pass = Pass {
        state,
        observed: BTreeSet::new(),
        alerts: Vec::new(),
        report: ReconcileReport::default(),
        now,
        options,
    };

    for target in targets {
        if !target.active {
            debug!("Skipping inactive target {}", target.park);
            pass.report.targets_skipped += 1;
            continue;
        }

        match source
            .get_available_sites(&target.park, &target.date_ranges)
            .await
        {
            Ok(sites) => pass.observe_target(target, &sites),
            Err(e) => pass.fetch_failed(target, &e.to_string()),
        }
    }

    pass.finish()
}

struct Pass<'a> {
    state: VacancyState,
    observed: BTreeSet<VacancyKey>,
    alerts: Vec<VacancyInfo>,
    report: ReconcileReport,
    now: DateTime<Utc>,
    options: &'a ReconcileOptions,
}

impl Pass<'_> {
    fn observe_target(&mut self, target: &WatchTarget, sites: &[Site]) {
        debug!("{} returned {} sites", target.park, sites.len());
        self.report.targets_checked += 1;
        self.report.sites_observed += sites.len();

        for site in sites {
            for range in &target.date_ranges {
                if !site.is_open_during(range) {
                    continue;
                }

                let key = derive_key(&site.site_id, range.start, range.end);
                self.observed.insert(key.clone());
                let info = VacancyInfo::for_site(&target.park, site, range);

                if self.state.is_new(&key) {
                    debug!("New vacancy {}", key);
                    self.state.record_first_alert(key, info.clone(), self.now);
                    self.alerts.push(info);
                    self.report.new_vacancies += 1;
                } else if self
                    .state
                    .is_realert_due(&key, self.now, self.options.realert_after)
                {
                    debug!("Vacancy {} still open past re-alert threshold", key);
                    self.state.reset_alert_timer(&key, self.now);
                    self.alerts.push(info);
                    self.report.realerts += 1;
                }
            }
        }
    }

    fn fetch_failed(&mut self, target: &WatchTarget, error: &str) {
        error!("Failed to fetch availability for {}: {}", target.park, error);

        if self.options.retain_on_fetch_error {
            let retained: Vec<VacancyKey> = self
                .state
                .iter()
                .filter(|(_, record)| record.info.park == target.park)
                .map(|(key, _)| key.clone())
                .collect();
            debug!(
                "Retaining {} vacancies of {} despite fetch failure",
                retained.len(),
                target.park
            );
            self.observed.extend(retained);
        }

        self.report.failed_targets.push(TargetFailure {
            park: target.park.clone(),
            error: error.to_string(),
        });
    }

    fn finish(mut self) -> Reconciliation {
        let before = self.state.len();
        let state = self.state.prune(&self.observed);
        self.report.pruned = before - state.len();

        info!("Reconciliation complete: {}", self.report);

        Reconciliation {
            state,
            alerts: self.alerts,
            report: self.report,
        }
    }
}
