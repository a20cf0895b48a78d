use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::gtfs::records::{CalendarException, CalendarRule, ExceptionKind};

/// The resolved calendar space: weekly rules plus per-date exceptions.
///
/// Owns plain maps so resolution is a pure function of the data it was
/// built from. Input is assumed validated (unique service ids, unique
/// (service_id, date) exception pairs) — ingestion rejects anything else.
pub struct ServiceCalendar {
    rules: HashMap<String, CalendarRule>,
    /// service_id -> date -> override.
    exceptions: HashMap<String, BTreeMap<NaiveDate, ExceptionKind>>,
}

impl ServiceCalendar {
    pub fn new(rules: Vec<CalendarRule>, exceptions: Vec<CalendarException>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| (r.service_id.clone(), r))
            .collect();
        let mut by_service: HashMap<String, BTreeMap<NaiveDate, ExceptionKind>> = HashMap::new();
        for exc in exceptions {
            by_service
                .entry(exc.service_id)
                .or_default()
                .insert(exc.date, exc.kind);
        }
        ServiceCalendar {
            rules,
            exceptions: by_service,
        }
    }

    /// Whether a service operates on the given date.
    ///
    /// An exception for (service, date) overrides the weekly rule
    /// unconditionally, including adding service outside the rule's date
    /// range. With no exception, the rule's inclusive date range and
    /// day-of-week flag decide; a service with no rule never runs.
    pub fn is_active(&self, service_id: &str, date: NaiveDate) -> bool {
        if let Some(overrides) = self.exceptions.get(service_id) {
            if let Some(kind) = overrides.get(&date) {
                return *kind == ExceptionKind::Added;
            }
        }
        let Some(rule) = self.rules.get(service_id) else {
            return false;
        };
        if date < rule.start_date || date > rule.end_date {
            return false;
        }
        rule.days[date.weekday().num_days_from_monday() as usize]
    }

    /// Every known service id, rule-bearing or exceptions-only, sorted.
    pub fn service_ids(&self) -> Vec<&str> {
        let ids: BTreeSet<&str> = self
            .rules
            .keys()
            .map(String::as_str)
            .chain(self.exceptions.keys().map(String::as_str))
            .collect();
        ids.into_iter().collect()
    }

    /// The sorted subset of services active on a date.
    pub fn active_services(&self, date: NaiveDate) -> Vec<&str> {
        self.service_ids()
            .into_iter()
            .filter(|id| self.is_active(id, date))
            .collect()
    }
}
