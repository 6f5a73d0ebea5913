//! Response-time SLAs per priority.

use chrono::{DateTime, Duration, Utc};
use tierline_config::EscalationConfig;
use tierline_core::escalation::{Escalation, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaTable {
    pub urgent_hours: u32,
    pub high_hours: u32,
    pub medium_hours: u32,
    pub low_hours: u32,
}

impl SlaTable {
    pub fn from_config(config: &EscalationConfig) -> Self {
        Self {
            urgent_hours: config.sla_urgent_hours,
            high_hours: config.sla_high_hours,
            medium_hours: config.sla_medium_hours,
            low_hours: config.sla_low_hours,
        }
    }

    pub fn hours_for(&self, priority: Priority) -> u32 {
        match priority {
            Priority::Urgent => self.urgent_hours,
            Priority::High => self.high_hours,
            Priority::Medium => self.medium_hours,
            Priority::Low => self.low_hours,
        }
    }

    pub fn deadline(&self, escalation: &Escalation) -> DateTime<Utc> {
        escalation.created_at + Duration::hours(i64::from(self.hours_for(escalation.priority)))
    }

    /// Past its SLA and still open. Terminal escalations are never overdue.
    pub fn is_overdue(&self, escalation: &Escalation, now: DateTime<Utc>) -> bool {
        !escalation.status.is_terminal() && now > self.deadline(escalation)
    }
}

impl Default for SlaTable {
    fn default() -> Self {
        Self::from_config(&EscalationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aged(priority: Priority, hours: i64) -> Escalation {
        let mut esc = Escalation::new("s1", "acme", "r", priority);
        esc.created_at = Utc::now() - Duration::hours(hours);
        esc
    }

    #[test]
    fn defaults_match_priorities() {
        let sla = SlaTable::default();
        assert_eq!(sla.hours_for(Priority::Urgent), 1);
        assert_eq!(sla.hours_for(Priority::High), 4);
        assert_eq!(sla.hours_for(Priority::Medium), 24);
        assert_eq!(sla.hours_for(Priority::Low), 72);
    }

    #[test]
    fn overdue_after_sla() {
        let sla = SlaTable::default();
        let now = Utc::now();
        assert!(sla.is_overdue(&aged(Priority::Urgent, 2), now));
        assert!(!sla.is_overdue(&aged(Priority::High, 3), now));
        assert!(sla.is_overdue(&aged(Priority::Medium, 25), now));
        assert!(!sla.is_overdue(&aged(Priority::Low, 71), now));
    }

    #[test]
    fn terminal_is_never_overdue() {
        let sla = SlaTable::default();
        let mut esc = aged(Priority::Urgent, 100);
        esc.close().unwrap();
        assert!(!sla.is_overdue(&esc, Utc::now()));
    }
}
