//! Aggregated progress for a batch of downloads.
//!
//! One `BatchReport` backs the single status message of a bulk action.
//! Instead of substring-editing free text, the report keeps a per-slot
//! state table and renders the whole text on every transition, so
//! interleaved job completions cannot clobber each other's lines. Labels
//! the report does not own are ignored: a stale batch can never mutate a
//! report belonging to a newer one.

use crate::config;

/// Lifecycle of one download job inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Not started yet; queued slots render no line
    Queued,
    Downloading,
    Uploading {
        size_mib: f64,
    },
    Completed,
    Failed {
        reason: String,
    },
}

#[derive(Debug)]
struct Slot {
    label: String,
    state: JobState,
}

/// The evolving status text for one multi-item action.
#[derive(Debug)]
pub struct BatchReport {
    header: String,
    slots: Vec<Slot>,
}

impl BatchReport {
    /// A report owning one slot per job label, all queued.
    pub fn new(header: impl Into<String>, labels: &[String]) -> Self {
        Self {
            header: header.into(),
            slots: labels
                .iter()
                .map(|label| Slot {
                    label: label.clone(),
                    state: JobState::Queued,
                })
                .collect(),
        }
    }

    /// Append a line to the header (used for per-batch announcements).
    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = header.into();
    }

    /// Transition one slot. Returns false (and changes nothing) when the
    /// label is not part of this report.
    pub fn update(&mut self, label: &str, state: JobState) -> bool {
        match self.slots.iter_mut().find(|s| s.label == label) {
            Some(slot) => {
                slot.state = state;
                true
            }
            None => false,
        }
    }

    /// (completed, failed) counts for the final summary.
    pub fn tallies(&self) -> (usize, usize) {
        let completed = self.slots.iter().filter(|s| s.state == JobState::Completed).count();
        let failed = self
            .slots
            .iter()
            .filter(|s| matches!(s.state, JobState::Failed { .. }))
            .count();
        (completed, failed)
    }

    /// Render the full report text from the state table.
    pub fn render(&self) -> String {
        let mut text = self.header.clone();
        for slot in &self.slots {
            let line = match &slot.state {
                JobState::Queued => continue,
                JobState::Downloading => format!("⏳ downloading {}", slot.label),
                JobState::Uploading { size_mib } => {
                    format!("⬆️ uploading {} ({:.1} MiB)", slot.label, size_mib)
                }
                JobState::Completed => format!("✅ completed {}", slot.label),
                JobState::Failed { reason } => format!("❌ failed {}: {}", slot.label, reason),
            };
            text.push('\n');
            text.push_str(&line);
        }
        text
    }
}

/// Clip an error reason for chat display. Full detail stays in the log.
pub fn truncate_reason(reason: &str) -> String {
    let flat = reason.replace('\n', " ");
    if flat.chars().count() <= config::MAX_CHAT_REASON_CHARS {
        return flat;
    }
    flat.chars().take(config::MAX_CHAT_REASON_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("[{}/{}]", i + 1, n)).collect()
    }

    #[test]
    fn test_queued_slots_render_no_lines() {
        let report = BatchReport::new("Videos: 3", &labels(3));
        assert_eq!(report.render(), "Videos: 3");
    }

    #[test]
    fn test_transitions_replace_the_line_in_place() {
        let mut report = BatchReport::new("Videos: 2", &labels(2));
        report.update("[1/2]", JobState::Downloading);
        report.update("[2/2]", JobState::Downloading);
        report.update("[1/2]", JobState::Uploading { size_mib: 73.5 });
        assert_eq!(
            report.render(),
            "Videos: 2\n⬆️ uploading [1/2] (73.5 MiB)\n⏳ downloading [2/2]"
        );

        report.update("[1/2]", JobState::Completed);
        report.update(
            "[2/2]",
            JobState::Failed {
                reason: "no formats".to_string(),
            },
        );
        assert_eq!(
            report.render(),
            "Videos: 2\n✅ completed [1/2]\n❌ failed [2/2]: no formats"
        );
    }

    #[test]
    fn test_unknown_label_is_ignored() {
        let mut report = BatchReport::new("Videos: 1", &labels(1));
        let before = report.render();
        assert!(!report.update("[9/9]", JobState::Completed));
        assert_eq!(report.render(), before);
    }

    #[test]
    fn test_tallies_count_terminal_states() {
        let mut report = BatchReport::new("Videos: 3", &labels(3));
        report.update("[1/3]", JobState::Completed);
        report.update(
            "[2/3]",
            JobState::Failed {
                reason: "x".to_string(),
            },
        );
        assert_eq!(report.tallies(), (1, 1));
    }

    #[test]
    fn test_truncate_reason_clips_to_100_chars() {
        let long = "e".repeat(250);
        assert_eq!(truncate_reason(&long).chars().count(), 100);
        assert_eq!(truncate_reason("short"), "short");
    }

    #[test]
    fn test_truncate_reason_flattens_newlines() {
        assert_eq!(truncate_reason("line one\nline two"), "line one line two");
    }
}
