//! Ticket labels grouped per ticket.
//!
//! Labels are fetched as one row per (ticket, label) mapping and grouped
//! here, so a label whose name contains a comma stays a single label.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketLabel {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Raw mapping row as returned by the label query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRow {
    pub ticket_id: i64,
    pub label: TicketLabel,
}

/// Labels attached to one ticket, ordered by name then id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<TicketLabel>);

impl LabelSet {
    pub fn new(mut labels: Vec<TicketLabel>) -> Self {
        let mut seen = HashSet::new();
        labels.retain(|label| seen.insert(label.id));
        labels.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TicketLabel> {
        self.0.iter()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.0.iter().map(|label| label.id).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|label| label.name.as_str()).collect()
    }

    pub fn colors(&self) -> Vec<&str> {
        self.0.iter().map(|label| label.color.as_str()).collect()
    }

    pub fn icons(&self) -> Vec<&str> {
        self.0.iter().map(|label| label.icon.as_str()).collect()
    }
}

/// Group label rows by ticket id. Duplicate mappings collapse to one label.
pub fn group_labels(rows: impl IntoIterator<Item = LabelRow>) -> HashMap<i64, LabelSet> {
    let mut grouped: HashMap<i64, Vec<TicketLabel>> = HashMap::new();
    for row in rows {
        grouped.entry(row.ticket_id).or_default().push(row.label);
    }
    grouped
        .into_iter()
        .map(|(ticket_id, labels)| (ticket_id, LabelSet::new(labels)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ticket_id: i64, id: i64, name: &str) -> LabelRow {
        LabelRow {
            ticket_id,
            label: TicketLabel {
                id,
                name: name.to_string(),
                color: format!("color-{id}"),
                icon: format!("icon-{id}"),
            },
        }
    }

    #[test]
    fn groups_rows_per_ticket_sorted_by_name() {
        let grouped = group_labels(vec![
            row(1, 10, "urgent"),
            row(2, 11, "billing"),
            row(1, 12, "bug"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&1].names(), vec!["bug", "urgent"]);
        assert_eq!(grouped[&1].colors(), vec!["color-12", "color-10"]);
        assert_eq!(grouped[&2].ids(), vec![11]);
    }

    #[test]
    fn duplicate_mappings_collapse() {
        let grouped = group_labels(vec![row(1, 10, "urgent"), row(1, 10, "urgent")]);
        assert_eq!(grouped[&1].len(), 1);
    }

    #[test]
    fn parallel_views_stay_aligned_when_colors_repeat() {
        let mut first = row(1, 1, "a");
        let mut second = row(1, 2, "b");
        first.label.color = "red".to_string();
        second.label.color = "red".to_string();

        let set = &group_labels(vec![first, second])[&1];
        assert_eq!(set.names().len(), set.colors().len());
        assert_eq!(set.colors().len(), set.icons().len());
    }

    #[test]
    fn names_with_commas_are_not_split() {
        let set = &group_labels(vec![row(1, 1, "needs info, customer")])[&1];
        assert_eq!(set.names(), vec!["needs info, customer"]);
    }

    #[test]
    fn empty_set_serializes_as_empty_array() {
        let json = serde_json::to_value(LabelSet::default()).expect("serialize");
        assert_eq!(json, serde_json::json!([]));
    }
}
