//! Presentation rules shared by every view of the workflow.

use insights_core::{Evidence, GenerationReceipt, GenerationRun, InsightItem, Priority};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Red,
    Yellow,
    Gray,
}

impl Tone {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Tone::Red => (0xdc, 0x26, 0x26),
            Tone::Yellow => (0xca, 0x8a, 0x04),
            Tone::Gray => (0x6b, 0x72, 0x80),
        }
    }
}

/// Same mapping for the stats summary and the per-card badges.
pub fn priority_tone(priority: Priority) -> Tone {
    match priority {
        Priority::High => Tone::Red,
        Priority::Medium => Tone::Yellow,
        Priority::Low => Tone::Gray,
    }
}

/// Per-card collapsed/expanded state. Cards start collapsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardExpansion {
    expanded: HashSet<String>,
}

impl CardExpansion {
    pub fn toggle(&mut self, insight_id: &str) {
        if !self.expanded.remove(insight_id) {
            self.expanded.insert(insight_id.to_string());
        }
    }

    pub fn is_expanded(&self, insight_id: &str) -> bool {
        self.expanded.contains(insight_id)
    }

    pub fn evidence_visible(&self, item: &InsightItem) -> bool {
        self.is_expanded(&item.id) && !item.evidence.is_empty()
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}

pub fn evidence_label(evidence: &Evidence) -> &str {
    evidence
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(&evidence.url)
}

pub fn evidence_attribution(evidence: &Evidence) -> Option<String> {
    evidence
        .author_username
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|author| format!("by u/{author}"))
}

pub fn run_label(run: &GenerationRun) -> String {
    format!(
        "{} · {} days · {} insights from {} items · {}",
        run.scope,
        run.period_days,
        run.insight_count,
        run.content_analyzed,
        run.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

pub fn generation_summary(receipt: &GenerationReceipt) -> String {
    match (&receipt.message, &receipt.counts) {
        (Some(message), _) if !message.trim().is_empty() => message.clone(),
        (_, Some(counts)) => format!(
            "Generated {} insights from {} items",
            counts.insights, counts.content_analyzed
        ),
        _ => "Insights generated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::{GenerationCounts, InsightKind};

    fn evidence(title: Option<&str>, author: Option<&str>) -> Evidence {
        Evidence {
            id: "e".to_string(),
            title: title.map(str::to_string),
            url: "https://reddit.com/r/webflow/abc".to_string(),
            author_username: author.map(str::to_string),
        }
    }

    #[test]
    fn test_priority_palette() {
        assert_eq!(priority_tone(Priority::High), Tone::Red);
        assert_eq!(priority_tone(Priority::Medium), Tone::Yellow);
        assert_eq!(priority_tone(Priority::Low), Tone::Gray);
    }

    #[test]
    fn test_cards_expand_independently() {
        let with_evidence = InsightItem {
            id: "a".to_string(),
            kind: InsightKind::Trend,
            title: "t".to_string(),
            description: "d".to_string(),
            priority: Priority::Low,
            evidence: vec![evidence(None, None)],
        };
        let without_evidence = InsightItem {
            id: "b".to_string(),
            evidence: Vec::new(),
            ..with_evidence.clone()
        };

        let mut cards = CardExpansion::default();
        assert!(!cards.evidence_visible(&with_evidence));

        cards.toggle("a");
        cards.toggle("b");
        assert!(cards.evidence_visible(&with_evidence));
        assert!(cards.is_expanded("b"));
        assert!(!cards.evidence_visible(&without_evidence));

        cards.toggle("a");
        assert!(!cards.is_expanded("a"));
        assert!(cards.is_expanded("b"));
    }

    #[test]
    fn test_evidence_labels() {
        assert_eq!(
            evidence_label(&evidence(None, None)),
            "https://reddit.com/r/webflow/abc"
        );
        assert_eq!(evidence_label(&evidence(Some("CMS limits"), None)), "CMS limits");
        assert_eq!(
            evidence_attribution(&evidence(None, Some("alice"))).as_deref(),
            Some("by u/alice")
        );
        assert!(evidence_attribution(&evidence(None, None)).is_none());
    }

    #[test]
    fn test_generation_summary() {
        let receipt = GenerationReceipt {
            generation_id: Some("g".to_string()),
            message: None,
            counts: Some(GenerationCounts {
                content_analyzed: 120,
                insights: 9,
            }),
        };
        assert_eq!(
            generation_summary(&receipt),
            "Generated 9 insights from 120 items"
        );
    }
}
