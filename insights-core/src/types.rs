use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    PainPoint,
    FeatureRequest,
    Opportunity,
    Highlight,
    Trend,
}

impl InsightKind {
    /// Display order of insight sections.
    pub const ORDER: [InsightKind; 5] = [
        InsightKind::PainPoint,
        InsightKind::FeatureRequest,
        InsightKind::Opportunity,
        InsightKind::Highlight,
        InsightKind::Trend,
    ];

    pub fn section_title(self) -> &'static str {
        match self {
            InsightKind::PainPoint => "Pain Points",
            InsightKind::FeatureRequest => "Feature Requests",
            InsightKind::Opportunity => "Opportunities",
            InsightKind::Highlight => "Highlights",
            InsightKind::Trend => "Trends",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub author_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Insights bucketed by kind, shaped like the `insights` object of the
/// current-insights response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightGroups {
    #[serde(default)]
    pub pain_points: Vec<InsightItem>,
    #[serde(default)]
    pub feature_requests: Vec<InsightItem>,
    #[serde(default)]
    pub opportunities: Vec<InsightItem>,
    #[serde(default)]
    pub highlights: Vec<InsightItem>,
    #[serde(default)]
    pub trends: Vec<InsightItem>,
}

impl InsightGroups {
    /// Regroups a flat insight list. Relative order within a kind is kept.
    pub fn from_flat(items: impl IntoIterator<Item = InsightItem>) -> Self {
        let mut groups = Self::default();
        for item in items {
            groups.group_mut(item.kind).push(item);
        }
        groups
    }

    pub fn group(&self, kind: InsightKind) -> &[InsightItem] {
        match kind {
            InsightKind::PainPoint => &self.pain_points,
            InsightKind::FeatureRequest => &self.feature_requests,
            InsightKind::Opportunity => &self.opportunities,
            InsightKind::Highlight => &self.highlights,
            InsightKind::Trend => &self.trends,
        }
    }

    fn group_mut(&mut self, kind: InsightKind) -> &mut Vec<InsightItem> {
        match kind {
            InsightKind::PainPoint => &mut self.pain_points,
            InsightKind::FeatureRequest => &mut self.feature_requests,
            InsightKind::Opportunity => &mut self.opportunities,
            InsightKind::Highlight => &mut self.highlights,
            InsightKind::Trend => &mut self.trends,
        }
    }

    /// Non-empty groups in display order.
    pub fn sections(&self) -> impl Iterator<Item = (InsightKind, &[InsightItem])> + '_ {
        InsightKind::ORDER
            .into_iter()
            .map(move |kind| (kind, self.group(kind)))
            .filter(|(_, items)| !items.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &InsightItem> + '_ {
        InsightKind::ORDER
            .into_iter()
            .flat_map(move |kind| self.group(kind).iter())
    }

    pub fn len(&self) -> usize {
        InsightKind::ORDER
            .iter()
            .map(|kind| self.group(*kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StatsSummary {
        StatsSummary::from_items(self.iter())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl StatsSummary {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a InsightItem>) -> Self {
        let mut stats = Self::default();
        for item in items {
            stats.total += 1;
            match item.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
        }
        stats
    }

    pub fn count(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// Community a generation run is bounded to. Serialized as the bare
/// subreddit name, with `"all"`, an empty string or `null` meaning every
/// tracked community.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Scope {
    #[default]
    All,
    Community(String),
}

impl Scope {
    pub fn subreddit(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Community(name) => Some(name),
        }
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Scope::All
        } else {
            Scope::Community(trimmed.to_string())
        }
    }
}

impl From<Option<String>> for Scope {
    fn from(value: Option<String>) -> Self {
        value.map(Scope::from).unwrap_or_default()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => "all".to_string(),
            Scope::Community(name) => name,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "All communities"),
            Scope::Community(name) => write!(f, "r/{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PeriodDays {
    #[default]
    Week,
    TwoWeeks,
    Month,
}

impl PeriodDays {
    pub const ALL: [PeriodDays; 3] = [PeriodDays::Week, PeriodDays::TwoWeeks, PeriodDays::Month];

    pub fn days(self) -> u32 {
        match self {
            PeriodDays::Week => 7,
            PeriodDays::TwoWeeks => 14,
            PeriodDays::Month => 30,
        }
    }
}

impl TryFrom<u32> for PeriodDays {
    type Error = String;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(PeriodDays::Week),
            14 => Ok(PeriodDays::TwoWeeks),
            30 => Ok(PeriodDays::Month),
            other => Err(format!("unsupported period of {other} days (expected 7, 14 or 30)")),
        }
    }
}

impl From<PeriodDays> for u32 {
    fn from(period: PeriodDays) -> Self {
        period.days()
    }
}

impl fmt::Display for PeriodDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Last {} days", self.days())
    }
}

/// One completed generation, as listed in the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRun {
    pub id: String,
    #[serde(rename = "subreddit", default)]
    pub scope: Scope,
    pub period_days: u32,
    #[serde(default)]
    pub content_analyzed: u64,
    #[serde(default)]
    pub insight_count: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationHistory {
    pub generations: Vec<GenerationRun>,
    pub available_subreddits: Vec<ScopeOption>,
    pub total: u64,
}

impl GenerationHistory {
    /// Scope choices for the generation form, `All` first.
    pub fn scopes(&self) -> Vec<Scope> {
        let mut scopes = vec![Scope::All];
        for option in &self.available_subreddits {
            let scope = Scope::from(option.value.clone());
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes
    }
}

/// The unscoped, most recent insight set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentInsights {
    pub groups: InsightGroups,
    pub generated_at: Option<DateTime<Utc>>,
    /// Set by the backend only when there is nothing to show.
    pub message: Option<String>,
}

/// A single historical generation, already regrouped for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInsights {
    pub generation_id: String,
    pub groups: InsightGroups,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCounts {
    #[serde(default)]
    pub content_analyzed: u64,
    #[serde(default)]
    pub insights: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Omitted for `Scope::All`; the backend reads absence as "all".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    pub period_days: u32,
}

impl GenerateRequest {
    pub fn new(scope: &Scope, period: PeriodDays) -> Self {
        Self {
            subreddit: scope.subreddit().map(str::to_string),
            period_days: period.days(),
        }
    }
}

/// Successful generation as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReceipt {
    pub generation_id: Option<String>,
    pub message: Option<String>,
    pub counts: Option<GenerationCounts>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chat turn is stateless on the server: the whole prior transcript
/// travels with every message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, kind: InsightKind, priority: Priority) -> InsightItem {
        InsightItem {
            id: id.to_string(),
            kind,
            title: format!("title {id}"),
            description: String::new(),
            priority,
            evidence: Vec::new(),
        }
    }

    #[test]
    fn test_sections_follow_fixed_order_and_skip_empty_groups() {
        let groups = InsightGroups::from_flat(vec![
            item("t1", InsightKind::Trend, Priority::Low),
            item("p1", InsightKind::PainPoint, Priority::High),
            item("p2", InsightKind::PainPoint, Priority::Medium),
            item("o1", InsightKind::Opportunity, Priority::High),
        ]);

        let kinds: Vec<InsightKind> = groups.sections().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                InsightKind::PainPoint,
                InsightKind::Opportunity,
                InsightKind::Trend
            ]
        );

        let pain_ids: Vec<&str> = groups
            .group(InsightKind::PainPoint)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(pain_ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_stats_are_derived_from_items() {
        let groups = InsightGroups::from_flat(vec![
            item("a", InsightKind::Highlight, Priority::High),
            item("b", InsightKind::Highlight, Priority::Low),
            item("c", InsightKind::FeatureRequest, Priority::Low),
        ]);
        let stats = groups.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.high + stats.medium + stats.low, stats.total);
        assert_eq!(stats.count(Priority::Low), 2);
        assert_eq!(InsightGroups::default().stats(), StatsSummary::default());
    }

    #[test]
    fn test_insight_item_wire_format() {
        let json = r#"{
            "id": "i1",
            "type": "feature_request",
            "title": "Dark mode",
            "description": "Users keep asking",
            "priority": "medium",
            "evidence": [
                {"id": "e1", "url": "https://reddit.com/r/webflow/1", "authorUsername": "alice"},
                {"id": "e2", "title": "Thread", "url": "https://reddit.com/r/webflow/2"}
            ]
        }"#;
        let item: InsightItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, InsightKind::FeatureRequest);
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.evidence[0].author_username.as_deref(), Some("alice"));
        assert_eq!(item.evidence[1].title.as_deref(), Some("Thread"));
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!(Scope::from("all".to_string()), Scope::All);
        assert_eq!(Scope::from(String::new()), Scope::All);
        assert_eq!(
            Scope::from("webflow".to_string()),
            Scope::Community("webflow".to_string())
        );
        assert_eq!(String::from(Scope::All), "all");
        assert_eq!(serde_json::from_str::<Scope>("null").unwrap(), Scope::All);
        assert_eq!(
            serde_json::from_str::<Scope>(r#""webflow""#).unwrap(),
            Scope::Community("webflow".to_string())
        );
    }

    #[test]
    fn test_period_days_rejects_unknown_values() {
        assert_eq!(PeriodDays::try_from(14), Ok(PeriodDays::TwoWeeks));
        assert!(PeriodDays::try_from(10).is_err());
        assert!(serde_json::from_str::<PeriodDays>("30").is_ok());
        assert!(serde_json::from_str::<PeriodDays>("3").is_err());
    }

    #[test]
    fn test_generate_request_omits_subreddit_for_all() {
        let all = GenerateRequest::new(&Scope::All, PeriodDays::TwoWeeks);
        assert_eq!(
            serde_json::to_value(&all).unwrap(),
            serde_json::json!({"periodDays": 14})
        );

        let scoped = GenerateRequest::new(&Scope::Community("webflow".into()), PeriodDays::Week);
        assert_eq!(
            serde_json::to_value(&scoped).unwrap(),
            serde_json::json!({"subreddit": "webflow", "periodDays": 7})
        );
    }

    #[test]
    fn test_history_scopes_put_all_first() {
        let history = GenerationHistory {
            available_subreddits: vec![
                ScopeOption {
                    value: "webflow".into(),
                    label: "r/webflow".into(),
                },
                ScopeOption {
                    value: "all".into(),
                    label: "All".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            history.scopes(),
            vec![Scope::All, Scope::Community("webflow".into())]
        );
    }
}
