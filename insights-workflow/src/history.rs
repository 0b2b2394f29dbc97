use crate::effect::{Effect, Fetched};
use crate::ticket::{Ticket, TicketIssuer};
use insights_core::GenerationHistory;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum HistoryCache {
    Unloaded,
    Loading {
        ticket: Ticket,
        previous: Option<GenerationHistory>,
    },
    Loaded(GenerationHistory),
    /// Still shown, but refetched on the next reveal.
    Stale(GenerationHistory),
}

/// The history panel: visibility plus a lazily fetched, cached run list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPanel {
    visible: bool,
    cache: HistoryCache,
}

impl Default for HistoryPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryPanel {
    pub fn new() -> Self {
        Self {
            visible: false,
            cache: HistoryCache::Unloaded,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.cache, HistoryCache::Loading { .. })
    }

    pub fn current(&self) -> Option<&GenerationHistory> {
        match &self.cache {
            HistoryCache::Loaded(history) | HistoryCache::Stale(history) => Some(history),
            HistoryCache::Loading { previous, .. } => previous.as_ref(),
            HistoryCache::Unloaded => None,
        }
    }

    /// Flips visibility. Revealing fetches only when nothing usable is cached.
    pub fn toggle(&mut self, tickets: &mut TicketIssuer) -> Option<Effect> {
        self.visible = !self.visible;
        if !self.visible {
            return None;
        }

        match &self.cache {
            HistoryCache::Unloaded | HistoryCache::Stale(_) => Some(self.start_fetch(tickets)),
            HistoryCache::Loading { .. } | HistoryCache::Loaded(_) => None,
        }
    }

    /// A new generation exists: refetch now if visible, otherwise on next reveal.
    pub fn invalidate(&mut self, tickets: &mut TicketIssuer) -> Option<Effect> {
        if self.visible {
            return Some(self.start_fetch(tickets));
        }

        let cache = std::mem::replace(&mut self.cache, HistoryCache::Unloaded);
        self.cache = match cache {
            HistoryCache::Loaded(history) | HistoryCache::Stale(history) => {
                HistoryCache::Stale(history)
            }
            HistoryCache::Loading {
                previous: Some(history),
                ..
            } => HistoryCache::Stale(history),
            HistoryCache::Loading { previous: None, .. } | HistoryCache::Unloaded => {
                HistoryCache::Unloaded
            }
        };
        None
    }

    /// Returns false when the response belongs to a superseded request.
    pub fn apply(&mut self, ticket: Ticket, result: Fetched<GenerationHistory>) -> bool {
        let previous = match &mut self.cache {
            HistoryCache::Loading {
                ticket: pending,
                previous,
            } if *pending == ticket => previous.take(),
            _ => {
                debug!("Dropping superseded history response");
                return false;
            }
        };

        self.cache = match result {
            Ok(history) => HistoryCache::Loaded(history),
            Err(_) => match previous {
                Some(history) => HistoryCache::Stale(history),
                None => HistoryCache::Unloaded,
            },
        };
        true
    }

    fn start_fetch(&mut self, tickets: &mut TicketIssuer) -> Effect {
        let previous = self.current().cloned();
        let ticket = tickets.issue();
        self.cache = HistoryCache::Loading { ticket, previous };
        Effect::LoadHistory { ticket }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::Failure;

    fn loaded(total: u64) -> GenerationHistory {
        GenerationHistory {
            total,
            ..Default::default()
        }
    }

    fn pending_ticket(effect: Option<Effect>) -> Ticket {
        match effect {
            Some(Effect::LoadHistory { ticket }) => ticket,
            other => panic!("Expected a history fetch, got {other:?}"),
        }
    }

    #[test]
    fn test_reveal_fetches_once() {
        let mut tickets = TicketIssuer::new();
        let mut panel = HistoryPanel::new();

        let ticket = pending_ticket(panel.toggle(&mut tickets));
        assert!(panel.is_loading());
        assert!(panel.apply(ticket, Ok(loaded(3))));

        assert!(panel.toggle(&mut tickets).is_none());
        assert!(!panel.is_visible());
        assert!(panel.toggle(&mut tickets).is_none());
        assert_eq!(panel.current().map(|h| h.total), Some(3));
    }

    #[test]
    fn test_toggling_while_loading_does_not_refetch() {
        let mut tickets = TicketIssuer::new();
        let mut panel = HistoryPanel::new();

        pending_ticket(panel.toggle(&mut tickets));
        assert!(panel.toggle(&mut tickets).is_none());
        assert!(panel.toggle(&mut tickets).is_none());
        assert!(panel.is_loading());
    }

    #[test]
    fn test_failed_fetch_retries_on_next_reveal() {
        let mut tickets = TicketIssuer::new();
        let mut panel = HistoryPanel::new();

        let ticket = pending_ticket(panel.toggle(&mut tickets));
        assert!(panel.apply(ticket, Err(Failure::new("NETWORK", "offline"))));
        assert!(panel.current().is_none());

        panel.toggle(&mut tickets);
        pending_ticket(panel.toggle(&mut tickets));
    }

    #[test]
    fn test_invalidate_while_hidden_marks_stale() {
        let mut tickets = TicketIssuer::new();
        let mut panel = HistoryPanel::new();

        let ticket = pending_ticket(panel.toggle(&mut tickets));
        panel.apply(ticket, Ok(loaded(1)));
        panel.toggle(&mut tickets);

        assert!(panel.invalidate(&mut tickets).is_none());
        assert_eq!(panel.current().map(|h| h.total), Some(1));

        let ticket = pending_ticket(panel.toggle(&mut tickets));
        // The stale list stays visible while the refresh is in flight.
        assert_eq!(panel.current().map(|h| h.total), Some(1));
        panel.apply(ticket, Ok(loaded(2)));
        assert_eq!(panel.current().map(|h| h.total), Some(2));
    }

    #[test]
    fn test_invalidate_while_visible_refetches_and_drops_old_response() {
        let mut tickets = TicketIssuer::new();
        let mut panel = HistoryPanel::new();

        let first = pending_ticket(panel.toggle(&mut tickets));
        let second = pending_ticket(panel.invalidate(&mut tickets));

        assert!(!panel.apply(first, Ok(loaded(1))));
        assert!(panel.apply(second, Ok(loaded(2))));
        assert_eq!(panel.current().map(|h| h.total), Some(2));
    }
}
