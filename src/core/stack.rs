use crate::models::CollegeCard;

/// Generation handed out when a fetch starts.
///
/// The deck bumps its generation on every fetch start and every local
/// mutation; a fetch result is only applied if nothing happened since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Ordered stack of cards. The last element is the interactive top card.
#[derive(Debug, Clone, Default)]
pub struct CardStack {
    cards: Vec<CollegeCard>,
    generation: u64,
}

impl CardStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<CollegeCard>) -> Self {
        Self {
            cards,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cards(&self) -> &[CollegeCard] {
        &self.cards
    }

    pub fn top(&self) -> Option<&CollegeCard> {
        self.cards.last()
    }

    pub fn top_index(&self) -> Option<usize> {
        self.cards.len().checked_sub(1)
    }

    pub fn position(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().rposition(|c| c.id == card_id)
    }

    /// Start a fetch. Any earlier outstanding ticket becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Replace the whole stack with a fetch result.
    ///
    /// Returns false, leaving the stack untouched, if a newer fetch or a
    /// local mutation superseded `ticket`.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, cards: Vec<CollegeCard>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.cards = cards;
        true
    }

    /// Drop the card at `position`, keeping the order of the rest
    pub fn remove(&mut self, position: usize) -> Option<CollegeCard> {
        if position >= self.cards.len() {
            return None;
        }
        self.generation += 1;
        Some(self.cards.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollegeDetails;

    fn card(id: &str) -> CollegeCard {
        CollegeCard {
            id: id.to_string(),
            name: id.to_string(),
            year: 1900,
            description: String::new(),
            image_url: String::new(),
            details: CollegeDetails::default(),
        }
    }

    fn ids(stack: &CardStack) -> Vec<&str> {
        stack.cards().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_top_is_last() {
        let stack = CardStack::from_cards(vec![card("harvard"), card("yale"), card("mit")]);
        assert_eq!(stack.top().map(|c| c.id.as_str()), Some("mit"));
        assert_eq!(stack.top_index(), Some(2));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut stack =
            CardStack::from_cards(vec![card("a"), card("b"), card("c"), card("d")]);
        let removed = stack.remove(1).unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(ids(&stack), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut stack = CardStack::from_cards(vec![card("a")]);
        let generation = stack.generation();
        assert!(stack.remove(3).is_none());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.generation(), generation);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut stack = CardStack::new();
        let first = stack.begin_fetch();
        let second = stack.begin_fetch();

        assert!(stack.apply_fetch(second, vec![card("new")]));
        assert!(!stack.apply_fetch(first, vec![card("old")]));
        assert_eq!(ids(&stack), vec!["new"]);
    }

    #[test]
    fn test_local_mutation_supersedes_fetch() {
        let mut stack = CardStack::from_cards(vec![card("a"), card("b")]);
        let ticket = stack.begin_fetch();
        stack.remove(1);

        assert!(!stack.apply_fetch(ticket, vec![card("x")]));
        assert_eq!(ids(&stack), vec!["a"]);
    }
}
