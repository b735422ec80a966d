use std::collections::HashSet;

use crate::core::filters::exclude_decided;
use crate::core::stack::{CardStack, FetchTicket};
use crate::core::swipe::{Release, SwipeDirection, SwipeInterpreter, Translation, EXIT_OFFSET};
use crate::models::{CollegeCard, Decision, DecisionRecord, DeckView};

/// Nominal card width used for the cosmetic rotation
pub const DEFAULT_CARD_WIDTH: f64 = 400.0;

/// How a swipe was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOrigin {
    Drag,
    Button,
}

/// A committed card waiting for its exit animation to finish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExit {
    pub card_id: String,
    pub decision: Decision,
    pub origin: SwipeOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeResult {
    Committed(PendingExit),
    Cancelled,
    Ignored,
}

/// One user's swipe deck: the card stack plus the gesture state of its top card.
///
/// Drag and button swipes share a single completion path, so both end with
/// a [`DecisionRecord`] for the sink and the card leaving the stack.
///
/// Ids decided here are remembered and kept out of later fetches, whatever
/// the remote record says at the time.
#[derive(Debug, Clone)]
pub struct Deck {
    user_id: String,
    stack: CardStack,
    swipe: SwipeInterpreter,
    card_width: f64,
    decided: HashSet<String>,
}

impl Deck {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            stack: CardStack::new(),
            swipe: SwipeInterpreter::new(),
            card_width: DEFAULT_CARD_WIDTH,
            decided: HashSet::new(),
        }
    }

    pub fn with_cards(user_id: impl Into<String>, cards: Vec<CollegeCard>) -> Self {
        Self {
            stack: CardStack::from_cards(cards),
            ..Self::new(user_id)
        }
    }

    pub fn with_card_width(mut self, width: f64) -> Self {
        self.card_width = width;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn stack(&self) -> &CardStack {
        &self.stack
    }

    pub fn swipe(&self) -> &SwipeInterpreter {
        &self.swipe
    }

    pub fn top(&self) -> Option<&CollegeCard> {
        self.stack.top()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Like/dislike buttons only make sense with a card to act on
    pub fn buttons_enabled(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.stack.begin_fetch()
    }

    /// Apply a fetch result unless it was superseded
    pub fn apply_fetch(&mut self, ticket: FetchTicket, cards: Vec<CollegeCard>) -> bool {
        let cards = exclude_decided(cards, &self.decided);
        let applied = self.stack.apply_fetch(ticket, cards);
        if applied {
            self.swipe.reset();
        }
        applied
    }

    /// Track a live drag on the top card
    pub fn drag(&mut self, translation: Translation) -> bool {
        if self.stack.is_empty() {
            return false;
        }
        self.swipe.drag_changed(translation)
    }

    pub fn release(&mut self) -> SwipeResult {
        let Some(card_id) = self.stack.top().map(|c| c.id.clone()) else {
            return SwipeResult::Ignored;
        };

        match self.swipe.drag_ended() {
            Release::Commit(direction) => SwipeResult::Committed(PendingExit {
                card_id,
                decision: direction.into(),
                origin: SwipeOrigin::Drag,
            }),
            Release::SnapBack => SwipeResult::Cancelled,
            Release::Ignored => SwipeResult::Ignored,
        }
    }

    /// Button press: push a forced offset onto the top card and let the
    /// interpreter pick it up exactly like a committed drag.
    pub fn force(&mut self, decision: Decision) -> SwipeResult {
        let Some(card_id) = self.stack.top().map(|c| c.id.clone()) else {
            return SwipeResult::Ignored;
        };

        let direction = SwipeDirection::from(decision);
        let offset = match direction {
            SwipeDirection::Right => EXIT_OFFSET,
            SwipeDirection::Left => -EXIT_OFFSET,
        };
        self.swipe.set_forced(offset);

        match self.swipe.observe_forced() {
            Some(direction) => SwipeResult::Committed(PendingExit {
                card_id,
                decision: direction.into(),
                origin: SwipeOrigin::Button,
            }),
            None => SwipeResult::Ignored,
        }
    }

    /// Exit animation finished: remove the card and produce the decision to persist.
    ///
    /// A reload may have replaced the stack while the card was animating out,
    /// so the card is looked up by id rather than assumed to be on top.
    pub fn complete(&mut self, pending: &PendingExit) -> DecisionRecord {
        self.decided.insert(pending.card_id.clone());

        if let Some(position) = self.stack.position(&pending.card_id) {
            let was_top = self.stack.top_index() == Some(position);
            self.stack.remove(position);
            if was_top {
                self.swipe.finish();
                self.swipe.reset();
            }
        } else {
            tracing::debug!(
                "Card {} already gone from deck of {}",
                pending.card_id,
                self.user_id
            );
        }

        DecisionRecord {
            user_id: self.user_id.clone(),
            card_id: pending.card_id.clone(),
            decision: pending.decision,
            decided_at: chrono::Utc::now(),
        }
    }

    pub fn view(&self) -> DeckView {
        let translation = self.swipe.translation();
        DeckView {
            user_id: self.user_id.clone(),
            remaining: self.stack.len(),
            top_card: self.stack.top().cloned(),
            phase: self.swipe.phase().name().to_string(),
            translation_x: translation.dx,
            translation_y: translation.dy,
            rotation_degrees: self.swipe.rotation(self.card_width),
            label: self.swipe.label(),
            is_empty: self.stack.is_empty(),
            buttons_enabled: self.buttons_enabled(),
            generation: self.stack.generation(),
        }
    }
}
