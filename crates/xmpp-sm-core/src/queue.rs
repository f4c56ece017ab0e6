//! The unacknowledged queue: outbound stanzas in send order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::stanza::Stanza;

/// FIFO of stanzas sent since the last acknowledgment.
///
/// Entries leave only from the front (acknowledged) or all at once
/// (failed / resent). Nothing is ever reordered or duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnackedQueue {
    entries: VecDeque<Stanza>,
}

impl UnackedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stanza at the back.
    pub fn push(&mut self, stanza: Stanza) {
        self.entries.push_back(stanza);
    }

    /// Remove the earliest unconfirmed stanza, or `None` when empty.
    pub fn pop_front(&mut self) -> Option<Stanza> {
        self.entries.pop_front()
    }

    /// Remove and return every stanza in send order, leaving the queue empty.
    pub fn drain_all(&mut self) -> Vec<Stanza> {
        self.entries.drain(..).collect()
    }

    pub fn front(&self) -> Option<&Stanza> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy the queue out in send order.
    pub fn to_vec(&self) -> Vec<Stanza> {
        self.entries.iter().cloned().collect()
    }
}

impl From<Vec<Stanza>> for UnackedQueue {
    fn from(stanzas: Vec<Stanza>) -> Self {
        Self {
            entries: stanzas.into(),
        }
    }
}

impl FromIterator<Stanza> for UnackedQueue {
    fn from_iter<I: IntoIterator<Item = Stanza>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
