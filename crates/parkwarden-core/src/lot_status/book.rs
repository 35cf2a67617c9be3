//! In-memory register of the bays the console is working with.

use serde::{Deserialize, Serialize};

use crate::domain::bay::{Bay, BayId};

use super::action::{ActionKind, ActionSet, LotAction};
use super::engine::{after_ticket_issued, apply_action, ensure_legal, legal_actions};
use super::error::{LotResult, LotStatusError};
use super::policy::TicketPolicy;

/// Ordered collection of bays, keyed by id.
///
/// Every mutation computes the successor bay first and only swaps it in
/// on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotBook {
    bays: Vec<Bay>,
}

impl LotBook {
    pub fn new(bays: impl IntoIterator<Item = Bay>) -> Self {
        let mut book = Self::default();
        for bay in bays {
            book.upsert(bay);
        }
        book
    }

    /// Insert a bay, replacing any bay with the same id in place.
    pub fn upsert(&mut self, bay: Bay) {
        match self.position(&bay.id) {
            Some(index) => self.bays[index] = bay,
            None => self.bays.push(bay),
        }
    }

    pub fn get(&self, id: &BayId) -> Option<&Bay> {
        self.bays.iter().find(|b| &b.id == id)
    }

    pub fn require(&self, id: &BayId) -> LotResult<&Bay> {
        self.get(id)
            .ok_or_else(|| LotStatusError::BayNotFound(id.clone()))
    }

    pub fn bays(&self) -> &[Bay] {
        &self.bays
    }

    pub fn in_zone<'a>(&'a self, zone_id: &'a str) -> impl Iterator<Item = &'a Bay> + 'a {
        self.bays.iter().filter(move |b| b.zone_id == zone_id)
    }

    pub fn legal_actions(&self, id: &BayId) -> LotResult<ActionSet> {
        Ok(legal_actions(self.require(id)?))
    }

    pub fn ensure_legal(&self, id: &BayId, kind: ActionKind) -> LotResult<()> {
        ensure_legal(self.require(id)?, kind)
    }

    /// Dry-run an action without committing it.
    pub fn preview(&self, id: &BayId, action: &LotAction) -> LotResult<Bay> {
        apply_action(self.require(id)?, action)
    }

    pub fn apply(&mut self, id: &BayId, action: &LotAction) -> LotResult<&Bay> {
        let next = self.preview(id, action)?;
        Ok(self.swap(next))
    }

    /// Record that a ticket was issued and apply the ticket policy.
    pub fn apply_ticket(&mut self, id: &BayId, policy: TicketPolicy) -> LotResult<&Bay> {
        let next = after_ticket_issued(self.require(id)?, policy)?;
        Ok(self.swap(next))
    }

    fn swap(&mut self, next: Bay) -> &Bay {
        let index = match self.position(&next.id) {
            Some(index) => {
                self.bays[index] = next;
                index
            }
            None => {
                self.bays.push(next);
                self.bays.len() - 1
            }
        };
        &self.bays[index]
    }

    fn position(&self, id: &BayId) -> Option<usize> {
        self.bays.iter().position(|b| &b.id == id)
    }
}
