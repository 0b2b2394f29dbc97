//! Request tickets.
//!
//! Every outgoing request is stamped with a [`Ticket`]. A response is only
//! applied while its ticket is still live: cancelling advances the epoch, and
//! anything issued under an older epoch is dropped on arrival.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct TicketIssuer {
    epoch: u64,
    next_seq: u64,
}

impl TicketIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.next_seq += 1;
        Ticket {
            epoch: self.epoch,
            seq: self.next_seq,
        }
    }

    pub fn is_live(&self, ticket: Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Invalidates every ticket issued so far.
    pub fn cancel_all(&mut self) {
        self.epoch += 1;
    }
}
