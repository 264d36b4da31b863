// Accessbar request sequencer
// Tickets per feature channel so only the latest response of a channel is ever applied.

use std::collections::HashMap;

use tracing::debug;

use crate::types::errors::ServiceError;

/// Feature channels that issue network requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestChannel {
    Dictionary,
    Summary,
    SummaryHistory,
    Pronunciation,
    Simplify,
    Speech,
}

impl RequestChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestChannel::Dictionary => "dictionary",
            RequestChannel::Summary => "summary",
            RequestChannel::SummaryHistory => "summary-history",
            RequestChannel::Pronunciation => "pronunciation",
            RequestChannel::Simplify => "simplify",
            RequestChannel::Speech => "speech",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub channel: RequestChannel,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: HashMap<RequestChannel, u64>,
    next: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request on `channel`, superseding any earlier one still in flight.
    pub fn issue(&mut self, channel: RequestChannel) -> RequestTicket {
        self.next += 1;
        self.latest.insert(channel, self.next);
        RequestTicket { channel, seq: self.next }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.get(&ticket.channel) == Some(&ticket.seq)
    }

    /// Passes the response through when `ticket` is still the newest on its channel.
    pub fn accept<T>(&self, ticket: RequestTicket, response: Result<T, ServiceError>) -> Result<T, ServiceError> {
        if self.is_current(ticket) {
            response
        } else {
            debug!(channel = ticket.channel.as_str(), seq = ticket.seq, "discarding stale response");
            Err(ServiceError::Superseded)
        }
    }

    /// Invalidates whatever is in flight on `channel`.
    pub fn cancel(&mut self, channel: RequestChannel) {
        self.latest.remove(&channel);
    }
}
