//! Polling emitter: signalling polls recorded as an append-only event log.
//!
//! Polls carry no weight bookkeeping of their own; tallies are computed by
//! whoever reads the log, using the voters' locked weight at the time.

use crate::error::GovernanceError;
use chief_types::{Address, CallContext};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: u64,
    pub creator: Address,
    /// Unix seconds; informational only.
    pub start_date: u64,
    pub end_date: u64,
    /// Content hash of the poll text.
    pub multi_hash: String,
    pub url: String,
    pub withdrawn: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PollEvent {
    PollCreated {
        creator: Address,
        poll_id: u64,
        start_date: u64,
        end_date: u64,
        multi_hash: String,
        url: String,
    },
    PollWithdrawn {
        creator: Address,
        poll_id: u64,
    },
    Voted {
        voter: Address,
        poll_id: u64,
        option_id: u64,
    },
}

#[derive(Clone, Debug)]
pub struct PollingEmitter {
    address: Address,
    polls: Vec<Poll>,
    events: Vec<PollEvent>,
}

impl PollingEmitter {
    pub fn new(address: Address) -> Self {
        Self { address, polls: Vec::new(), events: Vec::new() }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Open a poll. Ids are assigned sequentially from zero.
    pub fn create_poll(
        &mut self,
        ctx: &mut CallContext<'_>,
        start_date: u64,
        end_date: u64,
        multi_hash: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<u64, GovernanceError> {
        ctx.charge_reads(1)?;
        ctx.charge_writes(2)?;
        ctx.charge_log()?;
        let poll = Poll {
            id: self.polls.len() as u64,
            creator: ctx.sender(),
            start_date,
            end_date,
            multi_hash: multi_hash.into(),
            url: url.into(),
            withdrawn: false,
        };
        self.events.push(PollEvent::PollCreated {
            creator: poll.creator,
            poll_id: poll.id,
            start_date,
            end_date,
            multi_hash: poll.multi_hash.clone(),
            url: poll.url.clone(),
        });
        tracing::debug!(poll_id = poll.id, creator = %poll.creator, "poll created");
        let id = poll.id;
        self.polls.push(poll);
        Ok(id)
    }

    /// Withdraw a poll. Only its creator may do so.
    pub fn withdraw_poll(
        &mut self,
        ctx: &mut CallContext<'_>,
        poll_id: u64,
    ) -> Result<(), GovernanceError> {
        ctx.charge_reads(1)?;
        let caller = ctx.sender();
        let poll = self.open_poll(poll_id)?;
        if poll.creator != caller {
            return Err(GovernanceError::NotPollCreator { poll_id, caller });
        }
        ctx.charge_writes(1)?;
        ctx.charge_log()?;
        if let Some(poll) = self.polls.get_mut(poll_id as usize) {
            poll.withdrawn = true;
        }
        self.events.push(PollEvent::PollWithdrawn { creator: caller, poll_id });
        tracing::debug!(poll_id, "poll withdrawn");
        Ok(())
    }

    /// Record the sender's choice in a poll. Later votes supersede earlier ones.
    pub fn vote(
        &mut self,
        ctx: &mut CallContext<'_>,
        poll_id: u64,
        option_id: u64,
    ) -> Result<(), GovernanceError> {
        ctx.charge_reads(1)?;
        self.open_poll(poll_id)?;
        ctx.charge_log()?;
        let voter = ctx.sender();
        self.events.push(PollEvent::Voted { voter, poll_id, option_id });
        tracing::debug!(%voter, poll_id, option_id, "poll vote");
        Ok(())
    }

    pub fn poll(&self, poll_id: u64) -> Option<&Poll> {
        self.polls.get(poll_id as usize)
    }

    pub fn poll_count(&self) -> u64 {
        self.polls.len() as u64
    }

    pub fn events(&self) -> &[PollEvent] {
        &self.events
    }

    /// The option `voter` most recently chose in `poll_id`.
    pub fn latest_vote(&self, voter: &Address, poll_id: u64) -> Option<u64> {
        self.events.iter().rev().find_map(|event| match event {
            PollEvent::Voted { voter: v, poll_id: p, option_id } if v == voter && *p == poll_id => {
                Some(*option_id)
            }
            _ => None,
        })
    }

    fn open_poll(&self, poll_id: u64) -> Result<&Poll, GovernanceError> {
        let poll = self.poll(poll_id).ok_or(GovernanceError::UnknownPoll(poll_id))?;
        if poll.withdrawn {
            return Err(GovernanceError::PollWithdrawn(poll_id));
        }
        Ok(poll)
    }
}
