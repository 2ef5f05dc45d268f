//! JSON scenarios: scripted call sequences replayed against a [`Runtime`].
//!
//! ```json
//! {
//!   "steps": [
//!     { "sender": "0x…", "call": { "mint_stake": { "to": "0x…", "amount": 1000 } } },
//!     { "sender": "0x…", "call": { "deposit": { "amount": 2000 } },
//!       "expect_error": "insufficient" }
//!   ]
//! }
//! ```
//!
//! Proxy calls name the proxy by its hot key; the registry resolves it.

use std::collections::BTreeMap;
use std::path::Path;

use chief_types::{Address, Amount, SlateId};
use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;
use crate::runtime::Runtime;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    MintStake { to: Address, amount: Amount },
    TransferStake { to: Address, amount: Amount },
    /// Transfer stake from the sender to the proxy bound to `hot`.
    FundProxy { hot: Address, amount: Amount },
    ApproveStake { spender: Address, amount: Amount },
    ApproveReceipt { spender: Address, amount: Amount },
    RegisterSlate { addresses: Vec<Address> },
    Deposit { amount: Amount },
    Withdraw { amount: Amount },
    Vote { slate: SlateId },
    VoteAddresses { addresses: Vec<Address> },
    Lift { candidate: Address },
    NewProxy { cold: Address, hot: Address },
    ProxyLock { hot: Address },
    ProxyVoteAddresses { hot: Address, addresses: Vec<Address> },
    ProxyVoteSlate { hot: Address, slate: SlateId },
    ProxyFree { hot: Address, amount: Amount },
    ProxyRelease { hot: Address },
    ProxyVotePoll { hot: Address, poll_id: u64, option_id: u64 },
    ProxyVotePolls { hot: Address, poll_ids: Vec<u64>, option_ids: Vec<u64> },
    ProxyWithdrawPoll { hot: Address, poll_id: u64 },
    CreatePoll { start_date: u64, end_date: u64, multi_hash: String, url: String },
    WithdrawPoll { poll_id: u64 },
    PollVote { poll_id: u64, option_id: u64 },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::MintStake { .. } => "mint_stake",
            Call::TransferStake { .. } => "transfer_stake",
            Call::FundProxy { .. } => "fund_proxy",
            Call::ApproveStake { .. } => "approve_stake",
            Call::ApproveReceipt { .. } => "approve_receipt",
            Call::RegisterSlate { .. } => "register_slate",
            Call::Deposit { .. } => "deposit",
            Call::Withdraw { .. } => "withdraw",
            Call::Vote { .. } => "vote",
            Call::VoteAddresses { .. } => "vote_addresses",
            Call::Lift { .. } => "lift",
            Call::NewProxy { .. } => "new_proxy",
            Call::ProxyLock { .. } => "proxy_lock",
            Call::ProxyVoteAddresses { .. } => "proxy_vote_addresses",
            Call::ProxyVoteSlate { .. } => "proxy_vote_slate",
            Call::ProxyFree { .. } => "proxy_free",
            Call::ProxyRelease { .. } => "proxy_release",
            Call::ProxyVotePoll { .. } => "proxy_vote_poll",
            Call::ProxyVotePolls { .. } => "proxy_vote_polls",
            Call::ProxyWithdrawPoll { .. } => "proxy_withdraw_poll",
            Call::CreatePoll { .. } => "create_poll",
            Call::WithdrawPoll { .. } => "withdraw_poll",
            Call::PollVote { .. } => "poll_vote",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Ignored for `mint_stake`, which always runs as the deployer.
    pub sender: Address,
    pub call: Call,
    /// When set, the step must fail with an error whose message contains
    /// this text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub call: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state of a replayed scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub steps: Vec<StepOutcome>,
    /// Non-zero approval counters.
    pub approvals: BTreeMap<Address, Amount>,
    pub hat: Address,
    pub total_weight: Amount,
    pub total_gas: u64,
}

impl Scenario {
    pub fn from_json_str(s: &str) -> Result<Self, RuntimeError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Replay every step in order.
    ///
    /// A step that fails when it was expected to succeed, or succeeds when
    /// it was expected to fail, stops the replay with [`RuntimeError::Scenario`].
    pub fn run(&self, runtime: &mut Runtime) -> Result<Report, RuntimeError> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        let mut total_gas = 0u64;
        for (index, step) in self.steps.iter().enumerate() {
            let result = apply(runtime, step);
            let outcome = match (result, &step.expect_error) {
                (Ok(gas_used), None) => {
                    total_gas = total_gas.saturating_add(gas_used);
                    StepOutcome {
                        index,
                        call: step.call.name().to_string(),
                        gas_used: Some(gas_used),
                        error: None,
                    }
                }
                (Err(err), Some(expected)) if err.to_string().contains(expected.as_str()) => {
                    StepOutcome {
                        index,
                        call: step.call.name().to_string(),
                        gas_used: None,
                        error: Some(err.to_string()),
                    }
                }
                (Ok(_), Some(expected)) => {
                    return Err(RuntimeError::Scenario {
                        step: index,
                        message: format!("{} succeeded, expected error '{expected}'", step.call.name()),
                    });
                }
                (Err(err), _) => {
                    return Err(RuntimeError::Scenario {
                        step: index,
                        message: format!("{} failed: {err}", step.call.name()),
                    });
                }
            };
            outcomes.push(outcome);
        }
        tracing::info!(scenario = %self.name, steps = outcomes.len(), total_gas, "scenario complete");

        let approvals = runtime
            .world()
            .chief
            .leaderboard()
            .into_iter()
            .filter(|(_, amount)| !amount.is_zero())
            .collect();
        Ok(Report {
            name: self.name.clone(),
            steps: outcomes,
            approvals,
            hat: runtime.hat(),
            total_weight: runtime.world().chief.total_weight(),
            total_gas,
        })
    }
}

fn proxy_for(runtime: &Runtime, hot: &Address) -> Result<Address, RuntimeError> {
    runtime.proxy_of(hot).ok_or(RuntimeError::NoProxyForHotKey(*hot))
}

/// Dispatch one step. Returns the gas it used.
fn apply(runtime: &mut Runtime, step: &Step) -> Result<u64, RuntimeError> {
    let sender = step.sender;
    let gas = match &step.call {
        Call::MintStake { to, amount } => runtime.mint_stake(*to, *amount)?.gas_used,
        Call::TransferStake { to, amount } => runtime.transfer_stake(sender, *to, *amount)?.gas_used,
        Call::FundProxy { hot, amount } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.transfer_stake(sender, proxy, *amount)?.gas_used
        }
        Call::ApproveStake { spender, amount } => {
            runtime.approve_stake(sender, *spender, *amount)?.gas_used
        }
        Call::ApproveReceipt { spender, amount } => {
            runtime.approve_receipt(sender, *spender, *amount)?.gas_used
        }
        Call::RegisterSlate { addresses } => runtime.register_slate(sender, addresses)?.gas_used,
        Call::Deposit { amount } => runtime.deposit(sender, *amount)?.gas_used,
        Call::Withdraw { amount } => runtime.withdraw(sender, *amount)?.gas_used,
        Call::Vote { slate } => runtime.vote(sender, *slate)?.gas_used,
        Call::VoteAddresses { addresses } => runtime.vote_addresses(sender, addresses)?.gas_used,
        Call::Lift { candidate } => runtime.lift(sender, *candidate)?.gas_used,
        Call::NewProxy { cold, hot } => runtime.new_proxy(sender, *cold, *hot)?.gas_used,
        Call::ProxyLock { hot } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_lock(sender, proxy)?.gas_used
        }
        Call::ProxyVoteAddresses { hot, addresses } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_vote_addresses(sender, proxy, addresses)?.gas_used
        }
        Call::ProxyVoteSlate { hot, slate } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_vote_slate(sender, proxy, *slate)?.gas_used
        }
        Call::ProxyFree { hot, amount } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_free(sender, proxy, *amount)?.gas_used
        }
        Call::ProxyRelease { hot } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_release(sender, proxy)?.gas_used
        }
        Call::ProxyVotePoll { hot, poll_id, option_id } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_vote_poll(sender, proxy, *poll_id, *option_id)?.gas_used
        }
        Call::ProxyVotePolls { hot, poll_ids, option_ids } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_vote_polls(sender, proxy, poll_ids, option_ids)?.gas_used
        }
        Call::ProxyWithdrawPoll { hot, poll_id } => {
            let proxy = proxy_for(runtime, hot)?;
            runtime.proxy_withdraw_poll(sender, proxy, *poll_id)?.gas_used
        }
        Call::CreatePoll { start_date, end_date, multi_hash, url } => {
            runtime.create_poll(sender, *start_date, *end_date, multi_hash, url)?.gas_used
        }
        Call::WithdrawPoll { poll_id } => runtime.withdraw_poll(sender, *poll_id)?.gas_used,
        Call::PollVote { poll_id, option_id } => {
            runtime.poll_vote(sender, *poll_id, *option_id)?.gas_used
        }
    };
    Ok(gas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn step(sender: u8, call: Call) -> Step {
        Step { sender: addr(sender), call, expect_error: None }
    }

    #[test]
    fn parses_json_steps() {
        let json = format!(
            r#"{{ "name": "smoke", "steps": [
                {{ "sender": "{a}", "call": {{ "mint_stake": {{ "to": "{a}", "amount": 5 }} }} }},
                {{ "sender": "{a}", "call": {{ "withdraw": {{ "amount": 1 }} }},
                   "expect_error": "insufficient weight" }}
            ] }}"#,
            a = addr(1)
        );
        let scenario = Scenario::from_json_str(&json).unwrap();
        assert_eq!(scenario.name, "smoke");
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].call, Call::MintStake { to: addr(1), amount: Amount::new(5) });
        assert_eq!(scenario.steps[1].expect_error.as_deref(), Some("insufficient weight"));
    }

    #[test]
    fn run_reports_approvals_and_gas() {
        let mut runtime = Runtime::new(RuntimeConfig::default());
        let chief = runtime.chief_address();
        let scenario = Scenario {
            name: "proxy vote".into(),
            steps: vec![
                step(0x99, Call::NewProxy { cold: addr(0xc1), hot: addr(0x41) }),
                step(0, Call::MintStake { to: addr(0xc1), amount: Amount::new(1_000) }),
                step(0xc1, Call::FundProxy { hot: addr(0x41), amount: Amount::new(250) }),
                step(0x41, Call::ProxyVoteAddresses { hot: addr(0x41), addresses: vec![addr(0xa1)] }),
                step(0xc1, Call::ApproveStake { spender: chief, amount: Amount::MAX }),
                step(0xc1, Call::Deposit { amount: Amount::new(400) }),
                step(0xc1, Call::VoteAddresses { addresses: vec![addr(0xa1), addr(0xa2)] }),
                step(0x41, Call::Lift { candidate: addr(0xa1) }),
            ],
        };
        let report = scenario.run(&mut runtime).unwrap();
        assert_eq!(report.steps.len(), 8);
        assert_eq!(report.approvals.get(&addr(0xa1)), Some(&Amount::new(650)));
        assert_eq!(report.approvals.get(&addr(0xa2)), Some(&Amount::new(400)));
        assert_eq!(report.hat, addr(0xa1));
        assert_eq!(report.total_weight, Amount::new(650));
        assert!(report.total_gas > 0);
        assert!(serde_json::to_string(&report).is_ok());
    }

    #[test]
    fn expected_error_is_recorded() {
        let mut runtime = Runtime::new(RuntimeConfig::default());
        let scenario = Scenario {
            name: String::new(),
            steps: vec![Step {
                sender: addr(1),
                call: Call::Withdraw { amount: Amount::new(1) },
                expect_error: Some("insufficient weight".into()),
            }],
        };
        let report = scenario.run(&mut runtime).unwrap();
        assert!(report.steps[0].error.is_some());
        assert_eq!(report.steps[0].gas_used, None);
    }

    #[test]
    fn unexpected_failure_stops_the_run() {
        let mut runtime = Runtime::new(RuntimeConfig::default());
        let scenario = Scenario {
            name: String::new(),
            steps: vec![step(1, Call::ProxyLock { hot: addr(0x41) })],
        };
        let err = scenario.run(&mut runtime).unwrap_err();
        assert!(matches!(err, RuntimeError::Scenario { step: 0, .. }));
    }
}
