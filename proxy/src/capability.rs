//! Capabilities held by the two keys of a proxy.

/// Which of the proxy's keys made a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyKey {
    Cold,
    Hot,
}

/// Things a key can be entitled to do with a proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Sweep idle stake into the engine.
    Lock,
    /// Choose a slate.
    Vote,
    /// Take stake out of the engine (it still only ever goes to the payee).
    Withdraw,
    /// Take part in signalling polls.
    PollVote,
    /// Be the destination of withdrawn stake.
    Receive,
}

impl ProxyKey {
    pub fn permits(self, action: Action) -> bool {
        match (self, action) {
            (_, Action::Lock | Action::Vote | Action::Withdraw | Action::PollVote) => true,
            (ProxyKey::Cold, Action::Receive) => true,
            (ProxyKey::Hot, Action::Receive) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_keys_operate() {
        for key in [ProxyKey::Cold, ProxyKey::Hot] {
            assert!(key.permits(Action::Lock));
            assert!(key.permits(Action::Vote));
            assert!(key.permits(Action::Withdraw));
            assert!(key.permits(Action::PollVote));
        }
    }

    #[test]
    fn only_cold_receives() {
        assert!(ProxyKey::Cold.permits(Action::Receive));
        assert!(!ProxyKey::Hot.permits(Action::Receive));
    }
}
