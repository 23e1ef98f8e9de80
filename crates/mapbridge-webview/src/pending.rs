// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Token-keyed acknowledgments waiting for a platform callback.

use std::collections::HashMap;

use tracing::debug;

use crate::traits::ScriptAck;

/// Acks parked until the UI thread reports back for their token.
///
/// Entries whose caller already gave up are pruned on every insert, so
/// callbacks lost across a page reload do not accumulate.
#[derive(Debug, Default)]
pub struct PendingAcks {
    next_token: i64,
    acks: HashMap<i64, ScriptAck>,
}

impl PendingAcks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `ack` and return the token the callback must quote.
    pub fn insert(&mut self, ack: ScriptAck) -> i64 {
        let before = self.acks.len();
        self.acks.retain(|_, ack| !ack.is_abandoned());
        let pruned = before - self.acks.len();
        if pruned > 0 {
            debug!(pruned, "dropped acknowledgments nobody is waiting for");
        }

        self.next_token += 1;
        self.acks.insert(self.next_token, ack);
        self.next_token
    }

    pub fn take(&mut self, token: i64) -> Option<ScriptAck> {
        self.acks.remove(&token)
    }

    /// Remove every parked ack.
    pub fn drain(&mut self) -> Vec<ScriptAck> {
        self.acks.drain().map(|(_, ack)| ack).collect()
    }

    pub fn len(&self) -> usize {
        self.acks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ScriptOutcome;

    #[tokio::test]
    async fn token_routes_the_result() {
        let mut pending = PendingAcks::new();
        let (ack, rx) = ScriptAck::channel();
        let token = pending.insert(ack);

        pending.take(token).expect("parked").complete("1");
        assert_eq!(rx.await.expect("ack"), ScriptOutcome::Evaluated("1".into()));
        assert!(pending.take(token).is_none());
    }

    #[test]
    fn abandoned_acks_are_pruned_on_insert() {
        let mut pending = PendingAcks::new();
        let (stale, stale_rx) = ScriptAck::channel();
        let stale_token = pending.insert(stale);
        let (live, _live_rx) = ScriptAck::channel();
        let live_token = pending.insert(live);
        assert_eq!(pending.len(), 2);

        // The caller of the first script timed out.
        drop(stale_rx);
        let (next, _next_rx) = ScriptAck::channel();
        pending.insert(next);

        assert_eq!(pending.len(), 2);
        assert!(pending.take(stale_token).is_none());
        assert!(pending.take(live_token).is_some());
    }

    #[test]
    fn tokens_are_unique_and_drain_empties() {
        let mut pending = PendingAcks::new();
        let (a, _rx_a) = ScriptAck::channel();
        let (b, _rx_b) = ScriptAck::channel();
        assert_ne!(pending.insert(a), pending.insert(b));
        assert_eq!(pending.drain().len(), 2);
        assert!(pending.is_empty());
    }
}
