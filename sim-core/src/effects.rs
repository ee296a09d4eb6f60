//! C13: cross-mode effect queue and active-effect bookkeeping (§3, §4.11 step 1,
//! invariants I6-I8). Effects are enqueued by action handlers and drained
//! FIFO at the start of the next tick; instant effects apply and vanish, timed
//! effects are tracked until they expire.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossModeEffect {
    /// Applies once, immediately, when drained (I6).
    DamagePlayer { target_id: String, amount: i32 },
    SpawnHazard { zone_id: String, hazard: String },
    GrantResource { team_id: String, resource: String, amount: i64 },
    /// Applies once, then holds state until `expires_at_tick` (I7).
    ApplyStatus { target_id: String, status: String, expires_at_tick: u64 },
    CaptureProgress { zone_id: String, team_id: String, delta: f64 },
    HealTerritory { zone_id: String, amount: i32 },
    DamageTerritory { zone_id: String, amount: i32 },
    Fortify { zone_id: String, levels: u32 },
}

impl CrossModeEffect {
    /// True for effects that persist past their initial application and must be
    /// tracked in the active-effect set (I7).
    pub fn is_timed(&self) -> bool {
        matches!(self, CrossModeEffect::ApplyStatus { .. })
    }
}

/// A timed effect that has already been applied once and is now waiting to expire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveEffect {
    pub target_id: String,
    pub status: String,
    pub expires_at_tick: u64,
}

impl ActiveEffect {
    pub fn is_expired(&self, current_tick: u64) -> bool {
        current_tick >= self.expires_at_tick
    }
}

/// FIFO queue of pending effects plus the set of currently active timed effects
/// (§4.11 step 1). Enqueue order is preserved; effects apply in the order they were
/// enqueued within a single tick (I6).
#[derive(Debug, Default)]
pub struct EffectQueue {
    pending: Vec<CrossModeEffect>,
    active: Vec<ActiveEffect>,
}

impl EffectQueue {
    pub fn new() -> Self {
        EffectQueue::default()
    }

    pub fn enqueue(&mut self, effect: CrossModeEffect) {
        self.pending.push(effect);
    }

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.active
    }

    /// Drains all pending effects in FIFO order, applying each exactly once via
    /// `apply`. Timed effects (`ApplyStatus`) are additionally recorded in the active
    /// set so they can be swept later (I7).
    pub fn drain_and_apply<F: FnMut(&CrossModeEffect)>(&mut self, mut apply: F) {
        for effect in self.pending.drain(..) {
            apply(&effect);
            if let CrossModeEffect::ApplyStatus { ref target_id, ref status, expires_at_tick } = effect {
                self.active.push(ActiveEffect {
                    target_id: target_id.clone(),
                    status: status.clone(),
                    expires_at_tick,
                });
            }
        }
    }

    /// Removes every active effect whose expiry has passed as of `current_tick`,
    /// returning the ones removed so the caller can clear their gameplay state (I8).
    pub fn sweep_expired(&mut self, current_tick: u64) -> Vec<ActiveEffect> {
        let (expired, remaining): (Vec<_>, Vec<_>) =
            self.active.drain(..).partition(|e| e.is_expired(current_tick));
        self.active = remaining;
        expired
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_fifo_order() {
        let mut q = EffectQueue::new();
        q.enqueue(CrossModeEffect::DamagePlayer { target_id: "a".into(), amount: 1 });
        q.enqueue(CrossModeEffect::DamagePlayer { target_id: "b".into(), amount: 2 });
        let mut seen = Vec::new();
        q.drain_and_apply(|e| {
            if let CrossModeEffect::DamagePlayer { target_id, .. } = e {
                seen.push(target_id.clone());
            }
        });
        assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(q.pending_len(), 0);
    }

    #[test]
    fn timed_effect_becomes_active_then_expires() {
        let mut q = EffectQueue::new();
        q.enqueue(CrossModeEffect::ApplyStatus {
            target_id: "p1".into(),
            status: "slowed".into(),
            expires_at_tick: 10,
        });
        q.drain_and_apply(|_| {});
        assert_eq!(q.active_effects().len(), 1);

        let expired = q.sweep_expired(5);
        assert!(expired.is_empty());
        assert_eq!(q.active_effects().len(), 1);

        let expired = q.sweep_expired(10);
        assert_eq!(expired.len(), 1);
        assert!(q.active_effects().is_empty());
    }

    #[test]
    fn instant_effects_never_become_active() {
        let mut q = EffectQueue::new();
        q.enqueue(CrossModeEffect::GrantResource {
            team_id: "red".into(),
            resource: "supplies".into(),
            amount: 50,
        });
        q.drain_and_apply(|_| {});
        assert!(q.active_effects().is_empty());
    }
}
