//! Research: unlock ledger plus passive point accumulator.
//!
//! The catalog is registered once at construction time; nodes are never
//! removed and unlocks never revert. The point balance accrues a fixed
//! amount per engine step and is spent by exact-cost deduction at unlock.
//! Balance changes and unlocks are recorded as pending events drained by
//! the engine each step.
//!
//! Persistence goes through the [`ProfileStore`] key-value contract:
//! `"ResearchPoints"` holds the balance as f64, `"Research_<key>"` holds
//! 0 or 1 per node.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;
use crate::fixed::{Fixed64, Ticks, f64_to_fixed64, fixed64_to_f64};
use crate::profile::{ProfileError, ProfileStore};

/// Profile key holding the point balance.
pub const POINTS_KEY: &str = "ResearchPoints";

/// Profile key holding the unlocked flag for a node.
pub fn node_key(key: &str) -> String {
    format!("Research_{key}")
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Dense handle for a registered research node, assigned at registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ResearchId(pub u32);

/// The gameplay effect a research node grants when unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Items near the player are picked up without interaction.
    AutoLoot,
    /// Experience gains are scaled by this factor.
    XpRate { multiplier: Fixed64 },
    /// Flat addition to maximum health.
    MaxHealth { bonus: Fixed64 },
}

/// Definition of a research node, as supplied by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchDef {
    /// Unique string key. Also the persistence identity of the node.
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub cost: Fixed64,
    pub effect: EffectKind,
}

/// A registered research node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchNode {
    pub id: ResearchId,
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub cost: Fixed64,
    pub effect: EffectKind,
}

/// Presentation-facing classification of a node's unlock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Unlocked,
    /// Locked, but the current balance covers the cost.
    Affordable,
    /// Locked and short by `missing` points.
    Locked { missing: Fixed64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum ResearchError {
    #[error("duplicate research key: {key}")]
    DuplicateKey { key: String },

    #[error("unknown research node: {0:?}")]
    UnknownNode(ResearchId),

    #[error("research already unlocked: {key}")]
    AlreadyUnlocked { key: String },

    #[error("insufficient points for {key}: have {have}, need {need}")]
    InsufficientPoints {
        key: String,
        have: Fixed64,
        need: Fixed64,
    },
}

// ---------------------------------------------------------------------------
// ResearchLab
// ---------------------------------------------------------------------------

/// Unlock ledger and point accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchLab {
    /// Registered nodes, indexed by id. Iterated in id order everywhere
    /// determinism matters (hashing, persistence).
    nodes: Vec<ResearchNode>,
    key_index: HashMap<String, ResearchId>,
    unlocked: HashSet<ResearchId>,

    /// Current point balance. Never negative.
    balance: Fixed64,
    /// Points accrued per engine step.
    points_per_tick: Fixed64,

    /// Events recorded this step, drained by the engine.
    #[serde(skip)]
    pending_events: Vec<Event>,
}

impl ResearchLab {
    pub fn new(points_per_tick: Fixed64) -> Self {
        Self {
            nodes: Vec::new(),
            key_index: HashMap::new(),
            unlocked: HashSet::new(),
            balance: Fixed64::ZERO,
            points_per_tick,
            pending_events: Vec::new(),
        }
    }

    // ---------- catalog ----------

    /// Register a node. Duplicate keys are a configuration error.
    pub fn register(&mut self, def: ResearchDef) -> Result<ResearchId, ResearchError> {
        if self.key_index.contains_key(&def.key) {
            return Err(ResearchError::DuplicateKey { key: def.key });
        }
        let id = ResearchId(self.nodes.len() as u32);
        self.key_index.insert(def.key.clone(), id);
        self.nodes.push(ResearchNode {
            id,
            key: def.key,
            display_name: def.display_name,
            description: def.description,
            cost: def.cost,
            effect: def.effect,
        });
        Ok(id)
    }

    /// Look up a node id by its string key.
    pub fn find(&self, key: &str) -> Option<ResearchId> {
        self.key_index.get(key).copied()
    }

    pub fn node(&self, id: ResearchId) -> Option<&ResearchNode> {
        self.nodes.get(id.0 as usize)
    }

    /// All registered nodes, in id order.
    pub fn nodes(&self) -> &[ResearchNode] {
        &self.nodes
    }

    // ---------- ledger ----------

    /// False for unknown ids.
    pub fn is_unlocked(&self, id: ResearchId) -> bool {
        self.unlocked.contains(&id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Whether an unlock would succeed right now. False for unknown or
    /// already-unlocked ids.
    pub fn can_unlock(&self, id: ResearchId) -> bool {
        self.check_unlock(id).is_ok()
    }

    /// Unlock a node, deducting exactly its cost.
    ///
    /// On failure the typed reason is returned and nothing changes. On
    /// success a `NodeUnlocked` event is recorded, followed by a
    /// `PointsChanged` carrying the post-deduction balance.
    pub fn unlock(&mut self, id: ResearchId, tick: Ticks) -> Result<(), ResearchError> {
        let node = self.check_unlock(id)?;
        let key = node.key.clone();
        let cost = node.cost;

        self.balance -= cost;
        self.unlocked.insert(id);
        self.pending_events.push(Event::NodeUnlocked { id, key, tick });
        self.pending_events.push(Event::PointsChanged {
            balance: self.balance,
            tick,
        });
        Ok(())
    }

    fn check_unlock(&self, id: ResearchId) -> Result<&ResearchNode, ResearchError> {
        let node = self.node(id).ok_or(ResearchError::UnknownNode(id))?;
        if self.unlocked.contains(&id) {
            return Err(ResearchError::AlreadyUnlocked {
                key: node.key.clone(),
            });
        }
        if self.balance < node.cost {
            return Err(ResearchError::InsufficientPoints {
                key: node.key.clone(),
                have: self.balance,
                need: node.cost,
            });
        }
        Ok(node)
    }

    /// Classify a node for presentation. `None` for unknown ids.
    pub fn availability(&self, id: ResearchId) -> Option<Availability> {
        let node = self.node(id)?;
        Some(if self.unlocked.contains(&id) {
            Availability::Unlocked
        } else if self.balance >= node.cost {
            Availability::Affordable
        } else {
            Availability::Locked {
                missing: node.cost - self.balance,
            }
        })
    }

    // ---------- accumulator ----------

    pub fn balance(&self) -> Fixed64 {
        self.balance
    }

    pub fn points_per_tick(&self) -> Fixed64 {
        self.points_per_tick
    }

    /// One accrual step: balance += rate, then exactly one `PointsChanged`
    /// carrying the post-increment value.
    pub fn accrue(&mut self, tick: Ticks) {
        self.balance = self.balance.saturating_add(self.points_per_tick);
        self.pending_events.push(Event::PointsChanged {
            balance: self.balance,
            tick,
        });
    }

    /// Add a flat amount (debug/test hook). The balance is clamped at zero,
    /// so a negative grant can never drive it below.
    pub fn grant_points(&mut self, amount: Fixed64, tick: Ticks) {
        self.balance = self.balance.saturating_add(amount).max(Fixed64::ZERO);
        self.pending_events.push(Event::PointsChanged {
            balance: self.balance,
            tick,
        });
    }

    // ---------- persistence ----------

    /// Write balance and per-node unlocked flags through the store, then
    /// flush.
    pub fn save_profile(&self, store: &mut dyn ProfileStore) -> Result<(), ProfileError> {
        store.set_f64(POINTS_KEY, fixed64_to_f64(self.balance));
        for node in &self.nodes {
            let flag = i64::from(self.unlocked.contains(&node.id));
            store.set_i64(&node_key(&node.key), flag);
        }
        store.flush()
    }

    /// Restore balance and unlocked flags from the store. Missing keys fall
    /// back to zero points and locked. Emits a `PointsChanged` with the
    /// restored balance.
    ///
    /// Returns the effects of the restored unlocks so the caller can
    /// re-apply them to the player.
    pub fn load_profile(
        &mut self,
        store: &dyn ProfileStore,
        tick: Ticks,
    ) -> Vec<(ResearchId, EffectKind)> {
        self.balance = sanitize_points(store.get_f64(POINTS_KEY, 0.0));

        let mut restored = Vec::new();
        for node in &self.nodes {
            if store.get_i64(&node_key(&node.key), 0) == 1 && self.unlocked.insert(node.id) {
                restored.push((node.id, node.effect));
            }
        }

        self.pending_events.push(Event::PointsChanged {
            balance: self.balance,
            tick,
        });
        restored
    }

    // ---------- events ----------

    /// Drain events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    /// Peek at pending events without draining.
    pub fn pending_events(&self) -> &[Event] {
        &self.pending_events
    }
}

/// Stored floats come from external files. Non-finite values fall back to
/// zero; the rest is clamped into the non-negative Q32.32 range.
fn sanitize_points(raw: f64) -> Fixed64 {
    if !raw.is_finite() {
        return Fixed64::ZERO;
    }
    f64_to_fixed64(raw.clamp(0.0, i32::MAX as f64))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::MemoryProfile;
    use crate::test_utils::{auto_loot_def, fixed, hp_boost_def, xp_boost_def};

    fn lab_with_defaults(rate: f64) -> ResearchLab {
        let mut lab = ResearchLab::new(fixed(rate));
        lab.register(auto_loot_def()).unwrap();
        lab.register(xp_boost_def()).unwrap();
        lab.register(hp_boost_def()).unwrap();
        lab
    }

    // -----------------------------------------------------------------------
    // Test 1: Registration assigns dense ids in order
    // -----------------------------------------------------------------------
    #[test]
    fn register_assigns_dense_ids() {
        let mut lab = ResearchLab::new(fixed(0.5));
        let a = lab.register(auto_loot_def()).unwrap();
        let b = lab.register(xp_boost_def()).unwrap();

        assert_eq!(a, ResearchId(0));
        assert_eq!(b, ResearchId(1));
        assert_eq!(lab.nodes().len(), 2);
        assert_eq!(lab.node(a).unwrap().key, "auto_loot");
        assert_eq!(lab.node(b).unwrap().display_name, "XP Boost I");
    }

    // -----------------------------------------------------------------------
    // Test 2: Duplicate keys are rejected at registration
    // -----------------------------------------------------------------------
    #[test]
    fn register_duplicate_key_rejected() {
        let mut lab = ResearchLab::new(fixed(0.5));
        lab.register(auto_loot_def()).unwrap();

        let err = lab.register(auto_loot_def()).unwrap_err();
        assert_eq!(
            err,
            ResearchError::DuplicateKey {
                key: "auto_loot".to_string(),
            }
        );
        assert_eq!(lab.nodes().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Test 3: Lookup by key
    // -----------------------------------------------------------------------
    #[test]
    fn find_by_key() {
        let lab = lab_with_defaults(0.5);
        assert_eq!(lab.find("xp_boost"), Some(ResearchId(1)));
        assert_eq!(lab.find("warp_drive"), None);
    }

    // -----------------------------------------------------------------------
    // Test 4: Unlock deducts exactly cost and emits unlock then points
    // -----------------------------------------------------------------------
    #[test]
    fn unlock_deducts_exact_cost() {
        let mut lab = lab_with_defaults(0.0);
        lab.grant_points(fixed(60.0), 0);
        lab.drain_events();

        let id = lab.find("auto_loot").unwrap();
        lab.unlock(id, 7).unwrap();

        assert!(lab.is_unlocked(id));
        assert_eq!(lab.balance(), fixed(10.0));

        let events = lab.drain_events();
        assert_eq!(
            events,
            vec![
                Event::NodeUnlocked {
                    id,
                    key: "auto_loot".to_string(),
                    tick: 7,
                },
                Event::PointsChanged {
                    balance: fixed(10.0),
                    tick: 7,
                },
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Test 5: Insufficient points leaves everything unchanged
    // -----------------------------------------------------------------------
    #[test]
    fn unlock_insufficient_points_no_change() {
        let mut lab = lab_with_defaults(0.0);
        lab.grant_points(fixed(49.0), 0);
        lab.drain_events();

        let id = lab.find("auto_loot").unwrap();
        let err = lab.unlock(id, 1).unwrap_err();

        assert_eq!(
            err,
            ResearchError::InsufficientPoints {
                key: "auto_loot".to_string(),
                have: fixed(49.0),
                need: fixed(50.0),
            }
        );
        assert!(!lab.is_unlocked(id));
        assert_eq!(lab.balance(), fixed(49.0));
        assert!(lab.drain_events().is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 6: Unknown node is a typed error
    // -----------------------------------------------------------------------
    #[test]
    fn unlock_unknown_node() {
        let mut lab = lab_with_defaults(0.0);
        let err = lab.unlock(ResearchId(99), 0).unwrap_err();
        assert_eq!(err, ResearchError::UnknownNode(ResearchId(99)));
    }

    // -----------------------------------------------------------------------
    // Test 7: Double unlock is a typed error with no further deduction
    // -----------------------------------------------------------------------
    #[test]
    fn unlock_twice_rejected() {
        let mut lab = lab_with_defaults(0.0);
        lab.grant_points(fixed(200.0), 0);

        let id = lab.find("auto_loot").unwrap();
        lab.unlock(id, 1).unwrap();
        let balance_after_first = lab.balance();

        let err = lab.unlock(id, 2).unwrap_err();
        assert_eq!(
            err,
            ResearchError::AlreadyUnlocked {
                key: "auto_loot".to_string(),
            }
        );
        assert_eq!(lab.balance(), balance_after_first);
    }

    // -----------------------------------------------------------------------
    // Test 8: can_unlock over the full state matrix
    // -----------------------------------------------------------------------
    #[test]
    fn can_unlock_matrix() {
        let mut lab = lab_with_defaults(0.0);
        let auto_loot = lab.find("auto_loot").unwrap();
        let xp_boost = lab.find("xp_boost").unwrap();

        // Unknown id.
        assert!(!lab.can_unlock(ResearchId(42)));
        // Insufficient points.
        assert!(!lab.can_unlock(auto_loot));

        lab.grant_points(fixed(50.0), 0);
        assert!(lab.can_unlock(auto_loot));
        assert!(!lab.can_unlock(xp_boost));

        lab.unlock(auto_loot, 1).unwrap();
        assert!(!lab.can_unlock(auto_loot));
    }

    // -----------------------------------------------------------------------
    // Test 9: is_unlocked is false for unknown ids
    // -----------------------------------------------------------------------
    #[test]
    fn is_unlocked_unknown_false() {
        let lab = lab_with_defaults(0.0);
        assert!(!lab.is_unlocked(ResearchId(123)));
    }

    // -----------------------------------------------------------------------
    // Test 10: Accrual adds the rate and reports the post-increment value
    // -----------------------------------------------------------------------
    #[test]
    fn accrue_emits_post_increment_value() {
        let mut lab = lab_with_defaults(0.5);

        lab.accrue(1);
        lab.accrue(2);

        assert_eq!(lab.balance(), fixed(1.0));
        let events = lab.drain_events();
        assert_eq!(
            events,
            vec![
                Event::PointsChanged {
                    balance: fixed(0.5),
                    tick: 1,
                },
                Event::PointsChanged {
                    balance: fixed(1.0),
                    tick: 2,
                },
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Test 11: Accrual is exact in fixed point, no float drift
    // -----------------------------------------------------------------------
    #[test]
    fn accrue_exact_in_fixed_point() {
        let mut lab = lab_with_defaults(0.5);
        for tick in 0..1000 {
            lab.accrue(tick);
        }
        assert_eq!(lab.balance(), fixed(500.0));
    }

    // -----------------------------------------------------------------------
    // Test 12: grant_points adds a flat amount and emits
    // -----------------------------------------------------------------------
    #[test]
    fn grant_points_adds_and_emits() {
        let mut lab = lab_with_defaults(0.0);
        lab.grant_points(fixed(100.0), 4);

        assert_eq!(lab.balance(), fixed(100.0));
        assert_eq!(
            lab.drain_events(),
            vec![Event::PointsChanged {
                balance: fixed(100.0),
                tick: 4,
            }]
        );
    }

    // -----------------------------------------------------------------------
    // Test 13: Negative grants clamp the balance at zero
    // -----------------------------------------------------------------------
    #[test]
    fn grant_negative_clamps_at_zero() {
        let mut lab = lab_with_defaults(0.0);
        lab.grant_points(fixed(10.0), 0);
        lab.grant_points(fixed(-25.0), 1);

        assert_eq!(lab.balance(), Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Test 14: Availability classification with missing amounts
    // -----------------------------------------------------------------------
    #[test]
    fn availability_classification() {
        let mut lab = lab_with_defaults(0.0);
        let auto_loot = lab.find("auto_loot").unwrap();
        let xp_boost = lab.find("xp_boost").unwrap();

        lab.grant_points(fixed(60.0), 0);

        assert_eq!(lab.availability(auto_loot), Some(Availability::Affordable));
        assert_eq!(
            lab.availability(xp_boost),
            Some(Availability::Locked {
                missing: fixed(40.0),
            })
        );

        lab.unlock(auto_loot, 1).unwrap();
        assert_eq!(lab.availability(auto_loot), Some(Availability::Unlocked));
    }

    // -----------------------------------------------------------------------
    // Test 15: Availability of an unknown id is None
    // -----------------------------------------------------------------------
    #[test]
    fn availability_unknown_none() {
        let lab = lab_with_defaults(0.0);
        assert_eq!(lab.availability(ResearchId(77)), None);
    }

    // -----------------------------------------------------------------------
    // Test 16: Profile round trip restores balance and unlocked set
    // -----------------------------------------------------------------------
    #[test]
    fn profile_round_trip() {
        let mut store = MemoryProfile::new();

        let mut lab = lab_with_defaults(0.0);
        lab.grant_points(fixed(175.0), 0);
        let auto_loot = lab.find("auto_loot").unwrap();
        lab.unlock(auto_loot, 1).unwrap();
        lab.save_profile(&mut store).unwrap();

        let mut fresh = lab_with_defaults(0.0);
        let restored = fresh.load_profile(&store, 2);

        assert_eq!(fresh.balance(), fixed(125.0));
        assert!(fresh.is_unlocked(auto_loot));
        assert!(!fresh.is_unlocked(fresh.find("xp_boost").unwrap()));
        assert_eq!(restored, vec![(auto_loot, EffectKind::AutoLoot)]);
    }

    // -----------------------------------------------------------------------
    // Test 17: Loading from an empty store defaults to zero and locked
    // -----------------------------------------------------------------------
    #[test]
    fn load_defaults_when_store_empty() {
        let store = MemoryProfile::new();
        let mut lab = lab_with_defaults(0.0);

        let restored = lab.load_profile(&store, 0);

        assert_eq!(lab.balance(), Fixed64::ZERO);
        assert_eq!(lab.unlocked_count(), 0);
        assert!(restored.is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 18: A negative stored balance is clamped to zero
    // -----------------------------------------------------------------------
    #[test]
    fn load_clamps_negative_balance() {
        let mut store = MemoryProfile::new();
        store.set_f64(POINTS_KEY, -12.5);

        let mut lab = lab_with_defaults(0.0);
        lab.load_profile(&store, 0);

        assert_eq!(lab.balance(), Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Test 19: Loading announces the restored balance
    // -----------------------------------------------------------------------
    #[test]
    fn load_emits_points_changed() {
        let mut store = MemoryProfile::new();
        store.set_f64(POINTS_KEY, 33.0);

        let mut lab = lab_with_defaults(0.0);
        lab.load_profile(&store, 9);

        assert_eq!(
            lab.drain_events(),
            vec![Event::PointsChanged {
                balance: fixed(33.0),
                tick: 9,
            }]
        );
    }

    // -----------------------------------------------------------------------
    // Test 20: Save writes a 0/1 flag for every registered node
    // -----------------------------------------------------------------------
    #[test]
    fn save_writes_flags_for_every_node() {
        let mut store = MemoryProfile::new();

        let mut lab = lab_with_defaults(0.0);
        lab.grant_points(fixed(50.0), 0);
        lab.unlock(lab.find("auto_loot").unwrap(), 1).unwrap();
        lab.save_profile(&mut store).unwrap();

        assert_eq!(store.get_i64("Research_auto_loot", -1), 1);
        assert_eq!(store.get_i64("Research_xp_boost", -1), 0);
        assert_eq!(store.get_i64("Research_hp_boost", -1), 0);
        assert_eq!(store.get_f64(POINTS_KEY, -1.0), 0.0);
    }

    // -----------------------------------------------------------------------
    // Test 21: Node key format
    // -----------------------------------------------------------------------
    #[test]
    fn node_key_format() {
        assert_eq!(node_key("auto_loot"), "Research_auto_loot");
    }

    // -----------------------------------------------------------------------
    // Test 22: Rate-driven scenario: 5 ticks at 10/tick buys exactly one node
    // -----------------------------------------------------------------------
    #[test]
    fn scenario_rate_ten_per_tick() {
        let mut lab = ResearchLab::new(fixed(10.0));
        lab.register(auto_loot_def()).unwrap();
        lab.register(xp_boost_def()).unwrap();

        for tick in 0..5 {
            lab.accrue(tick);
        }
        assert_eq!(lab.balance(), fixed(50.0));

        let auto_loot = lab.find("auto_loot").unwrap();
        let xp_boost = lab.find("xp_boost").unwrap();

        lab.unlock(auto_loot, 5).unwrap();
        assert_eq!(lab.balance(), Fixed64::ZERO);

        assert!(matches!(
            lab.unlock(xp_boost, 5),
            Err(ResearchError::InsufficientPoints { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Test 23: Draining leaves the pending queue empty
    // -----------------------------------------------------------------------
    #[test]
    fn drain_events_empties_pending() {
        let mut lab = lab_with_defaults(0.5);
        lab.accrue(0);
        assert_eq!(lab.pending_events().len(), 1);

        lab.drain_events();
        assert!(lab.pending_events().is_empty());
        assert!(lab.drain_events().is_empty());
    }
}
