//! Session-scoped state container.
//!
//! All mutable domain state lives in one injectable store, passed by handle
//! to every service. Local collections change only after the corresponding
//! gateway call resolves, and responses carry a per-entity ticket so a slow
//! response can never overwrite the effect of a newer one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    CartLine, Discount, Inquiry, InventoryItem, Notification, Order, User, UserRole,
};

/// Entity classes sequenced independently for stale-response discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Inventory,
    Discounts,
    Orders,
    Users,
    Inquiries,
}

/// Everything owned by the authenticated session. Cleared wholesale on
/// logout so nothing leaks across users.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_user: Option<User>,
    pub inventory: Vec<InventoryItem>,
    pub discounts: Vec<Discount>,
    pub orders: Vec<Order>,
    pub users: Vec<User>,
    pub inquiries: Vec<Inquiry>,
    pub cart: Vec<CartLine>,
    pub notifications: Vec<Notification>,
    pub revoked_user_ids: HashSet<Uuid>,
}

impl SessionState {
    pub fn cart_subtotal(&self) -> Decimal {
        self.cart.iter().map(CartLine::line_total).sum()
    }

    pub fn cart_item_count(&self) -> u32 {
        self.cart.iter().map(|line| line.quantity).sum()
    }

    /// Email addresses of every manager-role user, for alert fan-out.
    pub fn manager_emails(&self) -> Vec<String> {
        self.users
            .iter()
            .filter(|user| user.role == UserRole::Manager)
            .map(|user| user.email.clone())
            .collect()
    }
}

#[derive(Default)]
struct EntityClock {
    issued: u64,
    applied: u64,
}

/// A sequencing ticket taken before a gateway call. The matching response
/// may only be applied while the ticket is still the freshest one for its
/// entity class and the session generation it was issued under.
#[derive(Debug, Clone, Copy)]
pub struct Ticket {
    kind: EntityKind,
    seq: u64,
    generation: u64,
}

/// Shared handle over the session state. Cheap to clone.
#[derive(Clone)]
pub struct StateStore {
    state: Arc<RwLock<SessionState>>,
    clocks: Arc<DashMap<EntityKind, EntityClock>>,
    generation: Arc<AtomicU64>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            clocks: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Takes a sequencing ticket for `kind`. Call this before the gateway
    /// round-trip whose result will be applied with [`StateStore::apply`].
    pub fn ticket(&self, kind: EntityKind) -> Ticket {
        let generation = self.generation.load(Ordering::SeqCst);
        let mut clock = self.clocks.entry(kind).or_default();
        clock.issued += 1;
        Ticket {
            kind,
            seq: clock.issued,
            generation,
        }
    }

    /// Applies a sequenced mutation. Returns `None` without touching state
    /// when the ticket is stale: a newer response for the same entity class
    /// already applied, or the session was cleared since the ticket was
    /// issued.
    pub async fn apply<T>(
        &self,
        ticket: Ticket,
        f: impl FnOnce(&mut SessionState) -> T,
    ) -> Option<T> {
        let mut state = self.state.write().await;
        if ticket.generation != self.generation.load(Ordering::SeqCst) {
            return None;
        }
        let mut clock = self.clocks.entry(ticket.kind).or_default();
        if ticket.seq <= clock.applied {
            return None;
        }
        clock.applied = ticket.seq;
        drop(clock);
        Some(f(&mut state))
    }

    /// Reads under the lock without cloning the whole state.
    pub async fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    /// Un-sequenced write, for state the session owns exclusively (cart,
    /// notifications, revocation set, current user).
    pub async fn write<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    /// Full read-only copy for the presentation layer.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Wipes the session. Outstanding tickets from before the clear can
    /// never apply afterwards.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = SessionState::default();
        self.clocks.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
