mod odds;
mod reset;
mod session;
mod storage;

use bagtrack_core::persistence::{PersistenceGateway, SOFT_BUDGET_BYTES};
use bagtrack_core::store::KeyValueStore;

pub use odds::OddsRow;
pub use reset::{DependentState, ResetReport, SiblingFeatureKeys};
pub use session::{Applied, Session};

static SIBLING_FEATURES: SiblingFeatureKeys = SiblingFeatureKeys;

/// Application root: knows where state lives and who else must be told
/// when the user resets.
pub struct App<'a> {
    pub store: &'a dyn KeyValueStore,
    soft_budget_bytes: usize,
    dependents: Vec<&'a dyn DependentState>,
}

impl<'a> App<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            store,
            soft_budget_bytes: SOFT_BUDGET_BYTES,
            dependents: vec![&SIBLING_FEATURES as &dyn DependentState],
        }
    }

    pub fn with_soft_budget(mut self, soft_budget_bytes: usize) -> Self {
        self.soft_budget_bytes = soft_budget_bytes;
        self
    }

    /// Registers another owner of persisted state that a reset must clear.
    pub fn with_dependent(mut self, dependent: &'a dyn DependentState) -> Self {
        self.dependents.push(dependent);
        self
    }

    /// Rehydrates the session from the store. Never fails: unreadable or
    /// corrupt state is logged and replaced by defaults.
    pub fn open(&self) -> Session<'a> {
        let gateway = PersistenceGateway::with_soft_budget(self.store, self.soft_budget_bytes);
        Session::open(gateway, self.dependents.clone())
    }
}
