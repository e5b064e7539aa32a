pub mod config;
pub mod mutator;
pub mod persistence;
pub mod prefs;
pub mod probability;
pub mod ratio;
pub mod state;
pub mod store;
#[cfg(test)]
pub(crate) mod test_support;
pub mod time;
