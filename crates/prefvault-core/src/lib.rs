//! Core contracts for Prefvault: the secret vault and preference store
//! collaborators, plus in-memory doubles for tests.
//! Concrete backends live in `prefvault-storage`.

pub mod prefs;
pub mod vault;
