pub mod config;
pub mod error;
pub mod filter;
pub mod lookup;
pub mod seed;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::LedgerError;
pub use filter::SessionFilter;
pub use lookup::{LookupTables, SessionView};
pub use store::{MemoryStore, SessionStore};
pub use types::{Employee, LookupEntry, Machine, NewSession, Session, SessionPatch};
