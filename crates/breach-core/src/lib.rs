pub mod authorizer;
pub mod challenge;
pub mod collab;
pub mod config;
pub mod connection;
pub mod content;
pub mod error;
pub mod escalation;
pub mod events;
pub mod filesystem;
pub mod hosts;
pub mod io;
pub mod mission;
pub mod paths;
pub mod save;
pub mod scheduler;
pub mod session;
pub mod types;
pub mod world;

pub use error::{BreachError, ConnectError, ErrorTag, Result};
pub use session::{CommandResult, Session};
