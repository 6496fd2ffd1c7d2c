//! Long-polling runtime: the polling loop, the handler chain and the
//! authorization gate in front of it.

pub mod auth;
pub mod bot;
pub mod context;
pub mod dispatch;

#[cfg(test)]
mod fake;

pub use auth::{AllowAll, AllowedUsers, Authorization, Authorizer};
pub use bot::{Bot, BotOptions};
pub use context::{Context, Severity};
pub use dispatch::{DispatchChain, Flow, UpdateHandler};
