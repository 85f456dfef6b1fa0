//! # Listforest Architecture
//!
//! Listforest is the **client-side data engine** for an application of short,
//! ordered, nestable lists. Every list has ten item slots, and any named item
//! may anchor a child list, so a user's lists form a forest. Items may also
//! point at a shared *reusable item* so the same concept can appear in many
//! users' lists.
//!
//! The crate holds no UI and performs no I/O of its own. The embedding
//! application renders views and supplies a [`Transport`](effects::Transport)
//! that carries requests to the server.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - ForestApp: session, snapshot, view cache, error bag      │
//! │  - Returns CmdResult, never an error                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Request builders: validate, then describe the call       │
//! │  - Response appliers: fold the answer into a new snapshot   │
//! │  - Organizer state machine, reorder protocol                │
//! └─────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌──────────────────────────┐     ┌─────────────────────────────┐
//! │  Effects (effects/)      │     │  Normalizer (normalize.rs)  │
//! │  - Transport trait       │     │  - Nested JSON -> flat maps │
//! │  - RequestSpec, routes   │     └─────────────────────────────┘
//! └──────────────────────────┘                   │
//!                                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Entity Store (store/)                                      │
//! │  - Immutable snapshot, pure transitions                     │
//! │  - Consistency doctor                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Derived Views (views/)                                     │
//! │  - Grouped lists, resolved slots, parents, suggestions      │
//! │  - Memoized on collection revisions                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Snapshots, Not Mutation
//!
//! The store is never changed in place. Each transition returns a new
//! [`EntityStore`](store::EntityStore); old snapshots stay valid, and views
//! computed from them stay consistent. Derived views are recomputed only when
//! a collection they read gets a new revision.
//!
//! ## The Forest Must Stay a Forest
//!
//! Following `parent_item -> owning list -> parent_item ...` must always reach
//! a top-level list. The organizer refuses any reparent that would close a
//! loop, before a request is built. [`store::doctor`] reports snapshots that
//! violate this or the slot invariants anyway.
//!
//! ## Testing Strategy
//!
//! 1. **Store and views**: unit tests over fixtures built with
//!    `store::fixtures::ForestFixture` (enable the `test_utils` feature to use
//!    it outside this crate).
//! 2. **Commands**: request builders and appliers tested without a transport.
//! 3. **API**: flows driven through the scripted transport, asserting on the
//!    requests issued and the resulting snapshot.
//!
//! ## Module Overview
//!
//! - [`api`]: The `ForestApp` facade, entry point for all operations
//! - [`commands`]: Request builders and response appliers per operation
//! - [`store`]: Entity store snapshot, transitions and consistency checks
//! - [`views`]: Derived views and their memoizing cache
//! - [`normalize`]: Server payloads to flat entity maps
//! - [`effects`]: Transport contract, endpoints, error formatting
//! - [`model`]: Core data types (`List`, `Item`, `ReusableItem`, patches)
//! - [`session`], [`permissions`]: Who is logged in and what they may do
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod effects;
pub mod error;
pub mod model;
pub mod normalize;
pub mod permissions;
pub mod session;
pub mod store;
pub mod views;

pub use api::ForestApp;
pub use commands::{CmdMessage, CmdResult, Confirmation, ErrorBag, MessageLevel};
pub use config::ForestConfig;
pub use effects::{RequestSpec, ResponseBody, Transport};
pub use error::{ForestError, Result};
pub use model::{
    Item, ItemId, List, ListId, Notification, NotificationId, ReusableItem, ReusableItemId,
    UserId, MAX_ITEMS,
};
pub use session::Session;
pub use store::EntityStore;
