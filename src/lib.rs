/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Restores tabs that the browser un-discards onto a blank page instead of
//! their original address.
//!
//! Provides two layers:
//!
//! - **[`TabStateTracker`]** — single-threaded state machine. Drive it with
//!   one handler call per host notification, in delivery order.
//! - **[`RestoreService`]** — thread-safe wrapper (`Send + Sync`). Spawns a
//!   background thread running a tracker and serializes events from any
//!   thread through a channel.
//!
//! The tracker talks back to the browser through the [`TabHost`] trait.
//! [`PlaceholderAgent`] models the intermediate page that reports itself
//! back once it has loaded.
//!
//! # Example
//!
//! ```
//! use discard_restore::{
//!     ChangeInfo, NavigationDetails, RecordingHost, RestoreOptions, Tab, TabStateTracker,
//!     TabStatus,
//! };
//!
//! let options = RestoreOptions::default();
//! let placeholder = options.placeholder_url.clone();
//! let mut tracker = TabStateTracker::new(options, RecordingHost::new()).unwrap();
//!
//! let blank = Tab {
//!     active: true,
//!     url: Some("about:blank".into()),
//!     status: Some(TabStatus::Complete),
//!     ..Tab::default()
//! };
//! let undiscarded = ChangeInfo { discarded: Some(false), ..ChangeInfo::default() };
//! tracker.on_tab_updated(7, &undiscarded, &blank);
//!
//! let loading = Tab { url: Some("https://example.com/".into()), ..blank };
//! tracker.on_tab_updated(7, &ChangeInfo::default(), &loading);
//!
//! tracker.on_before_navigate(&NavigationDetails { tab_id: 7, url: placeholder });
//!
//! let last = tracker.host().commands().last().unwrap();
//! assert_eq!(last.properties.url, "https://example.com/");
//! assert!(last.properties.load_replace);
//! ```

mod events;
mod host;
mod placeholder;
mod service;
mod tracker;
mod types;

pub use events::{HostEvent, parse_event};
pub use host::{IssuedCommand, RecordingHost, TabHost};
pub use placeholder::{PLACEHOLDER_DELAY, PlaceholderAgent};
pub use service::RestoreService;
pub use tracker::TabStateTracker;
pub use types::{
    ChangeInfo, CompletionTrigger, DEFAULT_BLANK_URL, DEFAULT_PLACEHOLDER_URL, MessageSender,
    NavigationDetails, NavigationFilter, RemoveInfo, RestoreError, RestoreOptions, RuntimeMessage,
    SenderTab, Tab, TabId, TabState, TabStatus, UpdateProperties, UrlFilter,
};
