/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared public types used across all layers.
//!
//! Payload types mirror the fields of the browser's tab and navigation
//! notifications that the tracker reads. They deserialize from the browser's
//! camelCase JSON so a host bridge can forward events verbatim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Host-assigned tab identifier. Reused only after the tab is removed.
pub type TabId = i32;

/// Default blank address the browser parks a reactivated tab on.
pub const DEFAULT_BLANK_URL: &str = "about:blank";

/// Default address of the bundled intermediate page.
pub const DEFAULT_PLACEHOLDER_URL: &str = "moz-extension://discard-restore/reload.html";

/// Load status reported for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Properties that changed in a tab-update notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeInfo {
    /// Present only when the discard state changed.
    pub discarded: Option<bool>,
    /// Present only when the tab's address changed.
    pub url: Option<String>,
    pub status: Option<TabStatus>,
}

/// Snapshot of a tab as delivered alongside an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: Option<TabId>,
    #[serde(default)]
    pub active: bool,
    pub url: Option<String>,
    pub status: Option<TabStatus>,
}

/// Extra information delivered with a tab-removal notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveInfo {
    pub window_id: Option<i32>,
    #[serde(default)]
    pub is_window_closing: bool,
}

/// Navigation-start notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDetails {
    pub tab_id: TabId,
    pub url: String,
}

/// One-way message sent by the placeholder page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMessage {
    pub url: Option<String>,
}

/// Origin of a [`RuntimeMessage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
    pub tab: Option<SenderTab>,
}

impl MessageSender {
    pub fn from_tab(id: TabId) -> Self {
        Self {
            tab: Some(SenderTab { id }),
        }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        self.tab.as_ref().map(|tab| tab.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderTab {
    pub id: TabId,
}

/// Arguments of the host's tab-update command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProperties {
    pub url: String,
    /// Replace the current history entry instead of pushing a new one.
    pub load_replace: bool,
}

/// URL filter a host registers the navigation-start listener with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationFilter {
    pub url: Vec<UrlFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlFilter {
    pub url_equals: String,
}

/// Where a tab stands in the restore state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabState {
    /// Not tracked.
    Normal,
    /// Reactivated onto the blank page, waiting for the real navigation.
    Unloaded,
    /// Sent to the placeholder; original address staged.
    Pending,
}

/// Which notifications may complete a staged redirect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionTrigger {
    /// Navigation-start toward the placeholder.
    Navigation,
    /// Report message from the loaded placeholder page.
    Message,
    /// Whichever arrives first.
    #[default]
    Either,
}

impl CompletionTrigger {
    pub fn accepts_navigation(self) -> bool {
        matches!(self, CompletionTrigger::Navigation | CompletionTrigger::Either)
    }

    pub fn accepts_message(self) -> bool {
        matches!(self, CompletionTrigger::Message | CompletionTrigger::Either)
    }
}

impl fmt::Display for CompletionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionTrigger::Navigation => write!(f, "navigation"),
            CompletionTrigger::Message => write!(f, "message"),
            CompletionTrigger::Either => write!(f, "either"),
        }
    }
}

impl FromStr for CompletionTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigation" => Ok(CompletionTrigger::Navigation),
            "message" => Ok(CompletionTrigger::Message),
            "either" => Ok(CompletionTrigger::Either),
            other => Err(format!(
                "unknown completion trigger {other:?} (expected navigation, message or either)"
            )),
        }
    }
}

/// Options for configuring a tracker.
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Address a discarded tab is parked on (default: `about:blank`).
    pub blank_url: String,
    /// Address of the intermediate page used as a stepping stone.
    pub placeholder_url: String,
    /// Notifications allowed to complete a redirect (default: either).
    pub completion: CompletionTrigger,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            blank_url: DEFAULT_BLANK_URL.to_string(),
            placeholder_url: DEFAULT_PLACEHOLDER_URL.to_string(),
            completion: CompletionTrigger::default(),
        }
    }
}

/// Errors that can occur while restoring tabs.
#[derive(Debug)]
pub enum RestoreError {
    /// A configured address is not a valid absolute URL.
    InvalidUrl(String),
    /// The host refused a tab-update command.
    HostRejected { tab_id: TabId, reason: String },
    /// A host event could not be decoded.
    MalformedEvent(String),
    /// Internal channel was closed (service wrapper).
    ChannelClosed,
    /// Failed to start the service thread.
    InitFailed(String),
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreError::InvalidUrl(msg) => write!(f, "invalid URL: {msg}"),
            RestoreError::HostRejected { tab_id, reason } => {
                write!(f, "host rejected update of tab {tab_id}: {reason}")
            }
            RestoreError::MalformedEvent(msg) => write!(f, "malformed event: {msg}"),
            RestoreError::ChannelClosed => write!(f, "internal channel closed"),
            RestoreError::InitFailed(msg) => write!(f, "initialization failed: {msg}"),
        }
    }
}

impl std::error::Error for RestoreError {}
