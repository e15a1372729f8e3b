/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Host notifications as data, and their JSON wire format.
//!
//! One event per line, tagged by `event`:
//!
//! ```json
//! {"event":"tab_updated","tabId":7,"changeInfo":{"discarded":false},"tab":{"active":true,"url":"about:blank","status":"complete"}}
//! {"event":"tab_removed","tabId":7,"removeInfo":{"windowId":1,"isWindowClosing":false}}
//! {"event":"before_navigate","details":{"tabId":7,"url":"moz-extension://discard-restore/reload.html"}}
//! {"event":"message","message":{"url":"moz-extension://discard-restore/reload.html"},"sender":{"tab":{"id":7}}}
//! ```

use serde::{Deserialize, Serialize};

use crate::host::TabHost;
use crate::tracker::TabStateTracker;
use crate::types::{
    ChangeInfo, MessageSender, NavigationDetails, RemoveInfo, RestoreError, RuntimeMessage, Tab,
    TabId,
};

/// A notification delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    #[serde(rename_all = "camelCase")]
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        change_info: ChangeInfo,
        #[serde(default)]
        tab: Tab,
    },
    #[serde(rename_all = "camelCase")]
    TabRemoved {
        tab_id: TabId,
        #[serde(default)]
        remove_info: RemoveInfo,
    },
    BeforeNavigate { details: NavigationDetails },
    Message {
        #[serde(default)]
        message: RuntimeMessage,
        #[serde(default)]
        sender: MessageSender,
    },
}

impl HostEvent {
    /// Route the event to the matching tracker handler.
    pub fn apply<H: TabHost>(self, tracker: &mut TabStateTracker<H>) {
        match self {
            HostEvent::TabUpdated {
                tab_id,
                change_info,
                tab,
            } => tracker.on_tab_updated(tab_id, &change_info, &tab),
            HostEvent::TabRemoved {
                tab_id,
                remove_info,
            } => tracker.on_tab_removed(tab_id, &remove_info),
            HostEvent::BeforeNavigate { details } => tracker.on_before_navigate(&details),
            HostEvent::Message { message, sender } => tracker.on_message(&message, &sender),
        }
    }

    /// Tab the event concerns, if it names one.
    pub fn tab_id(&self) -> Option<TabId> {
        match self {
            HostEvent::TabUpdated { tab_id, .. } | HostEvent::TabRemoved { tab_id, .. } => {
                Some(*tab_id)
            }
            HostEvent::BeforeNavigate { details } => Some(details.tab_id),
            HostEvent::Message { sender, .. } => sender.tab_id(),
        }
    }
}

/// Parse one JSON-encoded event.
pub fn parse_event(line: &str) -> Result<HostEvent, RestoreError> {
    serde_json::from_str(line).map_err(|e| RestoreError::MalformedEvent(e.to_string()))
}
