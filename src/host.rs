/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Host command seam: how the tracker asks the browser to navigate a tab.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{RestoreError, TabId, UpdateProperties};

/// The browser side of the tracker.
///
/// Commands are fire-and-forget: an `Ok` only means the host accepted the
/// request. Its effects come back later as fresh notifications.
pub trait TabHost {
    fn update_tab(&mut self, tab_id: TabId, properties: UpdateProperties)
        -> Result<(), RestoreError>;
}

impl<F> TabHost for F
where
    F: FnMut(TabId, UpdateProperties) -> Result<(), RestoreError>,
{
    fn update_tab(
        &mut self,
        tab_id: TabId,
        properties: UpdateProperties,
    ) -> Result<(), RestoreError> {
        self(tab_id, properties)
    }
}

/// A tab-update command as issued to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCommand {
    pub tab_id: TabId,
    #[serde(flatten)]
    pub properties: UpdateProperties,
}

/// Host that records every command instead of navigating anything.
///
/// Tabs marked with [`reject`](Self::reject) fail their commands, the way a
/// browser does once the tab has been closed.
#[derive(Debug, Default)]
pub struct RecordingHost {
    commands: Vec<IssuedCommand>,
    rejected: HashSet<TabId>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later command for `tab_id` fail.
    pub fn reject(&mut self, tab_id: TabId) {
        self.rejected.insert(tab_id);
    }

    /// Commands accepted so far, oldest first.
    pub fn commands(&self) -> &[IssuedCommand] {
        &self.commands
    }

    /// Drain and return the accepted commands.
    pub fn take_commands(&mut self) -> Vec<IssuedCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl TabHost for RecordingHost {
    fn update_tab(
        &mut self,
        tab_id: TabId,
        properties: UpdateProperties,
    ) -> Result<(), RestoreError> {
        if self.rejected.contains(&tab_id) {
            return Err(RestoreError::HostRejected {
                tab_id,
                reason: format!("no tab with id {tab_id}"),
            });
        }
        self.commands.push(IssuedCommand { tab_id, properties });
        Ok(())
    }
}
