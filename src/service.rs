/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Layer 2: `RestoreService` — thread-safe wrapper (`Send + Sync`).

use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;

use log::error;

use crate::events::HostEvent;
use crate::host::TabHost;
use crate::tracker::TabStateTracker;
use crate::types::{NavigationFilter, RestoreError, RestoreOptions, TabId, TabState};

/// Commands sent from the `RestoreService` handle to the background thread.
enum Command {
    Event(HostEvent),
    State {
        tab_id: TabId,
        response: mpsc::Sender<TabState>,
    },
    PendingUrl {
        tab_id: TabId,
        response: mpsc::Sender<Option<String>>,
    },
    TrackedTabs {
        response: mpsc::Sender<Vec<TabId>>,
    },
    Shutdown,
}

/// Thread-safe tracker handle.
///
/// Spawns a dedicated background thread owning a [`TabStateTracker`]. Events
/// from any thread are queued and handled one at a time in arrival order,
/// so a query always observes every event sent before it.
pub struct RestoreService {
    sender: Mutex<mpsc::Sender<Command>>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    filter: NavigationFilter,
}

impl RestoreService {
    /// Start the background thread with a tracker driving `host`.
    pub fn new<H>(options: RestoreOptions, host: H) -> Result<Self, RestoreError>
    where
        H: TabHost + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = mpsc::channel::<Result<NavigationFilter, RestoreError>>();

        let thread = thread::spawn(move || {
            let mut tracker = match TabStateTracker::new(options, host) {
                Ok(tracker) => {
                    let _ = init_tx.send(Ok(tracker.navigation_filter()));
                    tracker
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                    return;
                }
            };

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Event(event) => event.apply(&mut tracker),
                    Command::State { tab_id, response } => {
                        let _ = response.send(tracker.state(tab_id));
                    }
                    Command::PendingUrl { tab_id, response } => {
                        let _ = response.send(tracker.pending_url(tab_id).map(str::to_string));
                    }
                    Command::TrackedTabs { response } => {
                        let _ = response.send(tracker.tracked_tabs());
                    }
                    Command::Shutdown => break,
                }
            }
        });

        let filter = init_rx
            .recv()
            .map_err(|_| RestoreError::InitFailed("background thread panicked".into()))??;

        Ok(Self {
            sender: Mutex::new(cmd_tx),
            thread: Mutex::new(Some(thread)),
            filter,
        })
    }

    fn send(&self, cmd: Command) -> Result<(), RestoreError> {
        let sender = self.sender.lock().map_err(|_| RestoreError::ChannelClosed)?;
        sender.send(cmd).map_err(|_| RestoreError::ChannelClosed)
    }

    fn send_cmd<T>(
        &self,
        make_cmd: impl FnOnce(mpsc::Sender<T>) -> Command,
    ) -> Result<T, RestoreError> {
        let (resp_tx, resp_rx) = mpsc::channel();
        self.send(make_cmd(resp_tx))?;
        resp_rx.recv().map_err(|_| RestoreError::ChannelClosed)
    }

    /// Queue a host notification. Does not wait for it to be handled.
    pub fn dispatch(&self, event: HostEvent) -> Result<(), RestoreError> {
        self.send(Command::Event(event))
    }

    pub fn state(&self, tab_id: TabId) -> Result<TabState, RestoreError> {
        self.send_cmd(|response| Command::State { tab_id, response })
    }

    pub fn pending_url(&self, tab_id: TabId) -> Result<Option<String>, RestoreError> {
        self.send_cmd(|response| Command::PendingUrl { tab_id, response })
    }

    pub fn tracked_tabs(&self) -> Result<Vec<TabId>, RestoreError> {
        self.send_cmd(|response| Command::TrackedTabs { response })
    }

    /// Filter to register the navigation-start listener with.
    pub fn navigation_filter(&self) -> &NavigationFilter {
        &self.filter
    }
}

impl Drop for RestoreService {
    fn drop(&mut self) {
        // Already-queued events are handled before the shutdown is seen.
        let _ = self.send(Command::Shutdown);
        let thread = self.thread.get_mut().ok().and_then(Option::take);
        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!("restore service thread panicked");
            }
        }
    }
}
