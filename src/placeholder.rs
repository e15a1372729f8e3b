/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The intermediate page's agent: a one-shot delayed report back to the
//! tracker, suppressed if the page is torn down first.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::types::{MessageSender, RuntimeMessage, TabId};

/// Delay before the placeholder reports itself. Long enough to outlast the
/// teardown of the navigation that loaded it.
pub const PLACEHOLDER_DELAY: Duration = Duration::from_millis(1000);

/// Scheduled report from a loaded placeholder page.
///
/// Dropping the agent counts as tearing the page down.
pub struct PlaceholderAgent {
    cancel: Option<mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<bool>>,
}

impl PlaceholderAgent {
    /// Schedule `deliver` to receive the page's own address after `delay`.
    pub fn spawn<F>(tab_id: TabId, page_url: &str, delay: Duration, deliver: F) -> Self
    where
        F: FnOnce(RuntimeMessage, MessageSender) + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let url = page_url.to_string();

        let thread = thread::spawn(move || match cancel_rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                debug!("tab {tab_id}: placeholder reporting {url}");
                deliver(RuntimeMessage { url: Some(url) }, MessageSender::from_tab(tab_id));
                true
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("tab {tab_id}: placeholder torn down before report");
                false
            }
        });

        Self {
            cancel: Some(cancel_tx),
            thread: Some(thread),
        }
    }

    /// Page is going away: suppress the report if it has not fired yet.
    pub fn teardown(mut self) {
        self.cancel_and_join();
    }

    /// Block until the timer resolves. Returns true if the report was sent.
    pub fn wait(mut self) -> bool {
        self.thread
            .take()
            .map(|thread| thread.join().unwrap_or(false))
            .unwrap_or(false)
    }

    fn cancel_and_join(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PlaceholderAgent {
    fn drop(&mut self) {
        self.cancel_and_join();
    }
}
