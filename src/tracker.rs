/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Layer 1: `TabStateTracker` — single-threaded restore state machine.
//!
//! A discarded tab that the browser reactivates onto the blank page goes
//! through three states:
//!
//! ```text
//!  Normal --detect--> Unloaded --stage--> Pending --complete--> Normal
//!                        |
//!                        +--cancel--> Normal
//! ```
//!
//! Removing a tab purges it from every state.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use log::{debug, error, trace};
use url::Url;

use crate::host::TabHost;
use crate::types::{
    ChangeInfo, MessageSender, NavigationDetails, NavigationFilter, RemoveInfo,
    RestoreError, RestoreOptions, RuntimeMessage, Tab, TabId, TabState, TabStatus, UpdateProperties,
    UrlFilter,
};

// ---------------------------------------------------------------------------
// Internal: URL helpers
// ---------------------------------------------------------------------------

fn parse_absolute(url: &str) -> Result<Url, RestoreError> {
    Url::parse(url).map_err(|e| RestoreError::InvalidUrl(format!("{url}: {e}")))
}

/// True when `url` is a real web address the user was trying to reach.
fn is_web_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Strip query and fragment so a page's own `location.href` still matches.
fn document_address(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url
}

// ---------------------------------------------------------------------------
// Internal: panic backtraces
// ---------------------------------------------------------------------------

thread_local! {
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook that records the backtrace at the panic site, so the
/// handler boundary can log where the failure happened.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            PANIC_TRACE.with(|trace| *trace.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

fn take_panic_trace() -> Option<Backtrace> {
    PANIC_TRACE.with(|trace| trace.borrow_mut().take())
}

// ===========================================================================
// Layer 1: TabStateTracker
// ===========================================================================

/// Per-tab restore state plus the host it issues navigations to.
///
/// Every handler runs to completion and never fails: errors and panics are
/// logged and swallowed so one bad event cannot stop later ones from being
/// processed. State is updated before the host command is issued and is not
/// rolled back if the command fails.
pub struct TabStateTracker<H> {
    host: H,
    options: RestoreOptions,
    placeholder: Url,
    unloaded: HashSet<TabId>,
    pending: HashMap<TabId, String>,
}

impl<H: TabHost> TabStateTracker<H> {
    /// Create a tracker with empty state.
    ///
    /// Fails if the configured placeholder address is not an absolute URL.
    pub fn new(options: RestoreOptions, host: H) -> Result<Self, RestoreError> {
        let placeholder = document_address(&parse_absolute(&options.placeholder_url)?);
        install_panic_hook();
        Ok(Self {
            host,
            options,
            placeholder,
            unloaded: HashSet::new(),
            pending: HashMap::new(),
        })
    }

    // -- Host notifications --

    /// Tab-update notification.
    pub fn on_tab_updated(&mut self, tab_id: TabId, change_info: &ChangeInfo, tab: &Tab) {
        self.guarded("tabs.onUpdated", |tracker| {
            tracker.tab_updated(tab_id, change_info, tab)
        });
    }

    /// Tab-removal notification. Purges the tab from every state.
    pub fn on_tab_removed(&mut self, tab_id: TabId, _remove_info: &RemoveInfo) {
        self.guarded("tabs.onRemoved", |tracker| {
            tracker.purge(tab_id);
            Ok(())
        });
    }

    /// Navigation-start notification.
    pub fn on_before_navigate(&mut self, details: &NavigationDetails) {
        self.guarded("webNavigation.onBeforeNavigate", |tracker| {
            tracker.before_navigate(details)
        });
    }

    /// Report message from the placeholder page.
    pub fn on_message(&mut self, message: &RuntimeMessage, sender: &MessageSender) {
        self.guarded("runtime.onMessage", |tracker| {
            tracker.message(message, sender)
        });
    }

    // -- Queries --

    /// Current state of `tab_id`. A re-detected pending tab reports `Unloaded`.
    pub fn state(&self, tab_id: TabId) -> TabState {
        if self.unloaded.contains(&tab_id) {
            TabState::Unloaded
        } else if self.pending.contains_key(&tab_id) {
            TabState::Pending
        } else {
            TabState::Normal
        }
    }

    pub fn is_unloaded(&self, tab_id: TabId) -> bool {
        self.unloaded.contains(&tab_id)
    }

    /// Address staged for `tab_id`, if a redirect is pending.
    pub fn pending_url(&self, tab_id: TabId) -> Option<&str> {
        self.pending.get(&tab_id).map(String::as_str)
    }

    /// Every tab that is not `Normal`, sorted.
    pub fn tracked_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<TabId> = self
            .unloaded
            .iter()
            .chain(self.pending.keys())
            .copied()
            .collect();
        tabs.sort_unstable();
        tabs.dedup();
        tabs
    }

    /// Filter a host should register the navigation-start listener with.
    pub fn navigation_filter(&self) -> NavigationFilter {
        NavigationFilter {
            url: vec![UrlFilter {
                url_equals: self.options.placeholder_url.clone(),
            }],
        }
    }

    pub fn options(&self) -> &RestoreOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    // -- Internal: transitions --

    fn guarded(
        &mut self,
        handler: &str,
        f: impl FnOnce(&mut Self) -> Result<(), RestoreError>,
    ) {
        take_panic_trace();
        match panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("{handler} failed: {e}\n{}", Backtrace::force_capture());
            }
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                match take_panic_trace() {
                    Some(trace) => error!("{handler} panicked: {msg}\n{trace}"),
                    None => error!("{handler} panicked: {msg}"),
                }
            }
        }
    }

    /// The browser un-discarded the active tab but left it on the blank page.
    fn is_reactivated_blank(&self, change_info: &ChangeInfo, tab: &Tab) -> bool {
        tab.active
            && change_info.discarded == Some(false)
            && tab.url.as_deref() == Some(self.options.blank_url.as_str())
            && tab.status == Some(TabStatus::Complete)
    }

    fn tab_updated(
        &mut self,
        tab_id: TabId,
        change_info: &ChangeInfo,
        tab: &Tab,
    ) -> Result<(), RestoreError> {
        if self.is_reactivated_blank(change_info, tab) {
            debug!("tab {tab_id}: reactivated onto blank page");
            self.unloaded.insert(tab_id);
            return Ok(());
        }

        if !self.unloaded.contains(&tab_id) {
            return Ok(());
        }

        if let Some(url) = tab.url.as_deref().filter(|url| is_web_url(url)) {
            self.unloaded.remove(&tab_id);
            self.pending.insert(tab_id, url.to_string());
            debug!("tab {tab_id}: staging {url} behind placeholder");
            return self.host.update_tab(
                tab_id,
                UpdateProperties {
                    url: self.options.placeholder_url.clone(),
                    load_replace: false,
                },
            );
        }

        if let Some(url) = change_info.url.as_deref() {
            if url != self.options.blank_url {
                debug!("tab {tab_id}: navigated to {url} on its own");
                self.unloaded.remove(&tab_id);
            }
        }
        Ok(())
    }

    fn before_navigate(&mut self, details: &NavigationDetails) -> Result<(), RestoreError> {
        if !self.options.completion.accepts_navigation() {
            return Ok(());
        }
        if !self.pending.contains_key(&details.tab_id) || !self.is_placeholder(&details.url) {
            trace!("tab {}: ignoring navigation to {}", details.tab_id, details.url);
            return Ok(());
        }
        self.complete(details.tab_id)
    }

    fn message(
        &mut self,
        message: &RuntimeMessage,
        sender: &MessageSender,
    ) -> Result<(), RestoreError> {
        if !self.options.completion.accepts_message() {
            return Ok(());
        }
        let (Some(tab_id), Some(url)) = (sender.tab_id(), message.url.as_deref()) else {
            trace!("ignoring message without sender tab or url");
            return Ok(());
        };
        if !self.pending.contains_key(&tab_id) || !self.is_placeholder(url) {
            trace!("tab {tab_id}: ignoring message from {url}");
            return Ok(());
        }
        self.complete(tab_id)
    }

    fn complete(&mut self, tab_id: TabId) -> Result<(), RestoreError> {
        let Some(url) = self.pending.remove(&tab_id) else {
            return Ok(());
        };
        debug!("tab {tab_id}: restoring {url}");
        self.host.update_tab(
            tab_id,
            UpdateProperties {
                url,
                load_replace: true,
            },
        )
    }

    fn purge(&mut self, tab_id: TabId) {
        let unloaded = self.unloaded.remove(&tab_id);
        let pending = self.pending.remove(&tab_id).is_some();
        if unloaded || pending {
            debug!("tab {tab_id}: removed, state purged");
        }
    }

    fn is_placeholder(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|u| document_address(&u) == self.placeholder)
            .unwrap_or(false)
    }
}

impl<H> std::fmt::Debug for TabStateTracker<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabStateTracker")
            .field("placeholder", &self.placeholder.as_str())
            .field("completion", &self.options.completion)
            .field("unloaded", &self.unloaded)
            .field("pending", &self.pending)
            .finish()
    }
}
