/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Replays a recorded trace of browser tab events through the tracker.
//!
//! Thin wrapper around [`discard_restore::TabStateTracker`]. Reads one JSON
//! event per line and prints every navigation command the tracker issues.
//!
//! ```bash
//! discard-restore --trace events.jsonl
//! discard-restore --placeholder moz-extension://abc/reload.html < events.jsonl
//! discard-restore --print-filter
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process;

use bpaf::Bpaf;
use discard_restore::{
    CompletionTrigger, RecordingHost, RestoreOptions, TabStateTracker, parse_event,
};
use log::{error, info};

// ---------------------------------------------------------------------------
// CLI parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, usage("discard-restore [OPTIONS]"))]
struct ReplayConfig {
    /// Read events from the given file instead of stdin
    #[bpaf(long, short, argument("PATH"))]
    trace: Option<String>,

    /// Address the browser parks reactivated tabs on
    #[bpaf(long, argument("URL"), fallback(discard_restore::DEFAULT_BLANK_URL.to_string()))]
    blank: String,

    /// Address of the intermediate placeholder page
    #[bpaf(long, argument("URL"), fallback(discard_restore::DEFAULT_PLACEHOLDER_URL.to_string()))]
    placeholder: String,

    /// Notification that completes a redirect: navigation, message or either
    #[bpaf(long, argument("TRIGGER"), fallback(CompletionTrigger::Either), display_fallback)]
    completion: CompletionTrigger,

    /// Print the navigation listener URL filter as JSON and exit
    #[bpaf(long)]
    print_filter: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let config = replay_config().run();

    let options = RestoreOptions {
        blank_url: config.blank,
        placeholder_url: config.placeholder,
        completion: config.completion,
    };

    let mut tracker = TabStateTracker::new(options, RecordingHost::new()).unwrap_or_else(|e| {
        eprintln!("Error: failed to initialize tracker: {e}");
        process::exit(1);
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if config.print_filter {
        match serde_json::to_string(&tracker.navigation_filter()) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(e) => {
                eprintln!("Error: failed to encode filter: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let input: Box<dyn BufRead> = match &config.trace {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error: failed to open {path}: {e}");
                process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut handled = 0usize;
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error: failed to read line {line_no}: {e}");
                process::exit(1);
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(e) => {
                eprintln!("Skipping line {line_no}: {e}");
                continue;
            }
        };
        event.apply(&mut tracker);
        handled += 1;

        for command in tracker.host_mut().take_commands() {
            match serde_json::to_string(&command) {
                Ok(json) => {
                    if let Err(e) = writeln!(out, "{json}") {
                        eprintln!("Error: failed to write output: {e}");
                        process::exit(1);
                    }
                }
                Err(e) => error!("failed to encode command for tab {}: {e}", command.tab_id),
            }
        }
    }

    info!("replayed {handled} events");
    let tracked = tracker.tracked_tabs();
    if !tracked.is_empty() {
        eprintln!("Tabs still awaiting restore: {tracked:?}");
    }
}
