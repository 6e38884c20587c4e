// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering of notifications and list views.

use std::time::Duration;

use colored::Colorize;
use stockroom_core::Scope;
use stockroom_workflow::{Notifier, UndoHandle, ViewSnapshot};

/// Prints mutation outcomes to stderr.
///
/// The undo handle itself is not kept: the `delete` command acts on the
/// handle returned by the controller.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    plain: bool,
}

impl ConsoleNotifier {
    pub fn new(plain: bool) -> Self {
        Self { plain }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify_success(
        &self,
        message: &str,
        description: Option<&str>,
        undo_window: Duration,
        on_undo: Option<UndoHandle>,
    ) {
        let undo_window = on_undo.map(|_| undo_window);
        eprint!("{}", render_success(message, description, undo_window, self.plain));
    }

    fn notify_error(&self, message: &str, description: Option<&str>) {
        eprint!("{}", render_error(message, description, self.plain));
    }
}

pub fn render_success(
    message: &str,
    description: Option<&str>,
    undo_window: Option<Duration>,
    plain: bool,
) -> String {
    let symbol = if plain {
        "OK".to_string()
    } else {
        "✓".green().to_string()
    };
    let mut out = format!("{symbol} {message}\n");
    push_description(&mut out, description);
    if let Some(window) = undo_window {
        let hint = format!("undo available for {}s", window.as_secs());
        if plain {
            out.push_str(&format!("  {hint}\n"));
        } else {
            out.push_str(&format!("  {}\n", hint.yellow()));
        }
    }
    out
}

pub fn render_error(message: &str, description: Option<&str>, plain: bool) -> String {
    let mut out = if plain {
        format!("ERROR {message}\n")
    } else {
        format!("{} {}\n", "✗".red(), message.red())
    };
    push_description(&mut out, description);
    out
}

fn push_description(out: &mut String, description: Option<&str>) {
    for line in description.into_iter().flat_map(str::lines) {
        out.push_str(&format!("  {line}\n"));
    }
}

/// One line per entity, then the paging footer.
pub fn render_view(snapshot: &ViewSnapshot, plain: bool) -> String {
    let mut out = String::new();
    let header = format!(
        "{} ({})",
        snapshot.query.model,
        match snapshot.query.scope {
            Scope::Active => "active",
            Scope::Trash => "trash",
        }
    );
    if plain {
        out.push_str(&format!("{header}\n"));
    } else {
        out.push_str(&format!("{}\n", header.bold()));
    }

    if snapshot.items.is_empty() {
        out.push_str("  (no items)\n");
    }
    for entity in &snapshot.items {
        let mut line = format!("  {:<26} {}", entity.id().as_str(), entity.label());
        if let Some(at) = entity.deleted_at() {
            line.push_str(&format!("  deleted {}", at.format("%Y-%m-%d %H:%M")));
        }
        out.push_str(&line);
        out.push('\n');
    }

    for (id, note) in &snapshot.annotations {
        out.push_str(&format!("  ! {id}: {note}\n"));
    }

    let meta = &snapshot.meta;
    out.push_str(&format!(
        "page {}/{} ({} total)\n",
        meta.current,
        meta.pages.max(1),
        meta.total
    ));
    if snapshot.stale {
        out.push_str("(showing cached data)\n");
    }
    out
}
