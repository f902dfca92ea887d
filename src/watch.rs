use std::path::PathBuf;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::{is_image_file, Result};

/// Watch every existing root recursively and call `on_change` once per
/// relevant event. The watcher stops when the returned handle is dropped.
pub fn start_watcher<F>(roots: &[PathBuf], on_change: F) -> Result<RecommendedWatcher>
where
    F: Fn() + Send + 'static,
{
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if is_relevant(&event) {
                debug!(kind = ?event.kind, paths = ?event.paths, "fs: refresh");
                on_change();
            } else {
                debug!(kind = ?event.kind, "fs: ignored");
            }
        }
        Err(e) => error!("watch error: {e}"),
    })?;

    for root in roots {
        if !root.is_dir() {
            warn!(root = %root.display(), "not watching missing directory");
            continue;
        }
        watcher.watch(root, RecursiveMode::Recursive)?;
        info!(watching = %root.display(), "notify watcher initialized (recursive)");
    }

    Ok(watcher)
}

/// Create, remove and modify events (moves included) that touch at least one
/// allow-listed file.
pub fn is_relevant(event: &Event) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(_)
    );
    kind_matches && event.paths.iter().any(|p| is_image_file(p))
}
