use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::selector::{Selection, Selector};
use crate::watch::start_watcher;
use crate::{Args, PictureTrayError, Result, Settings};

const PLACEHOLDER_LINE: &str = "No Images Found";
const WATCH_QUEUE_DEPTH: usize = 16;

/// One line of output for a draw: `path<TAB>name (n/total)`.
pub fn render_line(selection: Option<&Selection>) -> String {
    match selection {
        Some(selection) => format!("{}\t{}", selection.image.display(), selection.stats_label()),
        None => PLACEHOLDER_LINE.to_owned(),
    }
}

/// Draw once and print it. Returns the selection so the caller can decide
/// what an empty catalog means for the exit status.
pub fn run_once(selector: &Selector) -> Option<Selection> {
    let selection = selector.next();
    println!("{}", render_line(selection.as_ref()));
    selection
}

pub fn run(args: &Args) -> Result<()> {
    let settings = Settings::load(&args.settings_path())?;
    let settings = args.effective_settings(&settings);
    let selector = Arc::new(Selector::new(settings.roots()));
    info!(roots = ?selector.roots(), images = selector.len(), "catalog ready");

    if args.once {
        return match run_once(&selector) {
            Some(_) => Ok(()),
            None => Err(PictureTrayError::NoImages),
        };
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(PictureTrayError::RuntimeCreation)?;

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        info!("interrupt received; exiting");
    };
    runtime.block_on(slideshow(
        selector,
        settings.switch_interval(),
        !args.no_watch,
        interrupted,
    ))
}

/// Print a selection every `interval` and rescan on watcher events until
/// `shutdown` completes.
pub async fn slideshow<S>(
    selector: Arc<Selector>,
    interval: Duration,
    watch: bool,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()>,
{
    // Bridge notify callback -> async channel
    let (watch_tx, mut watch_rx) = mpsc::channel::<()>(WATCH_QUEUE_DEPTH);
    let _watcher = if watch {
        match start_watcher(selector.roots(), move || {
            // A full queue already holds a pending refresh
            let _ = watch_tx.try_send(());
        }) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(error = %e, "continuing without directory watching");
                None
            }
        }
    } else {
        drop(watch_tx);
        None
    };

    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            _ = ticker.tick() => {
                let selection = selector.next();
                match &selection {
                    Some(s) => debug!(image = %s.image.display(), ordinal = s.ordinal, total = s.total, "selected"),
                    None => debug!("catalog empty"),
                }
                println!("{}", render_line(selection.as_ref()));
            }

            Some(()) = watch_rx.recv() => {
                // Coalesce a burst of events into one scan
                while watch_rx.try_recv().is_ok() {}

                let scanner = Arc::clone(&selector);
                match tokio::task::spawn_blocking(move || scanner.refresh()).await {
                    Ok(()) => info!(images = selector.len(), "catalog refreshed"),
                    Err(e) => error!(error = %e, "refresh task failed"),
                }
            }
        }
    }

    Ok(())
}
