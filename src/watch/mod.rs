//! Rebuild on change.
//!
//! Watches the partial and template directories recursively, ignores
//! dotfiles, and feeds changed paths through a [`Debouncer`] so a burst of
//! editor writes produces one full rebuild.

mod debounce;

pub use debounce::{run_debounced, Debouncer, QUIET_PERIOD};

use std::future::Future;
use std::path::{Component, Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::build::BuildPipeline;
use crate::config;
use crate::error::{Error, Result};

/// Run the watch loop for the project at `root` until Ctrl-C or SIGTERM.
pub async fn watch(root: &Path) -> Result<()> {
    let shutdown = shutdown_signal()?;
    watch_until(root, QUIET_PERIOD, shutdown).await
}

/// Run the watch loop until `shutdown` resolves.
///
/// Builds once on startup, then after every quiet period that follows a change.
/// A failing rebuild is logged and watching continues.
pub async fn watch_until<S>(root: &Path, quiet: std::time::Duration, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    let config = config::load(root)?;
    let mut roots = Vec::with_capacity(2);
    for dir in [&config.partials_dir, &config.templates_dir] {
        let path = root.join(dir);
        let path = path
            .canonicalize()
            .map_err(|_| Error::DirectoryNotFound { path: path.clone() })?;
        roots.push(path);
    }

    tracing::info!(
        "Watching for changes in {} and {}...",
        config.partials_dir.display(),
        config.templates_dir.display()
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let filter_roots = roots.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for path in relevant_paths(&event, &filter_roots) {
                let _ = tx.send(path);
            }
        }
        Err(e) => tracing::warn!("Watch error: {}", e),
    })
    .map_err(|e| Error::WatchFailed {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    for path in &roots {
        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| Error::WatchFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
    }

    let pipeline = BuildPipeline::new(root);
    rebuild(pipeline.clone()).await;

    let rebuilds = run_debounced(rx, quiet, shutdown, || rebuild(pipeline.clone())).await;

    drop(watcher);
    tracing::info!("Watcher stopped after {} rebuild(s)", rebuilds);
    Ok(())
}

async fn rebuild(pipeline: BuildPipeline) {
    match tokio::task::spawn_blocking(move || pipeline.build()).await {
        Ok(Ok(summary)) => tracing::info!(
            written = summary.written.len(),
            skipped = summary.skipped.len(),
            "Rebuild complete"
        ),
        Ok(Err(e)) => tracing::error!("Build failed: {}", e),
        Err(e) => tracing::error!("Build task panicked: {}", e),
    }
}

/// Paths from a create/modify/remove event that are not hidden below a watched root.
fn relevant_paths(event: &Event, roots: &[PathBuf]) -> Vec<PathBuf> {
    let relevant_kind = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    if !relevant_kind {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| !is_hidden(path, roots))
        .cloned()
        .collect()
}

fn is_hidden(path: &Path, roots: &[PathBuf]) -> bool {
    let relative = roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);
    relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM. The SIGTERM handler is installed
/// before returning so a signal during the first build is not fatal.
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|e| Error::WatchFailed {
            path: PathBuf::from("SIGTERM"),
            reason: e.to_string(),
        })?;

    Ok(async move {
        #[cfg(unix)]
        let terminate = terminate.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted, stopping watcher"),
            _ = terminate => tracing::info!("Terminated, stopping watcher"),
        }
    })
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    use super::*;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn keeps_create_modify_remove() {
        let roots = vec![PathBuf::from("/p/partials")];
        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            EventKind::Remove(RemoveKind::File),
        ] {
            assert_eq!(
                relevant_paths(&event(kind, "/p/partials/intro.md"), &roots),
                vec![PathBuf::from("/p/partials/intro.md")]
            );
        }
    }

    #[test]
    fn ignores_access_and_metadata_events() {
        let roots = vec![PathBuf::from("/p/partials")];
        let access = event(
            EventKind::Access(notify::event::AccessKind::Any),
            "/p/partials/a.md",
        );
        let chmod = event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            "/p/partials/a.md",
        );
        assert!(relevant_paths(&access, &roots).is_empty());
        assert!(relevant_paths(&chmod, &roots).is_empty());
    }

    #[test]
    fn ignores_dotfiles_below_roots_only() {
        let roots = vec![PathBuf::from("/home/me/.config/proj/partials")];
        assert!(!is_hidden(
            Path::new("/home/me/.config/proj/partials/intro.md"),
            &roots
        ));
        assert!(is_hidden(
            Path::new("/home/me/.config/proj/partials/.intro.md.swp"),
            &roots
        ));
        assert!(is_hidden(
            Path::new("/home/me/.config/proj/partials/.git/HEAD"),
            &roots
        ));
    }
}
