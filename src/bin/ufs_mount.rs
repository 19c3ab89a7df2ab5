//! `ufs-mount` — mount a serialized store at a host directory.
//!
//! Per §6, the CLI surface is deliberately two flags: the target mount
//! directory and a readonly switch. Everything else — which store, which
//! backend — travels out of band through the `UFS_DESCRIPTOR` environment
//! variable (§6's "environment channels for spawn targets"), so a spawning
//! process never needs to know this binary's argument grammar, only how to
//! set an env var and a directory.
//!
//! Mount strategy is auto-selected from the store's [`AccessScope`]
//! (§4.10): `System` or higher gets a real FUSE mount; anything lower falls
//! back to the copy-in/diff-out mirror of §4.11, rooted directly at the
//! given directory instead of a throwaway temp one.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use ufs::backends::LocalUfs;
use ufs::descriptor::{self, StoreDescriptor};
use ufs::ops;
use ufs::{AccessScope, Ufs, UfsPath};

/// Mount a UFS store at a host directory.
#[derive(Parser, Debug)]
#[command(name = "ufs-mount", version)]
struct Args {
    /// Host directory to mount at.
    mount_dir: PathBuf,

    /// Reject every write-shaped operation.
    #[arg(long)]
    readonly: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let raw = std::env::var(ufs::exec::process::UFS_DESCRIPTOR)
        .map_err(|_| format!("{} must name a serialized StoreDescriptor", ufs::exec::process::UFS_DESCRIPTOR))?;
    let descriptor: StoreDescriptor = serde_json::from_str(&raw)?;
    let store = descriptor::from_descriptor(&descriptor)?;
    store.start()?;

    let scope = store.scope();
    tracing::info!(?scope, mount_dir = %args.mount_dir.display(), readonly = args.readonly, "mounting");

    if scope >= AccessScope::System {
        mount_via_fuse(store, &args.mount_dir, args.readonly)?;
    } else {
        mount_via_fallback(store, &args.mount_dir, args.readonly)?;
    }
    Ok(())
}

#[cfg(feature = "fuse-mount")]
fn mount_via_fuse(store: std::sync::Arc<dyn Ufs>, mount_dir: &std::path::Path, readonly: bool) -> Result<(), Box<dyn std::error::Error>> {
    use ufs::mount::fuse::FuseFs;

    let fs = FuseFs::with_readonly(store, readonly);
    let mut options = vec![fuser::MountOption::FSName("ufs".to_string())];
    if readonly {
        options.push(fuser::MountOption::AllowRoot);
    }
    let mut session = fuser::Session::new(fs, mount_dir, &options)?;
    session.run_with_notifications()?;
    Ok(())
}

#[cfg(not(feature = "fuse-mount"))]
fn mount_via_fuse(store: std::sync::Arc<dyn Ufs>, mount_dir: &std::path::Path, readonly: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::warn!("built without fuse-mount; falling back to the mirror strategy");
    mount_via_fallback(store, mount_dir, readonly)
}

/// Copy the store's tree directly into `mount_dir`, let the caller drive
/// it with ordinary OS tools until Ctrl-C, then diff back — the same
/// discipline as [`ufs::mount::fallback::FallbackMount`], but rooted at a
/// caller-named directory instead of an auto-cleaned temp one, since a CLI
/// user expects the mount point they named to persist after the process
/// that served it exits.
fn mount_via_fallback(store: std::sync::Arc<dyn Ufs>, mount_dir: &std::path::Path, readonly: bool) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(mount_dir)?;
    let scratch = LocalUfs::new(mount_dir);
    let root = UfsPath::root();

    if store.info(&root).is_ok() {
        ops::copytree(&*store, &root, &scratch, &root, true)?;
    }
    let baseline: std::collections::BTreeSet<_> = ops::walk(&scratch, &root, true)?.into_iter().map(|e| e.path).collect();

    tracing::info!("mirrored at {}; press Ctrl-C to sync back and exit", mount_dir.display());
    wait_for_ctrlc()?;

    if !readonly {
        let now: Vec<_> = ops::walk(&scratch, &root, false)?;
        let now_paths: std::collections::BTreeSet<_> = now.iter().map(|e| e.path.clone()).collect();
        for removed in baseline.difference(&now_paths) {
            match store.info(removed) {
                Ok(info) if info.is_dir() => {
                    let _ = store.rmdir(removed);
                }
                Ok(_) => {
                    let _ = store.unlink(removed);
                }
                Err(_) => {}
            }
        }
        for entry in ops::walk(&scratch, &root, true)? {
            if entry.info.is_dir() {
                match store.mkdir(&entry.path) {
                    Ok(()) | Err(ufs::FsError::AlreadyExists { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
            } else {
                ops::copyfile(&scratch, &entry.path, &*store, &entry.path)?;
            }
        }
    }
    store.stop()?;
    Ok(())
}

/// Block the calling thread until `SIGINT` arrives.
fn wait_for_ctrlc() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    rx.recv()?;
    Ok(())
}
