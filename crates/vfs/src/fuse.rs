//! FUSE adapter.
//!
//! Translates kernel requests into node and session calls. Metadata
//! operations are answered inline. `open` and `read` touch the network, so
//! both are spawned onto the runtime and reply from the task; the dispatch
//! thread never waits on a remote call.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use dxfs_common::{ROOT_INODE, STAT_BLOCK_SIZE};
use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, MountOption, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, Request,
    TimeOrNow,
};
use libc::c_int;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::context::FsContext;
use crate::error::VfsError;
use crate::node::{AccessMode, DirEntry, DirectoryNode, Node, NodeAttr, NodeKind};
use crate::session::OpenFileSession;

/// Longest file name reported by `statfs`.
const NAME_MAX: u32 = 255;

/// Open sessions keyed by file handle.
///
/// Shared between the dispatch thread and the tasks that complete opens.
#[derive(Debug)]
struct SessionTable {
    sessions: RwLock<HashMap<u64, Arc<OpenFileSession>>>,
    next_handle: AtomicU64,
}

impl SessionTable {
    fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Register a session under a fresh handle.
    fn insert(&self, session: OpenFileSession) -> u64 {
        let fh: u64 = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fh, Arc::new(session));
        fh
    }

    fn get(&self, fh: u64) -> Option<Arc<OpenFileSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&fh)
            .cloned()
    }

    fn remove(&self, fh: u64) -> Option<Arc<OpenFileSession>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&fh)
    }

    fn drain(&self) -> Vec<Arc<OpenFileSession>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, session)| session)
            .collect()
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Read-only FUSE filesystem over a catalog of remote objects.
pub struct DxVfs {
    /// Shared filesystem state.
    ctx: Arc<FsContext>,
    /// Runtime that drives remote calls.
    runtime: Handle,
    /// Open sessions keyed by file handle.
    sessions: Arc<SessionTable>,
}

impl DxVfs {
    /// Create a filesystem bound to the current tokio runtime.
    ///
    /// # Arguments
    /// * `ctx` - Shared filesystem context
    ///
    /// # Errors
    /// Returns `VfsError::MountFailed` when called outside a runtime.
    pub fn new(ctx: Arc<FsContext>) -> Result<Self, VfsError> {
        let runtime: Handle = Handle::try_current()
            .map_err(|e| VfsError::MountFailed(format!("no tokio runtime: {}", e)))?;
        Ok(Self::with_runtime(ctx, runtime))
    }

    /// Create a filesystem bound to an explicit runtime.
    ///
    /// # Arguments
    /// * `ctx` - Shared filesystem context
    /// * `runtime` - Handle used for remote calls
    pub fn with_runtime(ctx: Arc<FsContext>, runtime: Handle) -> Self {
        Self {
            ctx,
            runtime,
            sessions: Arc::new(SessionTable::new()),
        }
    }

    /// Shared filesystem context.
    pub fn context(&self) -> &Arc<FsContext> {
        &self.ctx
    }

    /// Number of open sessions.
    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn mount_options(&self) -> Vec<MountOption> {
        let mount = &self.ctx.options().mount;
        let mut options: Vec<MountOption> = vec![
            MountOption::RO,
            MountOption::FSName(mount.fs_name.clone()),
        ];
        if mount.allow_other {
            options.push(MountOption::AllowOther);
        }
        if mount.auto_unmount {
            options.push(MountOption::AutoUnmount);
        }
        options
    }

    /// Reply ENOSYS to a mutating request.
    fn reject(&self, operation: &str) -> c_int {
        let err = VfsError::unsupported(operation);
        debug!("{}", err);
        err.errno()
    }
}

/// Open `ino` and register the resulting session.
///
/// # Returns
/// The new file handle and the open flags for the kernel.
async fn open_session(
    ctx: Arc<FsContext>,
    sessions: Arc<SessionTable>,
    ino: u64,
    flags: i32,
) -> Result<(u64, u32), VfsError> {
    let node: Node = ctx.node(ino)?;
    let session: OpenFileSession = node.open(AccessMode::from_flags(flags)).await?;
    let fh: u64 = sessions.insert(session);
    let open_flags: u32 = if ctx.options().kernel_cache.enable_page_cache {
        fuser::consts::FOPEN_KEEP_CACHE
    } else {
        0
    };
    Ok((fh, open_flags))
}

/// Directory entries from position `offset` onward, `.` and `..` first.
///
/// Each entry is paired with the offset the kernel passes back to resume
/// after it.
fn listing_from(dir: &DirectoryNode, offset: i64) -> Vec<(i64, DirEntry)> {
    let dots = [".", ".."].into_iter().map(|name| DirEntry {
        inode: ROOT_INODE,
        kind: NodeKind::Directory,
        name: name.to_string(),
    });
    dots.chain(dir.list())
        .enumerate()
        .skip(offset.max(0) as usize)
        .map(|(i, entry)| ((i + 1) as i64, entry))
        .collect()
}

/// Convert a node attribute record to the kernel's form.
fn to_file_attr(attr: &NodeAttr) -> FileAttr {
    FileAttr {
        ino: attr.ino,
        size: attr.size,
        blocks: attr.blocks,
        atime: attr.atime,
        mtime: attr.mtime,
        ctime: attr.ctime,
        crtime: attr.crtime,
        kind: to_file_type(attr.kind),
        perm: attr.perm,
        nlink: attr.nlink,
        uid: attr.uid,
        gid: attr.gid,
        rdev: 0,
        blksize: attr.blksize,
        flags: 0,
    }
}

fn to_file_type(kind: NodeKind) -> FileType {
    match kind {
        NodeKind::File => FileType::RegularFile,
        NodeKind::Directory => FileType::Directory,
    }
}

impl Filesystem for DxVfs {
    fn init(&mut self, _req: &Request<'_>, config: &mut KernelConfig) -> Result<(), c_int> {
        let read_ahead = &self.ctx.options().read_ahead;
        if let Err(limit) = config.set_max_readahead(read_ahead.max_readahead) {
            warn!(
                "Kernel limited max_readahead to {} bytes (desired {})",
                limit, read_ahead.max_readahead
            );
            let _ = config.set_max_readahead(limit);
        }
        if read_ahead.async_read {
            config.add_capabilities(fuser::consts::FUSE_ASYNC_READ).ok();
        }
        info!(
            files = self.ctx.catalog().len(),
            bytes = self.ctx.catalog().total_size(),
            "dxfs initialized"
        );
        Ok(())
    }

    fn destroy(&mut self) {
        let sessions: Vec<Arc<OpenFileSession>> = self.sessions.drain();
        for session in &sessions {
            session.release();
        }
        info!(released = sessions.len(), "dxfs destroyed");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name_str: &str = match name.to_str() {
            Some(n) => n,
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };

        debug!("lookup parent={} name={}", parent, name_str);
        let result: Result<NodeAttr, VfsError> = self
            .ctx
            .node(parent)
            .and_then(|dir| dir.lookup(name_str))
            .and_then(|node| node.attributes());

        match result {
            Ok(attr) => {
                let ttl = self.ctx.options().kernel_cache.entry_ttl();
                reply.entry(&ttl, &to_file_attr(&attr), 0);
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        match self.ctx.node(ino).and_then(|node| node.attributes()) {
            Ok(attr) => reply.attr(&attr.ttl, &to_file_attr(&attr)),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let dir = match self.ctx.node(ino) {
            Ok(Node::Directory(dir)) => dir,
            Ok(Node::File(_)) => {
                reply.error(libc::ENOTDIR);
                return;
            }
            Err(e) => {
                reply.error(e.errno());
                return;
            }
        };

        for (next, entry) in listing_from(&dir, offset) {
            if reply.add(entry.inode, next, to_file_type(entry.kind), &entry.name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let ctx: Arc<FsContext> = self.ctx.clone();
        let sessions: Arc<SessionTable> = self.sessions.clone();

        self.runtime.spawn(async move {
            match open_session(ctx, sessions, ino, flags).await {
                Ok((fh, open_flags)) => reply.opened(fh, open_flags),
                Err(e) => {
                    if e.is_remote() {
                        error!("open of inode {} failed: {}", ino, e);
                    } else {
                        debug!("open of inode {} rejected: {}", ino, e);
                    }
                    reply.error(e.errno());
                }
            }
        });
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        let session: Arc<OpenFileSession> = match self.sessions.get(fh) {
            Some(s) => s,
            None => {
                reply.error(libc::EBADF);
                return;
            }
        };

        self.runtime.spawn(async move {
            match session.read(offset as u64, size).await {
                Ok(data) => reply.data(&data),
                Err(e) => {
                    error!(
                        "read of {} (inode {}) at {} failed: {}",
                        session.file().name(),
                        ino,
                        offset,
                        e
                    );
                    reply.error(e.errno());
                }
            }
        });
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        if let Some(session) = self.sessions.remove(fh) {
            session.release();
        } else {
            debug!("release of unknown handle {}", fh);
        }
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        let catalog = self.ctx.catalog();
        let blocks: u64 = catalog.total_size().div_ceil(STAT_BLOCK_SIZE);
        let files: u64 = catalog.len() as u64 + 1;
        reply.statfs(
            blocks,
            0,
            0,
            files,
            0,
            STAT_BLOCK_SIZE as u32,
            NAME_MAX,
            STAT_BLOCK_SIZE as u32,
        );
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _offset: i64,
        _data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        reply.error(self.reject(&format!("write to inode {}", ino)));
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        reply.error(self.reject(&format!("setattr on inode {}", ino)));
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        reply.error(self.reject(&format!("create {}", name.to_string_lossy())));
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        reply.error(self.reject(&format!("mkdir {}", name.to_string_lossy())));
    }

    fn unlink(&mut self, _req: &Request<'_>, _parent: u64, name: &OsStr, reply: ReplyEmpty) {
        reply.error(self.reject(&format!("unlink {}", name.to_string_lossy())));
    }
}

/// Mount the filesystem and block until it is unmounted.
///
/// # Arguments
/// * `vfs` - The filesystem to mount
/// * `mountpoint` - Path to mount at
pub fn mount(vfs: DxVfs, mountpoint: &Path) -> Result<(), VfsError> {
    let options: Vec<MountOption> = vfs.mount_options();
    info!("Mounting dxfs at {}", mountpoint.display());
    fuser::mount2(vfs, mountpoint, &options).map_err(|e| VfsError::MountFailed(e.to_string()))
}

/// Mount the filesystem in the background.
///
/// # Arguments
/// * `vfs` - The filesystem to mount
/// * `mountpoint` - Path to mount at
///
/// # Returns
/// Background session handle; dropping it unmounts.
pub fn spawn_mount(
    vfs: DxVfs,
    mountpoint: &Path,
) -> Result<fuser::BackgroundSession, VfsError> {
    let options: Vec<MountOption> = vfs.mount_options();
    info!("Mounting dxfs at {} (background)", mountpoint.display());
    fuser::spawn_mount2(vfs, mountpoint, &options)
        .map_err(|e| VfsError::MountFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, UNIX_EPOCH};

    use async_trait::async_trait;
    use dxfs_api::{ApiClient, ApiError};
    use dxfs_common::BASE_FILE_INODE;

    use super::*;
    use crate::catalog::{Catalog, ObjectMeta};
    use crate::options::{KernelCacheOptions, VfsOptions};

    /// Client that hands out a fixed locator and counts locator requests.
    #[derive(Default)]
    struct StaticLocators {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ApiClient for StaticLocators {
        async fn call_api(
            &self,
            route: &str,
            _payload: &serde_json::Value,
        ) -> Result<Vec<u8>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = serde_json::json!({
                "url": format!("https://dl.test/{}", route.trim_end_matches("/download")),
                "headers": {},
            });
            Ok(serde_json::to_vec(&body).unwrap())
        }

        async fn http_get(
            &self,
            url: &str,
            _headers: &HashMap<String, String>,
        ) -> Result<Vec<u8>, ApiError> {
            Err(ApiError::Status {
                url: url.to_string(),
                status: 404,
                message: "not served".into(),
            })
        }
    }

    fn test_context(options: VfsOptions) -> (Arc<FsContext>, Arc<StaticLocators>) {
        let client = Arc::new(StaticLocators::default());
        let catalog = Catalog::build(vec![
            (
                "c.txt".to_string(),
                ObjectMeta::new("file-c", "project-1", 30, 1_000),
            ),
            (
                "a.txt".to_string(),
                ObjectMeta::new("file-a", "project-1", 10, 1_000),
            ),
            (
                "b.txt".to_string(),
                ObjectMeta::new("file-b", "project-1", 20, 1_000),
            ),
        ]);
        let ctx = FsContext::new(Arc::new(catalog), client.clone(), options);
        (Arc::new(ctx), client)
    }

    fn names(listing: &[(i64, DirEntry)]) -> Vec<&str> {
        listing.iter().map(|(_, e)| e.name.as_str()).collect()
    }

    fn assert_spawnable<F: Future + Send + 'static>(_: &F) {}

    #[test]
    fn test_to_file_attr() {
        let t = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let attr = NodeAttr {
            ino: 12,
            size: 1000,
            blocks: 2,
            atime: t,
            mtime: t,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind: NodeKind::File,
            perm: 0o400,
            nlink: 1,
            uid: 1000,
            gid: 100,
            blksize: 512,
            ttl: Duration::from_secs(1),
        };

        let fattr = to_file_attr(&attr);
        assert_eq!(fattr.ino, 12);
        assert_eq!(fattr.size, 1000);
        assert_eq!(fattr.kind, FileType::RegularFile);
        assert_eq!(fattr.perm, 0o400);
        assert_eq!(fattr.mtime, t);
        assert_eq!(fattr.crtime, UNIX_EPOCH);
        assert_eq!(fattr.uid, 1000);
        assert_eq!(fattr.gid, 100);
    }

    #[test]
    fn test_to_file_type() {
        assert_eq!(to_file_type(NodeKind::File), FileType::RegularFile);
        assert_eq!(to_file_type(NodeKind::Directory), FileType::Directory);
    }

    #[test]
    fn test_listing_from_start() {
        let (ctx, _) = test_context(VfsOptions::default());
        let listing = listing_from(&ctx.root(), 0);

        assert_eq!(names(&listing), vec![".", "..", "a.txt", "b.txt", "c.txt"]);
        let cookies: Vec<i64> = listing.iter().map(|(next, _)| *next).collect();
        assert_eq!(cookies, vec![1, 2, 3, 4, 5]);
        assert_eq!(listing[0].1.inode, ROOT_INODE);
        assert_eq!(listing[1].1.kind, NodeKind::Directory);
        // Inodes follow catalog input order, not name order.
        assert_eq!(listing[4].1.inode, BASE_FILE_INODE);
        assert_eq!(listing[2].1.kind, NodeKind::File);
    }

    #[test]
    fn test_listing_from_offsets() {
        let (ctx, _) = test_context(VfsOptions::default());
        let root = ctx.root();

        assert_eq!(names(&listing_from(&root, 1))[0], "..");
        assert_eq!(names(&listing_from(&root, 2))[0], "a.txt");
        assert_eq!(listing_from(&root, 2)[0].0, 3);
        assert!(listing_from(&root, 5).is_empty());
        assert!(listing_from(&root, 100).is_empty());
        assert_eq!(listing_from(&root, -3), listing_from(&root, 0));
    }

    #[test]
    fn test_listing_resumes_after_partial_reply() {
        let (ctx, _) = test_context(VfsOptions::default());
        let root = ctx.root();
        let full = listing_from(&root, 0);

        // The kernel buffer filled after three entries.
        let first: Vec<(i64, DirEntry)> = full.iter().take(3).cloned().collect();
        let resume_at: i64 = first[2].0;
        let rest = listing_from(&root, resume_at);

        let mut joined = first;
        joined.extend(rest);
        assert_eq!(joined, full);
    }

    #[tokio::test]
    async fn test_open_session_registers_handles() {
        let (ctx, client) = test_context(VfsOptions::default());
        let sessions = Arc::new(SessionTable::new());

        let first = open_session(ctx.clone(), sessions.clone(), BASE_FILE_INODE, libc::O_RDONLY);
        assert_spawnable(&first);
        let (fh1, flags1) = first.await.unwrap();
        let (fh2, _) = open_session(ctx.clone(), sessions.clone(), BASE_FILE_INODE, libc::O_RDONLY)
            .await
            .unwrap();

        assert_eq!((fh1, fh2), (1, 2));
        assert_eq!(flags1, fuser::consts::FOPEN_KEEP_CACHE);
        assert_eq!(sessions.len(), 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sessions.get(fh1).unwrap().file().name(), "c.txt");
    }

    #[tokio::test]
    async fn test_open_session_without_page_cache() {
        let options = VfsOptions::default().with_kernel_cache(KernelCacheOptions::no_cache());
        let (ctx, _) = test_context(options);
        let sessions = Arc::new(SessionTable::new());

        let (_, flags) = open_session(ctx, sessions, BASE_FILE_INODE + 1, libc::O_RDONLY)
            .await
            .unwrap();
        assert_eq!(flags, 0);
    }

    #[tokio::test]
    async fn test_open_session_errors_leave_table_empty() {
        let (ctx, client) = test_context(VfsOptions::default());
        let sessions = Arc::new(SessionTable::new());

        let denied = open_session(ctx.clone(), sessions.clone(), BASE_FILE_INODE, libc::O_WRONLY)
            .await
            .unwrap_err();
        assert_eq!(denied.errno(), libc::EACCES);

        let dir = open_session(ctx.clone(), sessions.clone(), ROOT_INODE, libc::O_RDONLY)
            .await
            .unwrap_err();
        assert_eq!(dir.errno(), libc::ENOSYS);

        let missing = open_session(ctx, sessions.clone(), 999, libc::O_RDONLY)
            .await
            .unwrap_err();
        assert_eq!(missing.errno(), libc::ENOENT);

        assert_eq!(sessions.len(), 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_table_remove_and_drain() {
        let (ctx, _) = test_context(VfsOptions::default());
        let sessions = Arc::new(SessionTable::new());
        for _ in 0..3 {
            open_session(ctx.clone(), sessions.clone(), BASE_FILE_INODE, libc::O_RDONLY)
                .await
                .unwrap();
        }

        assert!(sessions.remove(2).is_some());
        assert!(sessions.remove(2).is_none());
        assert!(sessions.get(2).is_none());

        let drained = sessions.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(sessions.len(), 0);
    }
}
