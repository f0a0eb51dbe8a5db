use crate::fs::FsDirectory;
use crate::store::BoardStore;

/// Shared server state: the board store over the filesystem-backed root. The
/// root handle is acquired once at startup and shared by cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub store: BoardStore<FsDirectory>,
}

impl AppState {
    pub fn new(root: FsDirectory) -> Self {
        AppState {
            store: BoardStore::new(root),
        }
    }
}
