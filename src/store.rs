use crate::models::{board_path, slug_from_name, Board};
use crate::storage::{self, DirectoryHandle, StorageError};
use thiserror::Error;

/// Top-level directory holding one JSON file per board.
pub const BOARDS_DIR: &str = "boards";

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Board not found: {slug}")]
    NotFound { slug: String },
    #[error("A board with slug '{slug}' already exists")]
    SlugTaken { slug: String },
    #[error("Cannot derive a slug from name '{name}'")]
    InvalidName { name: String },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Board operations over any storage root. Clones share the root handle.
#[derive(Clone)]
pub struct BoardStore<D: DirectoryHandle> {
    root: D,
}

impl<D: DirectoryHandle> BoardStore<D> {
    pub fn new(root: D) -> Self {
        BoardStore { root }
    }

    /// All stored boards. On a fresh root the `boards/` directory is created
    /// and the list is empty. Entries that fail to decode as a board are
    /// skipped, not fatal; enumeration order is the host's.
    pub async fn list_boards(&self) -> Result<Vec<Board>, BoardError> {
        let entries = match storage::list_entries(&self.root, BOARDS_DIR).await? {
            Some(entries) => entries,
            None => {
                storage::create_directory(&self.root, BOARDS_DIR).await?;
                return Ok(Vec::new());
            }
        };

        let mut boards = Vec::new();
        for name in entries {
            let path = format!("{}/{}", BOARDS_DIR, name);
            match storage::read_entry::<D, Board>(&self.root, &path).await {
                Ok(Some(board)) => boards.push(board),
                // Vanished between listing and read.
                Ok(None) => {}
                Err(StorageError::Json(e)) => {
                    eprintln!("Skipping '{}': not a board file ({})", name, e);
                }
                Err(StorageError::TypeMismatch { .. }) => {
                    eprintln!("Skipping '{}': not a board file", name);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(boards)
    }

    pub async fn get_board(&self, slug: &str) -> Result<Board, BoardError> {
        storage::read_entry(&self.root, &board_path(slug))
            .await?
            .ok_or_else(|| BoardError::NotFound {
                slug: slug.to_string(),
            })
    }

    /// Creates a board named `name`, deriving its slug from the name.
    pub async fn create_board(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Board, BoardError> {
        let slug = slug_from_name(name).ok_or_else(|| BoardError::InvalidName {
            name: name.to_string(),
        })?;
        let path = board_path(&slug);
        if storage::resolve_file(&self.root, &path, false).await?.is_some() {
            return Err(BoardError::SlugTaken { slug });
        }

        let board = Board::new(slug, name.to_string(), description);
        storage::write_entry(&self.root, &path, &board).await?;
        Ok(board)
    }

    /// Wholesale overwrite of the board's file; bumps `updatedAt`.
    pub async fn save_board(&self, mut board: Board) -> Result<Board, BoardError> {
        board.updated_at = chrono::Local::now().to_rfc3339();
        storage::write_entry(&self.root, &board.path(), &board).await?;
        Ok(board)
    }

    pub async fn delete_board(&self, slug: &str) -> Result<(), BoardError> {
        let path = board_path(slug);
        if storage::resolve_file(&self.root, &path, false).await?.is_none() {
            return Err(BoardError::NotFound {
                slug: slug.to_string(),
            });
        }
        match storage::delete_entry(&self.root, &path).await {
            Ok(()) => Ok(()),
            // Lost a race with another deleter.
            Err(StorageError::NotFound { .. }) => Err(BoardError::NotFound {
                slug: slug.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDirectory;

    fn store() -> BoardStore<MemoryDirectory> {
        BoardStore::new(MemoryDirectory::new())
    }

    #[tokio::test]
    async fn fresh_root_lists_empty_and_creates_boards_dir() {
        let store = store();
        assert!(store.list_boards().await.unwrap().is_empty());

        // The listing call itself created boards/, so it now enumerates empty.
        let names = storage::list_entries(&store.root, BOARDS_DIR)
            .await
            .unwrap()
            .unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn missing_board_error_names_the_slug() {
        let store = store();
        let err = store.get_board("missing").await.unwrap_err();
        assert!(matches!(err, BoardError::NotFound { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn created_board_round_trips() {
        let store = store();
        let board = store
            .create_board("Board A", Some("scratch".to_string()))
            .await
            .unwrap();
        assert_eq!(board.slug, "board-a");

        let got = store.get_board("board-a").await.unwrap();
        assert_eq!(got, board);
    }

    #[tokio::test]
    async fn duplicate_slug_is_refused() {
        let store = store();
        store.create_board("Board A", None).await.unwrap();
        let err = store.create_board("board a", None).await.unwrap_err();
        assert!(matches!(err, BoardError::SlugTaken { .. }));
    }

    #[tokio::test]
    async fn unusable_name_is_refused() {
        let store = store();
        let err = store.create_board("!!!", None).await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidName { .. }));
    }

    #[tokio::test]
    async fn save_bumps_updated_at_and_overwrites() {
        let store = store();
        let mut board = store.create_board("Board A", None).await.unwrap();
        board.name = "Board A (renamed)".to_string();
        let saved = store.save_board(board.clone()).await.unwrap();
        assert_eq!(saved.created_at, board.created_at);

        let got = store.get_board("board-a").await.unwrap();
        assert_eq!(got.name, "Board A (renamed)");
        assert_eq!(got.updated_at, saved.updated_at);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = store();
        store.create_board("Board A", None).await.unwrap();
        store.delete_board("board-a").await.unwrap();
        assert!(matches!(
            store.get_board("board-a").await,
            Err(BoardError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_board("board-a").await,
            Err(BoardError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn listing_skips_undecodable_entries() {
        let store = store();
        store.create_board("Board A", None).await.unwrap();
        storage::write_entry(&store.root, "boards/junk.peridot", &vec![1, 2, 3])
            .await
            .unwrap();
        storage::create_directory(&store.root, "boards/nested").await.unwrap();

        let boards = store.list_boards().await.unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].slug, "board-a");
    }
}
