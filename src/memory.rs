use crate::storage::{DirectoryHandle, FileHandle, StorageError};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory storage root. Clones share the same tree, the same way cloned
/// directory handles address the same directory.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    children: Arc<Mutex<BTreeMap<String, Entry>>>,
}

#[derive(Clone, Debug)]
pub struct MemoryFile {
    contents: Arc<Mutex<Vec<u8>>>,
}

#[derive(Clone)]
enum Entry {
    Directory(MemoryDirectory),
    File(MemoryFile),
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|_| StorageError::Io(io::Error::new(io::ErrorKind::Other, "storage state poisoned")))
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectoryHandle for MemoryDirectory {
    type File = MemoryFile;

    async fn directory(&self, name: &str, create: bool) -> Result<Option<Self>, StorageError> {
        let mut children = lock(&self.children)?;
        match children.get(name) {
            Some(Entry::Directory(dir)) => Ok(Some(dir.clone())),
            Some(Entry::File(_)) => Err(StorageError::TypeMismatch {
                name: name.to_string(),
            }),
            None if create => {
                let dir = MemoryDirectory::new();
                children.insert(name.to_string(), Entry::Directory(dir.clone()));
                Ok(Some(dir))
            }
            None => Ok(None),
        }
    }

    async fn file(&self, name: &str, create: bool) -> Result<Option<Self::File>, StorageError> {
        let mut children = lock(&self.children)?;
        match children.get(name) {
            Some(Entry::File(file)) => Ok(Some(file.clone())),
            Some(Entry::Directory(_)) => Err(StorageError::TypeMismatch {
                name: name.to_string(),
            }),
            None if create => {
                let file = MemoryFile {
                    contents: Arc::new(Mutex::new(Vec::new())),
                };
                children.insert(name.to_string(), Entry::File(file.clone()));
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    async fn entries(&self) -> Result<Vec<String>, StorageError> {
        Ok(lock(&self.children)?.keys().cloned().collect())
    }

    async fn remove(&self, name: &str) -> Result<(), StorageError> {
        let mut children = lock(&self.children)?;
        match children.get(name) {
            Some(Entry::Directory(dir)) => {
                if !lock(&dir.children)?.is_empty() {
                    return Err(StorageError::Io(io::Error::new(
                        io::ErrorKind::Other,
                        "directory not empty",
                    )));
                }
            }
            Some(Entry::File(_)) => {}
            None => {
                return Err(StorageError::NotFound {
                    name: name.to_string(),
                })
            }
        }
        children.remove(name);
        Ok(())
    }
}

impl FileHandle for MemoryFile {
    async fn read_text(&self) -> Result<String, StorageError> {
        let contents = lock(&self.contents)?;
        String::from_utf8(contents.clone())
            .map_err(|e| StorageError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        // Swapped in whole, so a reader never observes a partial write.
        *lock(&self.contents)? = bytes.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_address_the_same_tree() {
        let root = MemoryDirectory::new();
        let other = root.clone();
        root.directory("boards", true).await.unwrap();
        assert_eq!(other.entries().await.unwrap(), vec!["boards".to_string()]);
    }

    #[tokio::test]
    async fn create_false_does_not_materialize() {
        let root = MemoryDirectory::new();
        assert!(root.directory("boards", false).await.unwrap().is_none());
        assert!(root.file("a.json", false).await.unwrap().is_none());
        assert!(root.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn created_file_starts_empty() {
        let root = MemoryDirectory::new();
        let file = root.file("a.json", true).await.unwrap().unwrap();
        assert_eq!(file.read_text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn remove_refuses_non_empty_directory() {
        let root = MemoryDirectory::new();
        let boards = root.directory("boards", true).await.unwrap().unwrap();
        boards.file("a.peridot", true).await.unwrap();
        assert!(root.remove("boards").await.is_err());

        boards.remove("a.peridot").await.unwrap();
        root.remove("boards").await.unwrap();
        assert!(root.entries().await.unwrap().is_empty());
    }
}
