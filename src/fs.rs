use crate::storage::{DirectoryHandle, FileHandle, StorageError};
use std::io;
use std::path::PathBuf;
use tokio::fs;

/// Directory handle backed by the real filesystem. The handle is just a path;
/// clones are cheap and address the same directory.
#[derive(Debug, Clone)]
pub struct FsDirectory {
    path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FsFile {
    path: PathBuf,
}

impl FsDirectory {
    /// Opens the data root, creating the directory if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        fs::create_dir_all(&path).await?;
        Ok(FsDirectory { path })
    }
}

/// Entry names must stay inside the handle's directory; the virtual-path layer
/// never produces separators, but `..` would escape the root.
fn check_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(StorageError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl DirectoryHandle for FsDirectory {
    type File = FsFile;

    async fn directory(&self, name: &str, create: bool) -> Result<Option<Self>, StorageError> {
        check_name(name)?;
        let path = self.path.join(name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(FsDirectory { path })),
            Ok(_) => Err(StorageError::TypeMismatch {
                name: name.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound && create => {
                match fs::create_dir(&path).await {
                    Ok(()) => {}
                    // Lost a create race to a concurrent call; the directory is there.
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(e.into()),
                }
                Ok(Some(FsDirectory { path }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn file(&self, name: &str, create: bool) -> Result<Option<Self::File>, StorageError> {
        check_name(name)?;
        let path = self.path.join(name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(FsFile { path })),
            Ok(_) => Err(StorageError::TypeMismatch {
                name: name.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound && create => {
                match fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .await
                {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(e.into()),
                }
                Ok(Some(FsFile { path }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Names are converted to UTF-8 lossily: an entry whose on-disk name is
    /// not valid UTF-8 comes back mangled and will not resolve by name.
    async fn entries(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.path).await?;
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn remove(&self, name: &str) -> Result<(), StorageError> {
        check_name(name)?;
        let path = self.path.join(name);
        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            // Fails on non-empty directories, which is the intended contract.
            fs::remove_dir(&path).await?;
        } else {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }
}

impl FileHandle for FsFile {
    async fn read_text(&self) -> Result<String, StorageError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        // Write to a sibling temp file and rename over the target, so the
        // previously committed content survives a failed write.
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(e) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
