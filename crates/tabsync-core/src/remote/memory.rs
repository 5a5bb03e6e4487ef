//! In-process drive with call accounting and fault injection.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{FileId, RemoteError, RemoteFileApi, RemoteResult};
use crate::auth::AuthError;
use crate::models::{RemoteDocument, REMOTE_FILE_NAME};

/// Number of calls made to each primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub find: usize,
    pub create: usize,
    pub write: usize,
    pub read: usize,
}

#[derive(Debug, Default)]
struct Faults {
    lookup: bool,
    create: bool,
    write: bool,
    read: bool,
    auth: bool,
}

#[derive(Debug)]
struct StoredFile {
    name: String,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemoryDrive {
    files: BTreeMap<FileId, StoredFile>,
    next_id: u64,
    calls: CallCounts,
    faults: Faults,
}

impl MemoryDrive {
    fn check_auth(&self) -> RemoteResult<()> {
        if self.faults.auth {
            return Err(AuthError::Denied("injected auth failure".to_string()).into());
        }
        Ok(())
    }
}

/// Cloneable handle to a shared in-memory drive.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileApi {
    drive: Arc<Mutex<MemoryDrive>>,
}

impl MemoryFileApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive seeded with an encoded sync document.
    pub fn with_document(document: &RemoteDocument) -> RemoteResult<Self> {
        let api = Self::new();
        api.insert_file(REMOTE_FILE_NAME, document.to_bytes()?);
        Ok(api)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryDrive> {
        self.drive.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a file directly, bypassing accounting and faults.
    pub fn insert_file(&self, name: &str, content: Vec<u8>) -> FileId {
        let mut drive = self.lock();
        drive.next_id += 1;
        let file_id = FileId(format!("mem-{}", drive.next_id));
        drive.files.insert(
            file_id.clone(),
            StoredFile {
                name: name.to_string(),
                content,
            },
        );
        file_id
    }

    /// Raw content of the first file named `name`.
    pub fn content_of(&self, name: &str) -> Option<Vec<u8>> {
        self.lock()
            .files
            .values()
            .find(|file| file.name == name)
            .map(|file| file.content.clone())
    }

    /// Decoded sync document, if present and readable.
    pub fn document(&self) -> Option<RemoteDocument> {
        let bytes = self.content_of(REMOTE_FILE_NAME)?;
        RemoteDocument::from_slice_lenient(&bytes).ok()
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn fail_lookup(&self, enabled: bool) {
        self.lock().faults.lookup = enabled;
    }

    pub fn fail_create(&self, enabled: bool) {
        self.lock().faults.create = enabled;
    }

    pub fn fail_write(&self, enabled: bool) {
        self.lock().faults.write = enabled;
    }

    pub fn fail_read(&self, enabled: bool) {
        self.lock().faults.read = enabled;
    }

    /// Make every primitive fail as if the credential was rejected.
    pub fn fail_auth(&self, enabled: bool) {
        self.lock().faults.auth = enabled;
    }
}

impl RemoteFileApi for MemoryFileApi {
    async fn find_file_by_name(&self, name: &str) -> RemoteResult<Option<FileId>> {
        let mut drive = self.lock();
        drive.calls.find += 1;
        drive.check_auth()?;
        if drive.faults.lookup {
            return Err(RemoteError::Api("injected lookup failure".to_string()));
        }
        Ok(drive
            .files
            .iter()
            .find(|(_, file)| file.name == name)
            .map(|(file_id, _)| file_id.clone()))
    }

    async fn create_file(&self, name: &str, _mime_type: &str) -> RemoteResult<FileId> {
        {
            let mut drive = self.lock();
            drive.calls.create += 1;
            drive.check_auth()?;
            if drive.faults.create {
                return Err(RemoteError::Api("injected create failure".to_string()));
            }
        }
        Ok(self.insert_file(name, Vec::new()))
    }

    async fn write_file_content(
        &self,
        file_id: &FileId,
        bytes: Vec<u8>,
        _mime_type: &str,
    ) -> RemoteResult<()> {
        let mut drive = self.lock();
        drive.calls.write += 1;
        drive.check_auth()?;
        if drive.faults.write {
            return Err(RemoteError::Api("injected write failure".to_string()));
        }
        let file = drive
            .files
            .get_mut(file_id)
            .ok_or_else(|| RemoteError::NotFound(file_id.to_string()))?;
        file.content = bytes;
        Ok(())
    }

    async fn read_file_content(&self, file_id: &FileId) -> RemoteResult<Vec<u8>> {
        let mut drive = self.lock();
        drive.calls.read += 1;
        drive.check_auth()?;
        if drive.faults.read {
            return Err(RemoteError::Api("injected read failure".to_string()));
        }
        drive
            .files
            .get(file_id)
            .map(|file| file.content.clone())
            .ok_or_else(|| RemoteError::NotFound(file_id.to_string()))
    }
}
