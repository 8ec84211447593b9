use std::collections::HashMap;
use crate::models::{
    FileId, FileStatus, MediaMetadata, QueuedFile, QueuedFileView, SourceFile, SqueezeError,
};

/// Ordered queue of files plus a metadata side table keyed by id
///
/// Insertion order is processing order. Metadata lives apart from the ordered
/// list so removing or inserting files never disturbs other entries.
#[derive(Debug, Default)]
pub struct FileQueue {
    files: Vec<QueuedFile>,
    metadata: HashMap<FileId, MediaMetadata>,
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file as `Pending` and return its id
    pub fn push(&mut self, source: SourceFile) -> FileId {
        let file = QueuedFile::new(source);
        let id = file.id().clone();
        self.files.push(file);
        id
    }

    pub fn files(&self) -> &[QueuedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, id: &FileId) -> Option<&QueuedFile> {
        self.files.iter().find(|f| f.id() == id)
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of all `Pending` files, in queue order
    pub fn pending_ids(&self) -> Vec<FileId> {
        self.files
            .iter()
            .filter(|f| f.is_pending())
            .map(|f| f.id().clone())
            .collect()
    }

    pub fn completed(&self) -> impl Iterator<Item = &QueuedFile> {
        self.files.iter().filter(|f| f.result().is_some())
    }

    /// Replace a file's status; false if the id is no longer queued
    pub(crate) fn set_status(&mut self, id: &FileId, status: FileStatus) -> bool {
        match self.files.iter_mut().find(|f| f.id() == id) {
            Some(file) => {
                file.set_status(status);
                true
            }
            None => false,
        }
    }

    /// Remove exactly one file and its metadata
    ///
    /// A file in `Processing` is refused; its transform is still in flight.
    pub fn remove(&mut self, id: &FileId) -> Result<QueuedFile, SqueezeError> {
        let index = self
            .files
            .iter()
            .position(|f| f.id() == id)
            .ok_or_else(|| SqueezeError::FileNotFound(id.to_string()))?;

        if matches!(self.files[index].status(), FileStatus::Processing) {
            return Err(SqueezeError::FileBusy(self.files[index].source().name().to_string()));
        }

        self.metadata.remove(id);
        Ok(self.files.remove(index))
    }

    /// Drop every file and all metadata; returns how many files were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.files.len();
        self.files.clear();
        self.metadata.clear();
        removed
    }

    pub fn metadata(&self, id: &FileId) -> Option<&MediaMetadata> {
        self.metadata.get(id)
    }

    /// Record probe results; ignored when the file has left the queue
    pub fn set_metadata(&mut self, id: FileId, metadata: MediaMetadata) -> bool {
        if !self.contains(&id) {
            return false;
        }
        self.metadata.insert(id, metadata);
        true
    }

    /// Serializable view of every entry, in order
    pub fn snapshot(&self) -> Vec<QueuedFileView> {
        self.files
            .iter()
            .map(|f| QueuedFileView::new(f, self.metadata.get(f.id())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompressedOutput, ImageMetadata};

    fn source(name: &str, size: usize) -> SourceFile {
        SourceFile::from_bytes(name, "image/png", vec![0; size])
    }

    fn image_meta(width: u32) -> MediaMetadata {
        MediaMetadata::Image(ImageMetadata { width, height: 1 })
    }

    #[test]
    fn test_push_keeps_order_and_pending() {
        let mut queue = FileQueue::new();
        let a = queue.push(source("a.png", 1));
        let b = queue.push(source("b.png", 2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.files()[0].id(), &a);
        assert_eq!(queue.files()[1].id(), &b);
        assert_eq!(queue.pending_ids(), vec![a, b]);
    }

    #[test]
    fn test_remove_exactly_one_with_metadata() {
        let mut queue = FileQueue::new();
        let a = queue.push(source("a.png", 1));
        let b = queue.push(source("b.png", 1));
        let c = queue.push(source("c.png", 1));
        for (id, w) in [(&a, 1), (&b, 2), (&c, 3)] {
            assert!(queue.set_metadata(id.clone(), image_meta(w)));
        }

        let removed = queue.remove(&b).unwrap();
        assert_eq!(removed.id(), &b);

        let ids: Vec<_> = queue.files().iter().map(|f| f.id().clone()).collect();
        assert_eq!(ids, vec![a.clone(), c.clone()]);
        assert!(queue.metadata(&b).is_none());
        assert_eq!(queue.metadata(&a), Some(&image_meta(1)));
        assert_eq!(queue.metadata(&c), Some(&image_meta(3)));
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut queue = FileQueue::new();
        queue.push(source("a.png", 1));
        let result = queue.remove(&FileId::from("missing"));
        assert!(matches!(result, Err(SqueezeError::FileNotFound(_))));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_remove_processing_file_refused() {
        let mut queue = FileQueue::new();
        let a = queue.push(source("a.png", 1));
        queue.set_status(&a, FileStatus::Processing);

        assert!(matches!(queue.remove(&a), Err(SqueezeError::FileBusy(_))));
        assert!(queue.contains(&a));
    }

    #[test]
    fn test_metadata_for_removed_file_dropped() {
        let mut queue = FileQueue::new();
        let a = queue.push(source("a.png", 1));
        queue.remove(&a).unwrap();
        assert!(!queue.set_metadata(a.clone(), image_meta(5)));
        assert!(queue.metadata(&a).is_none());
    }

    #[test]
    fn test_clear() {
        let mut queue = FileQueue::new();
        let a = queue.push(source("a.png", 1));
        queue.push(source("b.png", 1));
        queue.set_metadata(a.clone(), image_meta(1));

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(queue.metadata(&a).is_none());
    }

    #[test]
    fn test_snapshot_and_completed() {
        let mut queue = FileQueue::new();
        let a = queue.push(source("a.png", 10));
        let b = queue.push(source("b.png", 10));
        queue.set_status(&a, FileStatus::Completed(CompressedOutput::new(
            vec![0; 4],
            "image/jpeg",
            "a_optimized.jpg".to_string(),
        )));
        queue.set_status(&b, FileStatus::Error("bad".to_string()));

        assert_eq!(queue.completed().count(), 1);
        let view = queue.snapshot();
        assert_eq!(view[0].status, "completed");
        assert_eq!(view[0].compressed_size, Some(4));
        assert_eq!(view[1].status, "error");
        assert_eq!(view[1].error.as_deref(), Some("bad"));
        assert!(queue.pending_ids().is_empty());
    }
}
