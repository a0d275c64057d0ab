//! Document content streams

use super::Repository;
use crate::error::ApiError;
use crate::types::{CallContext, ObjectId};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Take};

/// Byte range of a document, read lazily from disk.
pub struct ContentStream {
    pub file_name: String,
    pub mime_type: String,
    /// First byte of the range within the document.
    pub offset: u64,
    /// Bytes in the range.
    pub length: u64,
    /// Total document size.
    pub total_length: u64,
    /// The range covers less than the whole document.
    pub partial: bool,
    reader: Take<BufReader<File>>,
}

impl ContentStream {
    pub fn read_to_vec(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.length as usize);
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("total_length", &self.total_length)
            .field("partial", &self.partial)
            .finish()
    }
}

impl Repository {
    /// Open the content of a document. `offset` and `length` select a byte
    /// range; a range running past the end is cut at the end.
    pub fn get_content_stream(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<ContentStream, ApiError> {
        self.users.check_user(ctx, false)?;
        let node = self.hierarchy.visible_node(id)?;
        if !node.is_document() {
            return Err(ApiError::InvalidArgument(format!(
                "Only documents have content: {}",
                id
            )));
        }
        if node.size == 0 {
            return Err(ApiError::Constraint(format!(
                "Document has no content: {}",
                node.repo_path
            )));
        }
        let offset = offset.unwrap_or(0);
        if offset >= node.size {
            return Err(ApiError::InvalidArgument(format!(
                "Offset {} is past the end of {} ({} bytes)",
                offset, node.repo_path, node.size
            )));
        }
        let available = node.size - offset;
        let length = length.map_or(available, |l| l.min(available));

        let file = File::open(&node.path).map_err(|e| ApiError::from_node_io(e, &node.repo_path))?;
        let mut reader = BufReader::new(file);
        if offset > 0 {
            reader.seek(SeekFrom::Start(offset)).map_err(ApiError::io)?;
        }
        Ok(ContentStream {
            mime_type: self.hierarchy.projector().mime().sniff(&node.path),
            file_name: node.name,
            offset,
            length,
            total_length: node.size,
            partial: offset > 0 || length < node.size,
            reader: reader.take(length),
        })
    }
}
