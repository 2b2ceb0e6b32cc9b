// src/scan/entry.rs
// =============================================================================
// RawEntry: one member of the decompressed archive.
//
// The payload is NOT read up front. The scanner first looks at the path and
// the header size, and only pulls bytes for entries that pass the size and
// pattern checks. Entries rejected earlier (or skipped after the file budget
// runs out) are never read.
//
// Rust concepts:
// - Box<dyn Read + 'a>: a payload read only if needed
// - Lifetimes: entries borrow the archive they come from
// - impl Iterator: return an iterator without naming its type
// =============================================================================

use flate2::read::GzDecoder;
use std::io::{self, Read};
use tar::{Archive, EntryType};

pub struct RawEntry<'a> {
    /// Archive-relative path, still including the root wrapper.
    pub path: String,
    pub is_directory: bool,
    /// Size announced by the archive header.
    pub raw_size: u64,
    payload: Box<dyn Read + 'a>,
}

impl<'a> RawEntry<'a> {
    pub fn new(
        path: impl Into<String>,
        is_directory: bool,
        raw_size: u64,
        payload: impl Read + 'a,
    ) -> Self {
        Self {
            path: path.into(),
            is_directory,
            raw_size,
            payload: Box::new(payload),
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(path, true, 0, io::empty())
    }

    /// Reads at most `limit` bytes from the start of the payload.
    pub fn read_head(&mut self, limit: usize) -> io::Result<Vec<u8>> {
        let mut head = Vec::with_capacity(limit.min(self.raw_size as usize));
        (&mut self.payload).take(limit as u64).read_to_end(&mut head)?;
        Ok(head)
    }

    /// Appends the rest of the payload to `buf`.
    pub fn read_rest(&mut self, buf: &mut Vec<u8>) -> io::Result<()> {
        self.payload.read_to_end(buf)?;
        Ok(())
    }
}

// Opens a gzip-compressed tarball and yields its files and directories.
//
// Other member types (symlinks, hard links, pax/GNU metadata records) carry
// no file content and are skipped.
pub fn tar_gz_entries<'a, R: Read + 'a>(
    archive: &'a mut Archive<GzDecoder<R>>,
) -> io::Result<impl Iterator<Item = io::Result<RawEntry<'a>>> + 'a> {
    let entries = archive.entries()?;
    Ok(entries.filter_map(|entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let is_directory = match entry.header().entry_type() {
            EntryType::Directory => true,
            EntryType::Regular | EntryType::Continuous => false,
            _ => return None,
        };
        let path = match entry.path() {
            Ok(path) => path.to_string_lossy().replace('\\', "/"),
            Err(e) => return Some(Err(e)),
        };
        let raw_size = entry.size();
        Some(Ok(RawEntry::new(path, is_directory, raw_size, entry)))
    }))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    pub enum Member<'a> {
        Dir(&'a str),
        File(&'a str, &'a [u8]),
        Link(&'a str, &'a str),
    }

    /// Builds an in-memory .tar.gz from the given members, in order.
    pub fn tar_gz(members: &[Member<'_>]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for member in members {
            let mut header = tar::Header::new_gnu();
            match member {
                Member::Dir(path) => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    builder
                        .append_data(&mut header, path, std::io::empty())
                        .unwrap();
                }
                Member::File(path, body) => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_size(body.len() as u64);
                    header.set_mode(0o644);
                    builder.append_data(&mut header, path, *body).unwrap();
                }
                Member::Link(path, target) => {
                    header.set_entry_type(tar::EntryType::Symlink);
                    header.set_size(0);
                    builder.append_link(&mut header, path, target).unwrap();
                }
            }
        }
        builder.into_inner().unwrap().finish().unwrap()
    }
}
