//! Random-access decoding from any `Read + Seek` source.
//!
//! [`NtsmReader::new`] reads and validates the header, the GLB preamble and
//! the texture table. The GLB blob, emitters and texture blobs are only read
//! when asked for, so large assets can be inspected without loading them.

use std::io::{Read, Seek, SeekFrom};

use crate::container::{Container, DecodeOptions};
use crate::error::{FormatError, Result, Section};
use crate::format::{GLB_HEADER_SIZE, HEADER_SIZE};
use crate::header::NtsmHeader;
use crate::layout::Span;
use crate::particle::{self, ParticleEmitter};
use crate::texture::{Texture, TextureTableEntry, decode_table};
use crate::validate;

/// Seekable NTSM reader
#[derive(Debug)]
pub struct NtsmReader<R> {
    inner: R,
    header: NtsmHeader,
    file_len: u64,
    texture_entries: Vec<TextureTableEntry>,
}

impl<R: Read + Seek> NtsmReader<R> {
    pub fn new(inner: R) -> Result<Self> {
        Self::with_options(inner, DecodeOptions::default())
    }

    pub fn with_options(mut inner: R, options: DecodeOptions) -> Result<Self> {
        let file_len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;

        let mut head = Vec::with_capacity(HEADER_SIZE);
        (&mut inner).take(HEADER_SIZE as u64).read_to_end(&mut head)?;
        let header = NtsmHeader::from_bytes(&head)?;
        validate::check_header(&header, file_len)?;

        let mut reader = Self {
            inner,
            header,
            file_len,
            texture_entries: Vec::new(),
        };

        let preamble = Span::new(reader.header.glb_offset as u64, GLB_HEADER_SIZE as u64);
        let glb_head = reader.read_span(Section::Glb, preamble)?;
        validate::check_glb(&glb_head, options.check_glb_magic)?;

        if reader.header.texture_count > 0 {
            let table_span = reader.header.texture_table_span();
            let table = reader.read_span(Section::TextureTable, table_span)?;
            let entries = decode_table(
                &table,
                reader.header.texture_count,
                table_span.offset,
                file_len,
            )?;
            validate::check_texture_blobs(&reader.header, &entries)?;
            reader.texture_entries = entries;
        }

        tracing::debug!(
            name = %reader.header.name,
            file_len,
            textures = reader.texture_entries.len(),
            "opened NTSM reader"
        );
        Ok(reader)
    }

    pub fn header(&self) -> &NtsmHeader {
        &self.header
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn texture_entries(&self) -> &[TextureTableEntry] {
        &self.texture_entries
    }

    pub fn read_glb(&mut self) -> Result<Vec<u8>> {
        self.read_span(Section::Glb, self.header.glb_span())
    }

    /// Read every emitter record (empty whenever has_particles is clear)
    pub fn read_emitters(&mut self) -> Result<Vec<ParticleEmitter>> {
        if !self.header.has_particles() {
            return Ok(Vec::new());
        }
        let span = self.header.particle_span();
        let bytes = self.read_span(Section::Particles, span)?;
        particle::decode_all(&bytes, self.header.particle_count(), span.offset)
    }

    /// Read the blob of the texture at `index`, or `None` past the end of the table
    pub fn read_texture(&mut self, index: usize) -> Result<Option<Vec<u8>>> {
        let Some(span) = self.texture_entries.get(index).map(TextureTableEntry::span) else {
            return Ok(None);
        };
        self.read_span(Section::TextureBlob(index), span).map(Some)
    }

    /// Lazily read `(entry, blob)` pairs in table order. Call again to restart.
    pub fn textures(&mut self) -> TextureBlobs<'_, R> {
        TextureBlobs {
            reader: self,
            index: 0,
        }
    }

    /// Read every section into an owning [`Container`]
    pub fn into_container(mut self) -> Result<Container> {
        let glb = self.read_glb()?;
        let emitters = self.read_emitters()?;
        let textures = self
            .textures()
            .map(|item| item.map(|(entry, data)| Texture { name: entry.name, data }))
            .collect::<Result<Vec<_>>>()?;

        Ok(Container {
            header: self.header,
            glb,
            emitters,
            textures,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_span(&mut self, section: Section, span: Span) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(span.offset))?;
        let mut buf = vec![0u8; span.len as usize];
        self.inner.read_exact(&mut buf).map_err(|err| {
            FormatError::from_read(
                err,
                section,
                span.offset,
                span.len,
                self.file_len.saturating_sub(span.offset),
            )
        })?;
        Ok(buf)
    }
}

/// Lazy iterator over texture blobs read from an [`NtsmReader`]
#[derive(Debug)]
pub struct TextureBlobs<'r, R> {
    reader: &'r mut NtsmReader<R>,
    index: usize,
}

impl<R: Read + Seek> Iterator for TextureBlobs<'_, R> {
    type Item = Result<(TextureTableEntry, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        let entry = self.reader.texture_entries.get(index)?.clone();
        self.index += 1;
        Some(
            self.reader
                .read_span(Section::TextureBlob(index), entry.span())
                .map(|blob| (entry, blob)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.reader.texture_entries.len() - self.index;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{FLAG_HAS_PARTICLES, FLAG_WORLD_SPACE};
    use std::io::{Cursor, Write};

    fn sample() -> Container {
        let mut glb = vec![0u8; 64];
        glb[0..4].copy_from_slice(b"glTF");
        Container::new(
            "lantern",
            FLAG_HAS_PARTICLES | FLAG_WORLD_SPACE,
            glb,
            vec![
                ParticleEmitter::default(),
                ParticleEmitter {
                    texture_index: 1,
                    ..ParticleEmitter::default()
                },
            ],
            vec![
                Texture::new("flame", vec![1, 2, 3]),
                Texture::new("smoke", vec![4, 5]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_reader_matches_container() {
        let container = sample();
        let reader = NtsmReader::new(Cursor::new(container.encode().unwrap())).unwrap();
        assert_eq!(reader.header(), &container.header);
        assert_eq!(reader.texture_entries().len(), 2);
        assert_eq!(reader.into_container().unwrap(), container);
    }

    #[test]
    fn test_lazy_reads() {
        let mut reader = NtsmReader::new(Cursor::new(sample().encode().unwrap())).unwrap();

        assert_eq!(reader.read_texture(1).unwrap(), Some(vec![4, 5]));
        assert_eq!(reader.read_texture(2).unwrap(), None);
        assert_eq!(reader.read_emitters().unwrap().len(), 2);
        assert_eq!(&reader.read_glb().unwrap()[0..4], b"glTF");
    }

    #[test]
    fn test_texture_iterator_restarts() {
        let mut reader = NtsmReader::new(Cursor::new(sample().encode().unwrap())).unwrap();

        let names: Vec<String> = reader
            .textures()
            .map(|item| item.unwrap().0.name)
            .collect();
        assert_eq!(names, ["flame", "smoke"]);

        let (entry, blob) = reader.textures().next().unwrap().unwrap();
        assert_eq!(entry.name, "flame");
        assert_eq!(blob, vec![1, 2, 3]);
    }

    #[test]
    fn test_short_header() {
        let err = NtsmReader::new(Cursor::new(vec![0u8; 100])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn test_truncated_file() {
        let mut bytes = sample().encode().unwrap();
        bytes.truncate(bytes.len() - 1);
        let err = NtsmReader::new(Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTextureTable);
    }

    #[test]
    fn test_reads_from_file() {
        let container = sample();
        let mut file = tempfile::tempfile().unwrap();
        container.write_to(&mut file).unwrap();

        let mut reader = NtsmReader::new(file).unwrap();
        assert_eq!(reader.read_glb().unwrap(), container.glb);

        let mut file = reader.into_inner();
        file.seek(SeekFrom::End(0)).unwrap();
        file.write_all(b"trailing").unwrap();
        let reader = NtsmReader::new(file).unwrap();
        assert_eq!(reader.file_len(), container.encode().unwrap().len() as u64 + 8);
    }
}
