//! Sequential decoding from a plain `Read` source (pipes, sockets).
//!
//! Sections are consumed in file order and gaps are skipped. Texture blobs
//! may sit anywhere after the table, so once a table is reached the rest of
//! the input is buffered and validated like an in-memory file.

use std::io::{self, Read};

use crate::container::{Container, DecodeOptions};
use crate::error::{FormatError, Result, Section};
use crate::format::HEADER_SIZE;
use crate::header::NtsmHeader;
use crate::particle;
use crate::texture::{Texture, decode_table};
use crate::validate;

/// Upper bound on up-front allocation for a declared section size
const MAX_PREALLOC: u64 = 1 << 20;

struct Sequential<R> {
    inner: R,
    pos: u64,
    previous: Section,
}

impl<R: Read> Sequential<R> {
    /// Advance to `offset`, the start of a `size`-byte `section`.
    fn skip_to(&mut self, section: Section, offset: u64, size: u64) -> Result<()> {
        if offset < self.pos {
            return Err(FormatError::SectionOverlap {
                first: self.previous,
                second: section,
            });
        }
        let gap = offset - self.pos;
        let skipped = io::copy(&mut (&mut self.inner).take(gap), &mut io::sink())?;
        self.pos += skipped;
        if skipped < gap {
            return Err(FormatError::TruncatedSection {
                section,
                offset,
                size,
                available: 0,
            });
        }
        Ok(())
    }

    fn read_section(&mut self, section: Section, offset: u64, size: u64) -> Result<Vec<u8>> {
        self.skip_to(section, offset, size)?;
        let mut buf = Vec::with_capacity(size.min(MAX_PREALLOC) as usize);
        let read = (&mut self.inner).take(size).read_to_end(&mut buf)? as u64;
        self.pos += read;
        if read < size {
            return Err(FormatError::TruncatedSection {
                section,
                offset,
                size,
                available: read,
            });
        }
        self.previous = section;
        Ok(buf)
    }
}

impl Container {
    /// Decode from a non-seekable reader
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Self::read_from_with(reader, DecodeOptions::default())
    }

    pub fn read_from_with<R: Read>(reader: R, options: DecodeOptions) -> Result<Self> {
        let mut input = Sequential {
            inner: reader,
            pos: 0,
            previous: Section::Header,
        };

        let head = input.read_section(Section::Header, 0, HEADER_SIZE as u64);
        let head = match head {
            Ok(head) => head,
            Err(FormatError::TruncatedSection { available, .. }) => {
                return Err(FormatError::MalformedHeader(format!(
                    "need {HEADER_SIZE} bytes, got {available}"
                )));
            }
            Err(err) => return Err(err),
        };
        let header = NtsmHeader::from_bytes(&head)?;
        validate::check_header_fields(&header)?;

        let glb_span = header.glb_span();
        let glb = input.read_section(Section::Glb, glb_span.offset, glb_span.len)?;
        validate::check_glb(&glb, options.check_glb_magic)?;

        let emitters = if header.has_particles() {
            let span = header.particle_span();
            let bytes = input.read_section(Section::Particles, span.offset, span.len)?;
            particle::decode_all(&bytes, header.particle_count(), span.offset)?
        } else {
            Vec::new()
        };

        let textures = if header.texture_count > 0 {
            let table_span = header.texture_table_span();
            input.skip_to(Section::TextureTable, table_span.offset, table_span.len)?;

            let mut tail = Vec::new();
            input.inner.read_to_end(&mut tail)?;
            let file_len = table_span.offset + tail.len() as u64;
            validate::check_header(&header, file_len)?;

            let entries = decode_table(&tail, header.texture_count, table_span.offset, file_len)?;
            validate::check_texture_blobs(&header, &entries)?;

            entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| {
                    let span = entry.span();
                    if span.offset < table_span.offset && !span.is_empty() {
                        return Err(FormatError::InvalidTextureTable(format!(
                            "texture blob #{index} precedes the table; cannot seek back"
                        )));
                    }
                    let start = span.offset.saturating_sub(table_span.offset) as usize;
                    let data = tail
                        .get(start..start + span.len as usize)
                        .map(<[u8]>::to_vec)
                        .unwrap_or_default();
                    Ok(Texture {
                        name: entry.name,
                        data,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        tracing::debug!(
            name = %header.name,
            emitters = emitters.len(),
            textures = textures.len(),
            "decoded NTSM stream"
        );

        Ok(Container {
            header,
            glb,
            emitters,
            textures,
        })
    }
}
