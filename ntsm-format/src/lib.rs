//! Codec for the NTSM container format
//!
//! An NTSM file bundles a binary glTF (GLB) mesh with optional particle
//! emitter definitions and optional embedded textures:
//!
//! ```text
//! offset 0      ┌──────────────────────────────┐
//!               │ Header (192 bytes)           │
//! glb_offset    ├──────────────────────────────┤
//!               │ GLB blob                     │
//! particle_off  ├──────────────────────────────┤
//!               │ Emitters (n × 128 bytes)     │  if has_particles
//! table_offset  ├──────────────────────────────┤
//!               │ Texture table (m × 72 bytes) │  if texture_count > 0
//!               │ Texture blobs                │
//!               └──────────────────────────────┘
//! ```
//!
//! All multi-byte values are little-endian.
//!
//! # Modules
//!
//! - [`container`] - Owned [`Container`] with encode/decode
//! - [`view`] - Zero-copy [`NtsmView`] over a byte slice
//! - [`reader`] - Lazy [`NtsmReader`] over any `Read + Seek` source
//! - [`stream`] - Sequential decoding from a plain `Read` source
//! - [`header`], [`particle`], [`texture`] - Fixed-size records
//! - [`layout`] - Section placement
//! - [`validate`] - Structural checks shared by all decoders
//!
//! # Example
//!
//! ```
//! use ntsm_format::{Container, FLAG_COLLISION, Texture};
//!
//! let mut glb = vec![0u8; 12];
//! glb[0..4].copy_from_slice(b"glTF");
//!
//! let moss = Texture::new("moss", vec![1, 2, 3]);
//! let rock = Container::new("rock", FLAG_COLLISION, glb, vec![], vec![moss])?;
//! let bytes = rock.encode()?;
//! assert_eq!(Container::decode(&bytes)?, rock);
//! # Ok::<(), ntsm_format::FormatError>(())
//! ```

mod bytes;
pub mod container;
pub mod error;
pub mod format;
pub mod header;
pub mod layout;
pub mod particle;
pub mod reader;
mod serialization;
pub mod stream;
pub mod texture;
pub mod validate;
pub mod view;

pub use bytes::truncate_name;
pub use container::{Container, DecodeOptions};
pub use error::{ErrorKind, FormatError, Result, Section};
pub use format::*;
pub use header::NtsmHeader;
pub use layout::{SectionLayout, Span};
pub use particle::ParticleEmitter;
pub use reader::{NtsmReader, TextureBlobs};
pub use serialization::{BinarySerializable, read_records, write_records};
pub use texture::{Texture, TextureTableEntry, decode_table, encode_table};
pub use view::{NtsmView, Textures};
