//! Particle emitter records (128 bytes each)
//!
//! # Layout
//! ```text
//! 0x00: position [f32; 3]
//! 0x0C: direction [f32; 3]
//! 0x18: spread_angle f32
//! 0x1C: emission_rate f32
//! 0x20: lifetime f32
//! 0x24: start_size f32
//! 0x28: end_size f32
//! 0x2C: start_color [f32; 4] (RGBA)
//! 0x3C: end_color [f32; 4] (RGBA)
//! 0x4C: velocity_min [f32; 3]
//! 0x58: velocity_max [f32; 3]
//! 0x64: gravity f32
//! 0x68: texture_index i32 (-1 = built-in spark texture)
//! 0x6C: blend_mode u8 (0 = additive, 1 = alpha)
//! 0x6D: loop_mode u8 (0 = once, 1 = loop)
//! 0x6E: reserved (2 bytes, zero)
//! 0x70: reserved padding up to 128 bytes (zero)
//! ```
//!
//! Record order is significant: emitters are referenced by index elsewhere.

use serde::{Deserialize, Serialize};

use crate::bytes::{get_f32, get_f32s, get_i32, put_f32, put_f32s, put_i32};
use crate::error::{FormatError, Result, Section};
use crate::format::PARTICLE_RECORD_SIZE;
use crate::serialization::{read_records, write_records};

const OFF_POSITION: usize = 0;
const OFF_DIRECTION: usize = 12;
const OFF_SPREAD_ANGLE: usize = 24;
const OFF_EMISSION_RATE: usize = 28;
const OFF_LIFETIME: usize = 32;
const OFF_START_SIZE: usize = 36;
const OFF_END_SIZE: usize = 40;
const OFF_START_COLOR: usize = 44;
const OFF_END_COLOR: usize = 60;
const OFF_VELOCITY_MIN: usize = 76;
const OFF_VELOCITY_MAX: usize = 88;
const OFF_GRAVITY: usize = 100;
const OFF_TEXTURE_INDEX: usize = 104;
const OFF_BLEND_MODE: usize = 108;
const OFF_LOOP_MODE: usize = 109;

/// Use the runtime's built-in spark texture instead of a table entry
pub const TEXTURE_INDEX_DEFAULT: i32 = -1;

pub const BLEND_ADDITIVE: u8 = 0;
pub const BLEND_ALPHA: u8 = 1;

pub const LOOP_ONCE: u8 = 0;
pub const LOOP_REPEAT: u8 = 1;

/// One particle-system source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleEmitter {
    pub position: [f32; 3],
    pub direction: [f32; 3],
    /// Cone half-angle in degrees
    pub spread_angle: f32,
    /// Particles per second
    pub emission_rate: f32,
    /// Particle lifetime in seconds
    pub lifetime: f32,
    pub start_size: f32,
    pub end_size: f32,
    pub start_color: [f32; 4],
    pub end_color: [f32; 4],
    pub velocity_min: [f32; 3],
    pub velocity_max: [f32; 3],
    pub gravity: f32,
    /// Index into the texture table, or [`TEXTURE_INDEX_DEFAULT`]
    pub texture_index: i32,
    pub blend_mode: u8,
    pub loop_mode: u8,
}

impl Default for ParticleEmitter {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            direction: [0.0, 1.0, 0.0],
            spread_angle: 15.0,
            emission_rate: 10.0,
            lifetime: 1.0,
            start_size: 0.1,
            end_size: 0.0,
            start_color: [1.0; 4],
            end_color: [1.0, 1.0, 1.0, 0.0],
            velocity_min: [0.0, 1.0, 0.0],
            velocity_max: [0.0, 2.0, 0.0],
            gravity: 0.0,
            texture_index: TEXTURE_INDEX_DEFAULT,
            blend_mode: BLEND_ADDITIVE,
            loop_mode: LOOP_REPEAT,
        }
    }
}

impl ParticleEmitter {
    pub const SIZE: usize = PARTICLE_RECORD_SIZE;

    pub fn uses_default_texture(&self) -> bool {
        self.texture_index == TEXTURE_INDEX_DEFAULT
    }

    pub fn is_looping(&self) -> bool {
        self.loop_mode == LOOP_REPEAT
    }

    /// Write record to bytes. Reserved bytes are always zero.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        put_f32s(&mut bytes, OFF_POSITION, &self.position);
        put_f32s(&mut bytes, OFF_DIRECTION, &self.direction);
        put_f32(&mut bytes, OFF_SPREAD_ANGLE, self.spread_angle);
        put_f32(&mut bytes, OFF_EMISSION_RATE, self.emission_rate);
        put_f32(&mut bytes, OFF_LIFETIME, self.lifetime);
        put_f32(&mut bytes, OFF_START_SIZE, self.start_size);
        put_f32(&mut bytes, OFF_END_SIZE, self.end_size);
        put_f32s(&mut bytes, OFF_START_COLOR, &self.start_color);
        put_f32s(&mut bytes, OFF_END_COLOR, &self.end_color);
        put_f32s(&mut bytes, OFF_VELOCITY_MIN, &self.velocity_min);
        put_f32s(&mut bytes, OFF_VELOCITY_MAX, &self.velocity_max);
        put_f32(&mut bytes, OFF_GRAVITY, self.gravity);
        put_i32(&mut bytes, OFF_TEXTURE_INDEX, self.texture_index);
        bytes[OFF_BLEND_MODE] = self.blend_mode;
        bytes[OFF_LOOP_MODE] = self.loop_mode;
        bytes
    }

    /// Read record from bytes. Reserved bytes are not interpreted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::TruncatedSection {
                section: Section::Particles,
                offset: 0,
                size: Self::SIZE as u64,
                available: bytes.len() as u64,
            });
        }
        Ok(Self::from_record(bytes))
    }

    /// Decode a record from a slice already known to hold 128 bytes
    pub(crate) fn from_record(bytes: &[u8]) -> Self {
        Self {
            position: get_f32s(bytes, OFF_POSITION),
            direction: get_f32s(bytes, OFF_DIRECTION),
            spread_angle: get_f32(bytes, OFF_SPREAD_ANGLE),
            emission_rate: get_f32(bytes, OFF_EMISSION_RATE),
            lifetime: get_f32(bytes, OFF_LIFETIME),
            start_size: get_f32(bytes, OFF_START_SIZE),
            end_size: get_f32(bytes, OFF_END_SIZE),
            start_color: get_f32s(bytes, OFF_START_COLOR),
            end_color: get_f32s(bytes, OFF_END_COLOR),
            velocity_min: get_f32s(bytes, OFF_VELOCITY_MIN),
            velocity_max: get_f32s(bytes, OFF_VELOCITY_MAX),
            gravity: get_f32(bytes, OFF_GRAVITY),
            texture_index: get_i32(bytes, OFF_TEXTURE_INDEX),
            blend_mode: bytes[OFF_BLEND_MODE],
            loop_mode: bytes[OFF_LOOP_MODE],
        }
    }
}

/// Concatenate emitter records in input order
pub fn encode_all(emitters: &[ParticleEmitter]) -> Vec<u8> {
    write_records(emitters)
}

/// Decode exactly `count` emitter records.
///
/// `bytes` must be a whole number of records and hold at least `count` of
/// them; otherwise nothing is returned. `offset` is only used in errors.
pub fn decode_all(bytes: &[u8], count: usize, offset: u64) -> Result<Vec<ParticleEmitter>> {
    if bytes.len() % PARTICLE_RECORD_SIZE != 0 {
        return Err(FormatError::TruncatedSection {
            section: Section::Particles,
            offset,
            size: bytes.len().next_multiple_of(PARTICLE_RECORD_SIZE) as u64,
            available: bytes.len() as u64,
        });
    }
    read_records(bytes, count, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn torch_flame() -> ParticleEmitter {
        ParticleEmitter {
            position: [0.0, 1.5, 0.25],
            direction: [0.0, 1.0, 0.0],
            spread_angle: 20.0,
            emission_rate: 45.0,
            lifetime: 0.8,
            start_size: 0.2,
            end_size: 0.05,
            start_color: [1.0, 0.6, 0.1, 1.0],
            end_color: [0.8, 0.1, 0.0, 0.0],
            velocity_min: [-0.1, 0.5, -0.1],
            velocity_max: [0.1, 1.2, 0.1],
            gravity: -0.5,
            texture_index: 2,
            blend_mode: BLEND_ALPHA,
            loop_mode: LOOP_REPEAT,
        }
    }

    #[test]
    fn test_record_size() {
        assert_eq!(torch_flame().to_bytes().len(), 128);
    }

    #[test]
    fn test_record_offsets() {
        let bytes = torch_flame().to_bytes();
        assert_eq!(&bytes[4..8], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &20.0f32.to_le_bytes());
        assert_eq!(&bytes[44..48], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[100..104], &(-0.5f32).to_le_bytes());
        assert_eq!(&bytes[104..108], &2i32.to_le_bytes());
        assert_eq!(bytes[108], BLEND_ALPHA);
        assert_eq!(bytes[109], LOOP_REPEAT);
        assert!(bytes[110..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_record_roundtrip() {
        let emitter = torch_flame();
        let parsed = ParticleEmitter::from_bytes(&emitter.to_bytes()).unwrap();
        assert_eq!(parsed, emitter);
    }

    #[test]
    fn test_default_texture_sentinel_preserved() {
        let emitter = ParticleEmitter::default();
        let bytes = emitter.to_bytes();
        assert_eq!(&bytes[104..108], &[0xFF; 4]);

        let parsed = ParticleEmitter::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.texture_index, -1);
        assert!(parsed.uses_default_texture());
    }

    #[test]
    fn test_reserved_bytes_ignored() {
        let mut bytes = torch_flame().to_bytes();
        bytes[110] = 0x11;
        bytes[127] = 0x22;
        assert_eq!(ParticleEmitter::from_bytes(&bytes).unwrap(), torch_flame());
    }

    #[test]
    fn test_encode_all_preserves_order() {
        let a = torch_flame();
        let b = ParticleEmitter {
            texture_index: 7,
            ..ParticleEmitter::default()
        };
        let bytes = encode_all(&[a, b, a]);
        assert_eq!(bytes.len(), 3 * 128);

        let decoded = decode_all(&bytes, 3, 0).unwrap();
        assert_eq!(decoded, vec![a, b, a]);
    }

    #[test]
    fn test_decode_all_rejects_partial_record() {
        let mut bytes = encode_all(&[torch_flame()]);
        bytes.extend_from_slice(&[0, 0]);
        let err = decode_all(&bytes, 1, 1216).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedSection);
    }

    #[test]
    fn test_decode_all_rejects_missing_records() {
        let bytes = encode_all(&[torch_flame()]);
        let err = decode_all(&bytes, 2, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedSection);
    }

    #[test]
    fn test_empty_input() {
        assert!(encode_all(&[]).is_empty());
        assert!(decode_all(&[], 0, 0).unwrap().is_empty());
    }
}
