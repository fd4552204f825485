//! String descriptors (USB 2.0 §9.6.7).
//!
//! Every entry lives in a fixed 64-byte record so the engine can index
//! the table directly:
//!
//! ```text
//! Byte 0:     bLength (2 + 2 × code units)
//! Byte 1:     bDescriptorType (0x03)
//! Byte 2..:   UTF-16LE code units, at most 31
//! ```
//!
//! Index 0 is not a string: it carries the supported language ID as its
//! single code unit.

use super::DESC_TYPE_STRING;

/// Longest string (in UTF-16 code units) a record can hold. Longer
/// strings are truncated on a character boundary.
pub const STRING_DESCRIPTOR_MAX_CHARS: usize = 31;

/// Size of one fixed record.
pub const STRING_DESCRIPTOR_SIZE: usize = 2 + 2 * STRING_DESCRIPTOR_MAX_CHARS;

/// Number of records in the table: language ID + manufacturer, product,
/// serial.
pub const STRING_TABLE_LEN: usize = 4;

/// One string descriptor in its fixed-size backing record.
///
/// `repr(C)` with 2-byte alignment matches the engine's
/// `string_descriptor_t`, whose body is an array of `uint16_t`.
#[repr(C, align(2))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StringDescriptor {
    bytes: [u8; STRING_DESCRIPTOR_SIZE],
}

impl StringDescriptor {
    /// Record holding no code units.
    pub const EMPTY: Self = Self::from_units(&[]);

    /// Language-ID pseudo-string for index 0.
    pub const fn language(language_id: u16) -> Self {
        Self::from_units(&[language_id])
    }

    const fn from_units(units: &[u16]) -> Self {
        let mut bytes = [0u8; STRING_DESCRIPTOR_SIZE];
        let mut i = 0;
        while i < units.len() && i < STRING_DESCRIPTOR_MAX_CHARS {
            let le = units[i].to_le_bytes();
            bytes[2 + 2 * i] = le[0];
            bytes[3 + 2 * i] = le[1];
            i += 1;
        }
        bytes[0] = (2 + 2 * i) as u8;
        bytes[1] = DESC_TYPE_STRING;
        Self { bytes }
    }

    /// Encode `s` as UTF-16LE, truncating to [`STRING_DESCRIPTOR_MAX_CHARS`]
    /// code units. A surrogate pair that would straddle the cap is dropped
    /// whole.
    pub fn encode(s: &str) -> Self {
        let mut bytes = [0u8; STRING_DESCRIPTOR_SIZE];
        let mut units = 0;
        let mut buf = [0u16; 2];

        for c in s.chars() {
            let encoded = c.encode_utf16(&mut buf);
            if units + encoded.len() > STRING_DESCRIPTOR_MAX_CHARS {
                break;
            }
            for &unit in encoded.iter() {
                let at = 2 + 2 * units;
                bytes[at..at + 2].copy_from_slice(&unit.to_le_bytes());
                units += 1;
            }
        }

        // Header goes in once the payload length is known.
        bytes[0] = (2 + 2 * units) as u8;
        bytes[1] = DESC_TYPE_STRING;
        Self { bytes }
    }

    /// `bLength`: header plus payload bytes.
    pub fn len(&self) -> usize {
        self.bytes[0] as usize
    }

    /// Number of UTF-16 code units in the payload.
    pub fn unit_count(&self) -> usize {
        (self.len() - 2) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.unit_count() == 0
    }

    /// Bytes the host receives for this descriptor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Payload code units in order.
    pub fn code_units(&self) -> impl Iterator<Item = u16> + '_ {
        self.bytes[2..self.len()]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }
}

impl core::fmt::Debug for StringDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StringDescriptor")
            .field("len", &self.len())
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

/// Indexed string descriptor table. Bounds are fixed at construction.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringTable {
    entries: [StringDescriptor; STRING_TABLE_LEN],
}

impl StringTable {
    /// Descriptor at `index`, or `None` past the end of the table.
    pub fn get(&self, index: u8) -> Option<&StringDescriptor> {
        self.entries.get(index as usize)
    }

    pub fn entries(&self) -> &[StringDescriptor; STRING_TABLE_LEN] {
        &self.entries
    }

    /// Language ID advertised at index 0.
    pub fn language_id(&self) -> u16 {
        let b = self.entries[0].bytes;
        u16::from_le_bytes([b[2], b[3]])
    }
}

/// Build the string table: index 0 carries `language_id`, `strings[i]`
/// lands at index `i + 1`.
///
/// Strings past the table's capacity are ignored; indices without a
/// string encode as empty descriptors.
pub fn build_string_table(strings: &[&str], language_id: u16) -> StringTable {
    let mut entries = [StringDescriptor::EMPTY; STRING_TABLE_LEN];
    entries[0] = StringDescriptor::language(language_id);

    for (slot, s) in entries[1..].iter_mut().zip(strings) {
        *slot = StringDescriptor::encode(s);
    }

    StringTable { entries }
}
