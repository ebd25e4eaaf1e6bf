use std::fmt;

/// Multicodec tag for a sealed sector commitment (`fil-commitment-sealed`).
///
/// These two codecs identify links to out-of-band sector data that must
/// never be walked; see [`crate::archive::is_internal_link`].
pub const FIL_COMMITMENT_SEALED: u64 = 0xf102;

/// Multicodec tag for an unsealed sector commitment (`fil-commitment-unsealed`).
pub const FIL_COMMITMENT_UNSEALED: u64 = 0xf101;

/// An opaque, comparable, serializable content hash.
///
/// Two identifiers are equal iff their encoded byte forms are equal. The
/// encoded form here is the codec tag followed by the raw digest bytes; a
/// full implementation would use proper varint + multibase framing, but the
/// splitter only needs byte equality and the codec tag, so this stays a
/// plain newtype rather than pulling in a whole CID parsing stack.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Cid {
    codec: u64,
    digest: Vec<u8>,
}

impl Cid {
    pub fn new(codec: u64, digest: impl Into<Vec<u8>>) -> Self {
        Cid {
            codec,
            digest: digest.into(),
        }
    }

    /// The multicodec tag carried in this identifier's prefix.
    pub fn codec(&self) -> u64 {
        self.codec
    }

    /// The encoded byte form used for equality and for archive indices.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.codec.to_be_bytes().to_vec();
        out.extend_from_slice(&self.digest);
        out
    }

    /// The raw digest bytes, without the codec prefix.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    pub fn is_known_opaque_codec(&self) -> bool {
        matches!(self.codec, FIL_COMMITMENT_SEALED | FIL_COMMITMENT_UNSEALED)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}-{}", self.codec, hex(&self.digest))
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_byte_equality() {
        let a = Cid::new(0x70, vec![1, 2, 3]);
        let b = Cid::new(0x70, vec![1, 2, 3]);
        let c = Cid::new(0x70, vec![1, 2, 4]);
        let d = Cid::new(0x71, vec![1, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn known_opaque_codecs() {
        assert!(Cid::new(FIL_COMMITMENT_SEALED, vec![0]).is_known_opaque_codec());
        assert!(Cid::new(FIL_COMMITMENT_UNSEALED, vec![0]).is_known_opaque_codec());
        assert!(!Cid::new(0x70, vec![0]).is_known_opaque_codec());
    }
}
