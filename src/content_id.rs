//! Content identifiers as they appear in graphsplit manifests.
//!
//! `ContentId` wraps a [`cid::Cid`] (CIDv0 `Qm...` or CIDv1 in any multibase the `cid` crate
//! decodes). The graphsplit columns `payload_hash`/`piece_hash` are derived from it and never read
//! from the file directly.

use std::{fmt, str::FromStr};

use cid::Cid;
use multihash::Multihash;
use sha2::{Digest, Sha256};

use crate::errors::ManifestError;

/// SHA2-256 multihash code.
pub const SHA2_256: u64 = 0x12;

/// `raw` multicodec.
pub const RAW_CODEC: u64 = 0x55;

/// `dag-pb` multicodec, used by unixfs payloads.
pub const DAG_PB_CODEC: u64 = 0x70;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentId(Cid);

impl ContentId {
    /// Parse a textual content identifier. Surrounding whitespace is not accepted.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Cid::try_from(text)
            .map(Self)
            .map_err(|e| ManifestError::InvalidContentId(format!("{text}: {e}")))
    }

    /// Build a CIDv1 tagged with `codec` over the SHA2-256 digest of `bytes`.
    pub fn from_sha256(codec: u64, bytes: &[u8]) -> Result<Self, ManifestError> {
        let digest = Sha256::digest(bytes);
        let mh = Multihash::<64>::wrap(SHA2_256, &digest)
            .map_err(|e| ManifestError::InvalidContentId(format!("multihash wrap failed: {e}")))?;
        Ok(Self(Cid::new_v1(codec, mh)))
    }

    pub fn as_cid(&self) -> &Cid {
        &self.0
    }

    pub fn codec(&self) -> u64 {
        self.0.codec()
    }

    /// Hex of the complete multihash: code, digest length and digest.
    pub fn multihash_hex(&self) -> String {
        hex::encode(self.0.hash().to_bytes())
    }

    /// Hex of the digest alone, without the multihash prefix.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.0.hash().digest())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl FromStr for ContentId {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256_hex;

    #[test]
    fn test_parse_roundtrip() {
        let id = ContentId::from_sha256(RAW_CODEC, b"payload").unwrap();
        let text = id.to_string();
        assert!(text.starts_with('b'), "CIDv1 base32 starts with 'b': {text}");

        let parsed = ContentId::parse(&text).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.codec(), RAW_CODEC);
    }

    #[test]
    fn test_multihash_hex_carries_prefix() {
        let id = ContentId::from_sha256(DAG_PB_CODEC, b"piece").unwrap();
        let digest = sha256_hex(b"piece");

        assert_eq!(id.digest_hex(), digest);
        assert_eq!(id.multihash_hex(), format!("1220{digest}"));
    }

    #[test]
    fn test_parse_cid_v0() {
        let v1 = ContentId::from_sha256(DAG_PB_CODEC, b"v0 content").unwrap();
        let v0 = Cid::new_v0(*v1.as_cid().hash()).unwrap().to_string();
        assert!(v0.starts_with("Qm"));

        let parsed = ContentId::parse(&v0).unwrap();
        assert_eq!(parsed.multihash_hex(), v1.multihash_hex());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            ContentId::parse("not-a-cid"),
            Err(ManifestError::InvalidContentId(_))
        ));
        assert!(ContentId::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_padding() {
        let text = ContentId::from_sha256(RAW_CODEC, b"padded").unwrap().to_string();
        assert!(ContentId::parse(&format!(" {text}")).is_err());
        assert!(ContentId::parse(&format!("{text} ")).is_err());
    }
}
