//! Core types shared by the document, ledger and reconciler.

/// Identity: opaque 256-bit marker for one generation of content at a path
pub type Identity = [u8; 32];

/// ContentHash: BLAKE3 digest of a file's bytes, used as its content reference
pub type ContentHash = [u8; 32];

/// ReplicaId: name of the machine that authored a document write
pub type ReplicaId = String;

/// Compute the content reference for a byte buffer.
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    *blake3::hash(bytes).as_bytes()
}

/// Short hex form of an identity or hash, for logs and CLI output.
pub fn short_hex(bytes: &[u8; 32]) -> String {
    hex::encode(&bytes[..6])
}
