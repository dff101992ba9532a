//! Key Codec
//!
//! Maps souls and fields onto engine keys.
//!
//! ```text
//! <soul>                  primary record: JSON node, or WIDE_NODE_MARKER
//! wide:<soul>/<field>     one field of a wide node: {"stateVector", "value"}
//! ```
//!
//! All field keys of a soul share the prefix `wide:<soul>/`, and because the
//! prefix is fixed, their byte order is the byte order of the field names.
//! Range scans rely on both properties.

/// Primary-record value marking a node as stored in wide form
pub const WIDE_NODE_MARKER: &[u8] = b"WIDE_NODE";

/// Leading bytes of every wide field key
pub const WIDE_KEY_PREFIX: &str = "wide:";

/// Key of a node's primary record
pub fn primary_key(soul: &str) -> &[u8] {
    soul.as_bytes()
}

/// Key of one field record of a wide node
pub fn wide_field_key(soul: &str, field: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(WIDE_KEY_PREFIX.len() + soul.len() + 1 + field.len());
    key.extend_from_slice(WIDE_KEY_PREFIX.as_bytes());
    key.extend_from_slice(soul.as_bytes());
    key.push(b'/');
    key.extend_from_slice(field.as_bytes());
    key
}

/// Prefix shared by every field key of `soul` (the key of the empty field)
pub fn wide_prefix(soul: &str) -> Vec<u8> {
    wide_field_key(soul, "")
}

/// Field name of `key` if it lies under `prefix`
pub fn wide_field_name<'k>(prefix: &[u8], key: &'k [u8]) -> Option<&'k [u8]> {
    key.strip_prefix(prefix)
}

/// Souls whose primary key would land inside the wide key space
pub fn is_reserved_soul(soul: &str) -> bool {
    soul.starts_with(WIDE_KEY_PREFIX)
}
