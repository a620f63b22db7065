use std::path::PathBuf;

/// Failures of the low-level stream primitives.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of stream at offset {offset:#x}")]
    UnexpectedEof { offset: u64 },
    #[error("string at offset {offset:#x} has no terminator within {max} bytes")]
    Unterminated { offset: u64, max: usize },
}

/// Errors from texture loading.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("texture '{name}' and the fallback texture are both missing")]
    NotFound { name: String },
    #[error("texture '{name}' could not be decoded")]
    Decode { name: String },
}

/// Errors from material payload parsing.
#[derive(Debug, thiserror::Error)]
pub enum MaterialError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("IO error opening material: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from model encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{count} bones do not fit the one-byte bone count")]
    TooManyBones { count: usize },
}

/// Errors from model loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(
        "wrong magic word '{}', '{}' expected (offset {offset:#x})",
        .found.escape_ascii(),
        .expected.escape_ascii()
    )]
    BadMagic {
        expected: [u8; 3],
        found: [u8; 3],
        offset: u64,
    },
    #[error("vertex data too large: {count} vertices of {stride} bytes")]
    VertexDataTooLarge { count: u32, stride: u8 },
    #[error("material '{name}': {source}")]
    Material {
        name: String,
        #[source]
        source: MaterialError,
    },
    #[error("model path has no parent directory: {0}")]
    NoParent(PathBuf),
}
