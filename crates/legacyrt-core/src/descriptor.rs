//! Descriptors for buffers handed across the legacy call boundary.
//!
//! Only scalar CHARACTER descriptors are needed here: the caller's buffer
//! plus its kind (bytes per character) and character length. Lower bounds are
//! implicitly 1 and carry no metadata.

/// Bytes per character of default CHARACTER.
pub const DEFAULT_CHARACTER_KIND: usize = 1;

/// A borrowed view of a CHARACTER object.
#[derive(Debug)]
pub struct Descriptor<'a> {
    kind: usize,
    char_len: usize,
    rank: u8,
    base: &'a mut [u8],
}

impl<'a> Descriptor<'a> {
    /// Scalar default CHARACTER whose length is the whole of `base`.
    pub fn character(base: &'a mut [u8]) -> Self {
        Self {
            kind: DEFAULT_CHARACTER_KIND,
            char_len: base.len(),
            rank: 0,
            base,
        }
    }

    /// General constructor. `kind` must be 1, 2 or 4 and `base` must hold
    /// at least `kind * char_len` bytes; the view is cut to exactly that.
    pub fn create(kind: usize, char_len: usize, base: &'a mut [u8], rank: u8) -> Option<Self> {
        if !matches!(kind, 1 | 2 | 4) {
            return None;
        }
        let bytes = kind.checked_mul(char_len)?;
        if base.len() < bytes {
            return None;
        }
        Some(Self {
            kind,
            char_len,
            rank,
            base: &mut base[..bytes],
        })
    }

    #[must_use]
    pub fn kind(&self) -> usize {
        self.kind
    }

    #[must_use]
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    #[must_use]
    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// True for a scalar default CHARACTER, the only shape command-argument
    /// retrieval accepts.
    #[must_use]
    pub fn is_character(&self) -> bool {
        self.kind == DEFAULT_CHARACTER_KIND && self.rank == 0
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.base
    }
}
