use derive_more::Display;

/// The endianness of a multi-byte data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Display)]
pub enum Endianness {
    /// Least significant byte first.
    #[display("little")]
    Little,
    /// Most significant byte first.
    #[display("big")]
    Big,
}

impl Endianness {
    /// The typestr prefix character: `<` for little endian, `>` for big endian.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Little => '<',
            Self::Big => '>',
        }
    }
}
