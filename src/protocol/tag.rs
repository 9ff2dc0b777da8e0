//! Tag definitions
//!
//! Command and response discriminators, and the fixed-width integers that
//! carry them on the wire.

use std::fmt::Debug;
use std::hash::Hash;

use bytes::BufMut;

/// Integer type backing a tag enumeration on the wire
///
/// Encoded big-endian; the wire width equals the integer's byte width.
pub trait TagRepr: Copy + Eq + Debug + Send + Sync + 'static {
    /// Encoded width in bytes (1, 2, 4 or 8)
    const WIDTH: usize;

    /// Append the big-endian encoding to `buf`
    fn put_be<B: BufMut>(self, buf: &mut B);

    /// Read from the first `WIDTH` bytes of `bytes`
    ///
    /// Callers must check the length first.
    fn from_be_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_tag_repr {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TagRepr for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn put_be<B: BufMut>(self, buf: &mut B) {
                    buf.put_slice(&self.to_be_bytes());
                }

                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::WIDTH]);
                    <$ty>::from_be_bytes(raw)
                }
            }
        )*
    };
}

impl_tag_repr!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Special response roles recognised by the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// The peer failed while handling a command
    Error,

    /// The peer did not recognise the command
    Unknown,

    /// The peer recognised the command but has nothing mapped to it
    NotMapped,
}

/// A closed enumeration of command or response discriminators
///
/// Usually generated with [`protocol_tags!`](crate::protocol_tags).
pub trait Tag: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Backing integer type
    type Repr: TagRepr;

    /// Every declared variant, in declaration order
    const ALL: &'static [Self];

    /// Backing integer value
    fn to_repr(self) -> Self::Repr;

    /// Declared variant name
    fn name(self) -> &'static str;

    /// Sentinel marker declared on this variant, if any
    fn sentinel(self) -> Option<Sentinel> {
        None
    }

    /// Map a backing value onto a declared variant
    fn from_repr(repr: Self::Repr) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.to_repr() == repr)
    }

    /// Look up a variant by its declared name
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.name() == name)
    }

    /// Wire width of this tag type in bytes
    fn width() -> usize {
        <Self::Repr as TagRepr>::WIDTH
    }
}

/// Declare a tag enumeration and implement [`Tag`](crate::protocol::Tag) for it.
///
/// Variants may carry a `#[sentinel(Error | Unknown | NotMapped)]` marker.
///
/// ```
/// tagwire::protocol_tags! {
///     pub enum Reply: u16 {
///         Pong = 1,
///         #[sentinel(Error)]
///         Failed = 0xFFFF,
///     }
/// }
/// ```
#[macro_export]
macro_rules! protocol_tags {
    (@sentinel) => {
        None
    };
    (@sentinel $kind:ident) => {
        Some($crate::protocol::Sentinel::$kind)
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $( $(#[sentinel($kind:ident)])? $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $( $variant = $value ),+
        }

        impl $crate::protocol::Tag for $name {
            type Repr = $repr;

            const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            fn to_repr(self) -> $repr {
                self as $repr
            }

            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant) ),+
                }
            }

            fn sentinel(self) -> Option<$crate::protocol::Sentinel> {
                match self {
                    $( Self::$variant => $crate::protocol_tags!(@sentinel $($kind)?) ),+
                }
            }
        }
    };
}
