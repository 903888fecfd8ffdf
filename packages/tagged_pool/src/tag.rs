use std::fmt;

/// Identifies a logical category of pooled objects.
///
/// Tags are opaque to the pool: they are chosen by the caller, typically as constants, and are
/// never derived from the runtime type of the pooled objects. An object acquired under a tag is
/// always returned to the bucket of that same tag when released.
///
/// [`Tag::DEFAULT`] (tag 0) is the tag used by [`TaggedPool::acquire_default()`][1].
///
/// # Example
///
/// ```rust
/// use tagged_pool::Tag;
///
/// const PARSER: Tag = Tag::new(1);
/// const ENCODER: Tag = Tag::new(2);
///
/// assert_ne!(PARSER, ENCODER);
/// assert_eq!(Tag::DEFAULT, Tag::new(0));
/// assert_eq!(PARSER.get(), 1);
/// ```
///
/// [1]: crate::TaggedPool::acquire_default
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag(u32);

impl Tag {
    /// The default tag, used when the caller does not distinguish between object categories.
    pub const DEFAULT: Self = Self(0);

    /// Creates a tag from its numeric value.
    #[must_use]
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The numeric value of the tag.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Tag {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Tag> for u32 {
    #[inline]
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
