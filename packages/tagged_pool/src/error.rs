use thiserror::Error;

use crate::Tag;

/// Errors that can occur when acquiring an object from the pool.
///
/// All of these originate from the object factory being unable to produce a new object on a
/// pool miss. The pool state is left unchanged when an error is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
#[expect(
    variant_size_differences,
    reason = "errors are rare and short-lived, so the boxed source is kept inline for easy matching"
)]
pub enum Error {
    /// The pool had no idle object for the tag and no factory is configured to create one.
    #[error("no idle object tagged {tag} and no factory is configured to create one")]
    NoFactory {
        /// The tag the caller attempted to acquire.
        tag: Tag,
    },

    /// The factory produced nothing. A factory must always return a usable object.
    #[error("factory returned no object for tag {tag}")]
    EmptyResult {
        /// The tag the factory was asked to create an object for.
        tag: Tag,
    },

    /// The factory reported a failure while creating an object.
    #[error("factory failed to create an object for tag {tag}")]
    FactoryFailed {
        /// The tag the factory was asked to create an object for.
        tag: Tag,

        /// The error reported by the factory.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    /// The tag of the acquire operation that failed.
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::NoFactory { tag } | Self::EmptyResult { tag } | Self::FactoryFailed { tag, .. } => {
                *tag
            }
        }
    }
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::error::Error as _;
    use std::fmt::Debug;
    use std::io;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn tag_is_reported_for_every_variant() {
        let tag = Tag::new(3);

        assert_eq!(Error::NoFactory { tag }.tag(), tag);
        assert_eq!(Error::EmptyResult { tag }.tag(), tag);
        assert_eq!(
            Error::FactoryFailed {
                tag,
                source: Box::new(io::Error::other("boom")),
            }
            .tag(),
            tag
        );
    }

    #[test]
    fn factory_failure_exposes_source() {
        let error = Error::FactoryFailed {
            tag: Tag::new(9),
            source: Box::new(io::Error::other("out of handles")),
        };

        let source = error.source().expect("factory failure carries its source");
        assert_eq!(source.to_string(), "out of handles");
        assert!(error.to_string().contains("tag 9"));
    }

    #[test]
    fn empty_result_message_names_tag() {
        let error = Error::EmptyResult { tag: Tag::new(4) };
        assert_eq!(error.to_string(), "factory returned no object for tag 4");
        assert!(error.source().is_none());
    }
}
