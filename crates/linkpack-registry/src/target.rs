//! Destinations an image can be published to.

use linkpack_common::error::Result;
use linkpack_common::types::Digest;

use crate::manifest::Image;
use crate::reference::Reference;

/// A place images are published to.
pub trait ImageTarget {
    /// Publishes `image` under `reference`, returning the manifest digest.
    ///
    /// # Errors
    ///
    /// Returns an error if any blob or the manifest cannot be stored.
    fn publish(&self, reference: &Reference, image: &Image) -> Result<Digest>;
}
