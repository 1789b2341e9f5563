use crate::prelude::*;
use std::fmt;
use std::str::FromStr;

const DOCKER_HUB_PREFIX: &str = "docker.io/";
const DEFAULT_TAG: &str = "latest";

/// An image as stored in the local registry: a repository name and a tag or digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub reference: String,
}

impl ImageRef {
    /// Registry API path of the image manifest, relative to the registry root.
    pub fn manifest_path(&self) -> String {
        format!("v2/{}/manifests/{}", self.name, self.reference)
    }

    fn is_digest(&self) -> bool {
        self.reference.contains(':')
    }
}

impl FromStr for ImageRef {
    type Err = Error;

    /// Images mirrored into the local registry drop their `docker.io/` prefix, and an image
    /// without tag is `latest`.
    fn from_str(s: &str) -> Result<Self> {
        let image = s.trim();
        let image = image.strip_prefix(DOCKER_HUB_PREFIX).unwrap_or(image);

        let (name, reference) = match image.split_once('@') {
            Some((name, digest)) => (name, digest),
            None => match image.rsplit_once(':') {
                // A colon followed by a slash belongs to a registry host, not to a tag
                Some((name, tag)) if !tag.contains('/') => (name, tag),
                _ => (image, DEFAULT_TAG),
            },
        };

        ensure!(
            !name.is_empty() && !reference.is_empty(),
            "Invalid image reference '{s}'"
        );

        Ok(ImageRef {
            name: name.to_owned(),
            reference: reference.to_owned(),
        })
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_digest() {
            write!(f, "{}@{}", self.name, self.reference)
        } else {
            write!(f, "{}:{}", self.name, self.reference)
        }
    }
}
