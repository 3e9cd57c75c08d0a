//! Container image resolution.
//!
//! Walks each document looking for container-shaped keys and substitutes
//! logical image names with canonical references from an image map. An
//! `image` that is still a `//`-prefixed build label after resolution is a
//! hard error.

use std::collections::HashMap;
use std::io::{Read, Write};

use serde_yaml::{Mapping, Value};

use crate::error::TransformError;
use crate::stream::{transform_stream, DocVerdict};

/// Read multi-document YAML from `input`, substitute container image
/// references using `images`, and write the result to `output`.
pub fn resolve_images<R, W>(
    input: R,
    output: W,
    images: &HashMap<String, String>,
) -> Result<(), TransformError>
where
    R: Read,
    W: Write,
{
    let resolver = ImageResolver { images };
    transform_stream(input, output, |doc| {
        resolver.find_and_replace_tag(doc)?;
        Ok(DocVerdict::Keep)
    })
}

struct ImageResolver<'a> {
    images: &'a HashMap<String, String>,
}

const SINGLE_KEYS: [&str; 2] = ["container", "spec"];
const LIST_KEYS: [&str; 2] = ["containers", "initContainers"];

impl ImageResolver<'_> {
    fn find_and_replace_tag(&self, obj: &mut Mapping) -> Result<(), TransformError> {
        // `found` is overwritten, not OR'd, on each key check: the
        // recursion gate reflects only the last of the four keys. This
        // replicates the legacy traversal and is covered by fixtures.
        let mut found = false;

        for key in SINGLE_KEYS {
            found = obj.contains_key(key);
            if found {
                self.update_container(obj, key)?;
            }
        }

        for key in LIST_KEYS {
            found = obj.contains_key(key);
            if found {
                self.update_containers(obj, key)?;
            }
        }

        if !found {
            return self.descend(obj);
        }

        Ok(())
    }

    /// Single-container shape: the unresolved-label check runs before the
    /// image-map lookup.
    fn update_container(&self, obj: &mut Mapping, key: &str) -> Result<(), TransformError> {
        let Some(Value::Mapping(container)) = obj.get_mut(key) else {
            return Ok(());
        };

        let Some(image) = container.get("image").and_then(Value::as_str) else {
            return Ok(());
        };
        let image = image.to_string();

        if image.starts_with("//") {
            return Err(TransformError::UnresolvedImage(image));
        }

        if let Some(reference) = self.images.get(&image) {
            container.insert(Value::from("image"), Value::from(reference.clone()));
        }

        Ok(())
    }

    /// List shape: the image-map lookup runs before the unresolved-label
    /// check, so a mapped `//`-label is substituted rather than flagged.
    fn update_containers(&self, obj: &mut Mapping, key: &str) -> Result<(), TransformError> {
        let Some(Value::Sequence(containers)) = obj.get_mut(key) else {
            return Ok(());
        };

        for item in containers {
            let Some(container) = item.as_mapping_mut() else {
                continue;
            };

            let Some(image) = container.get("image").and_then(Value::as_str) else {
                continue;
            };
            let image = image.to_string();

            if let Some(reference) = self.images.get(&image) {
                container.insert(Value::from("image"), Value::from(reference.clone()));
                continue;
            }

            if image.starts_with("//") {
                return Err(TransformError::UnresolvedImage(image));
            }
        }

        Ok(())
    }

    fn descend(&self, obj: &mut Mapping) -> Result<(), TransformError> {
        for (_key, value) in obj.iter_mut() {
            match value {
                Value::Mapping(child) => self.find_and_replace_tag(child)?,
                Value::Sequence(items) => {
                    for item in items {
                        if let Value::Mapping(child) = item {
                            self.find_and_replace_tag(child)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
