//! Streaming multi-document YAML processing.
//!
//! Documents are decoded one at a time, validated, handed to a rewrite
//! pass, and re-emitted with a `---` separator strictly *between*
//! documents. Null documents are skipped; every surviving document keeps
//! its key order, so an identity rewrite round-trips structurally.

use std::io::{Read, Write};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::TransformError;

/// What a rewrite pass decided about one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocVerdict {
    /// Emit the (possibly rewritten) document.
    Keep,
    /// Drop the document from the output entirely.
    Drop,
}

/// Decode every document of `input`, apply `transform`, and write the kept
/// documents to `output`.
///
/// Each document must carry a non-empty `kind` and `metadata.name`;
/// anything else is a hard error naming the offending object.
pub fn transform_stream<R, W, F>(
    input: R,
    mut output: W,
    mut transform: F,
) -> Result<(), TransformError>
where
    R: Read,
    W: Write,
    F: FnMut(&mut Mapping) -> Result<DocVerdict, TransformError>,
{
    let mut first = true;

    for document in serde_yaml::Deserializer::from_reader(input) {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let mut doc = match value {
            Value::Mapping(map) => map,
            other => return Err(TransformError::NotAMapping(format!("{other:?}"))),
        };

        validate_document(&doc)?;

        if transform(&mut doc)? == DocVerdict::Drop {
            continue;
        }

        if first {
            first = false;
        } else {
            output.write_all(b"---\n")?;
        }

        let text = serde_yaml::to_string(&Value::Mapping(doc))?;
        output.write_all(text.as_bytes())?;
    }

    Ok(())
}

/// Decode all documents of `raw` into mappings, skipping null documents.
/// Useful for structural comparisons in tests and callers that need the
/// whole stream at once.
pub fn decode_all_docs(raw: &[u8]) -> Result<Vec<Mapping>, TransformError> {
    let mut docs = Vec::new();

    for document in serde_yaml::Deserializer::from_slice(raw) {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        match value {
            Value::Mapping(map) => docs.push(map),
            other => return Err(TransformError::NotAMapping(format!("{other:?}"))),
        }
    }

    Ok(docs)
}

fn validate_document(doc: &Mapping) -> Result<(), TransformError> {
    if extract_name(doc).is_empty() {
        return Err(TransformError::MissingName(format!("{doc:?}")));
    }
    if extract_kind(doc).is_empty() {
        return Err(TransformError::MissingKind(format!("{doc:?}")));
    }
    Ok(())
}

/// `metadata.name` of a document, or `""` when absent or not a string.
pub(crate) fn extract_name(doc: &Mapping) -> &str {
    doc.get("metadata")
        .and_then(Value::as_mapping)
        .and_then(|metadata| metadata.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// `kind` of a document, or `""` when absent or not a string.
pub(crate) fn extract_kind(doc: &Mapping) -> &str {
    doc.get("kind").and_then(Value::as_str).unwrap_or("")
}

/// `apiVersion` of a document, or `""` when absent or not a string.
pub(crate) fn extract_api_version(doc: &Mapping) -> &str {
    doc.get("apiVersion").and_then(Value::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(input: &str) -> Result<String, TransformError> {
        let mut out = Vec::new();
        transform_stream(input.as_bytes(), &mut out, |_| Ok(DocVerdict::Keep))?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert_eq!(identity("").unwrap(), "");
    }

    #[test]
    fn null_documents_are_skipped() {
        assert_eq!(identity("---\n").unwrap(), "");
    }

    #[test]
    fn single_document_has_no_separator() {
        let input = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm\ndata:\n  k: v\n";
        let out = identity(input).unwrap();
        assert!(!out.contains("---"));

        let docs = decode_all_docs(out.as_bytes()).unwrap();
        assert_eq!(docs, decode_all_docs(input.as_bytes()).unwrap());
    }

    #[test]
    fn separator_goes_strictly_between_documents() {
        let input = "kind: ConfigMap\nmetadata:\n  name: a\n---\nkind: ConfigMap\nmetadata:\n  name: b\n";
        let out = identity(input).unwrap();

        assert!(!out.starts_with("---"));
        assert!(!out.trim_end().ends_with("---"));
        assert_eq!(out.matches("---\n").count(), 1);
        assert_eq!(decode_all_docs(out.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn missing_name_is_a_hard_error() {
        let input = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  namespace: default\n";
        let err = identity(input).unwrap_err();
        assert!(err.to_string().contains("missing metadata.name"));
    }

    #[test]
    fn missing_kind_is_a_hard_error() {
        let input = "apiVersion: v1\nmetadata:\n  name: test\n";
        let err = identity(input).unwrap_err();
        assert!(err.to_string().contains("missing kind"));
    }

    #[test]
    fn drop_verdict_removes_the_document() {
        let input = "kind: Keep\nmetadata:\n  name: a\n---\nkind: Drop\nmetadata:\n  name: b\n";
        let mut out = Vec::new();
        transform_stream(input.as_bytes(), &mut out, |doc| {
            if extract_kind(doc) == "Drop" {
                Ok(DocVerdict::Drop)
            } else {
                Ok(DocVerdict::Keep)
            }
        })
        .unwrap();

        let docs = decode_all_docs(&out).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(extract_kind(&docs[0]), "Keep");
    }

    #[test]
    fn key_order_is_preserved() {
        let input = "zeta: 1\nkind: ConfigMap\nalpha: 2\nmetadata:\n  name: cm\n";
        let out = identity(input).unwrap();

        let zeta = out.find("zeta").unwrap();
        let kind = out.find("kind").unwrap();
        let alpha = out.find("alpha").unwrap();
        assert!(zeta < kind && kind < alpha, "key order changed:\n{out}");
    }
}
