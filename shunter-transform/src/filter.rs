//! Integration-test manifest filter.
//!
//! Makes a manifest stream safe to apply in a throwaway test cluster:
//! persistent storage becomes ephemeral, ingresses disappear, and
//! certificates move to the staging issuer.

use std::io::{Read, Write};

use serde_yaml::{Mapping, Value};

use crate::error::TransformError;
use crate::stream::{extract_api_version, extract_kind, extract_name, transform_stream, DocVerdict};

/// Read multi-document YAML from `input` and write the filtered stream to
/// `output`:
///
/// - `PersistentVolumeClaim` and `Ingress` documents are dropped;
/// - `StatefulSet` (`apps/v1`) claim templates become `emptyDir` volumes;
/// - `Certificate` issuers move from `letsencrypt-prod` to
///   `letsencrypt-staging`;
/// - any remaining `persistentVolumeClaim` volume source becomes an empty
///   `emptyDir`.
pub fn replace_persistent_storage<R, W>(input: R, output: W) -> Result<(), TransformError>
where
    R: Read,
    W: Write,
{
    transform_stream(input, output, |doc| {
        let kind = extract_kind(doc).to_string();
        match kind.as_str() {
            "PersistentVolumeClaim" | "Ingress" => return Ok(DocVerdict::Drop),
            "StatefulSet" if extract_api_version(doc) == "apps/v1" => {
                process_stateful_set(doc);
            }
            "Certificate" => replace_issuer_name(doc),
            _ => {}
        }

        find_and_replace_pvc(doc);
        Ok(DocVerdict::Keep)
    })
}

/// Convert each `spec.volumeClaimTemplates` entry into an `emptyDir`
/// volume on `spec.template.spec.volumes`, then drop the claim templates
/// and the top-level `status`.
fn process_stateful_set(obj: &mut Mapping) {
    let claim_templates: Vec<Value> = match obj
        .get("spec")
        .and_then(Value::as_mapping)
        .and_then(|spec| spec.get("volumeClaimTemplates"))
        .and_then(Value::as_sequence)
    {
        Some(templates) if !templates.is_empty() => templates.clone(),
        _ => return,
    };

    let Some(Value::Mapping(spec)) = obj.get_mut("spec") else {
        return;
    };

    {
        let Some(Value::Mapping(template)) = spec.get_mut("template") else {
            return;
        };
        let Some(Value::Mapping(tpl_spec)) = template.get_mut("spec") else {
            return;
        };

        let mut volumes: Vec<Value> = match tpl_spec.get("volumes").and_then(Value::as_sequence) {
            Some(volumes) => volumes.clone(),
            None => Vec::new(),
        };

        // Existing volumes by name, so a claim template with the same name
        // replaces the volume at its index instead of appending.
        let existing: Vec<Option<String>> = volumes
            .iter()
            .map(|vol| {
                vol.as_mapping()
                    .and_then(|m| m.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect();

        for template in &claim_templates {
            let Some(template) = template.as_mapping() else {
                continue;
            };

            let name = extract_name(template);
            if name.is_empty() {
                continue;
            }

            let mut empty_dir = Mapping::new();
            if let Some(storage) = storage_request(template) {
                empty_dir.insert(Value::from("sizeLimit"), Value::from(storage));
            }

            let mut volume = Mapping::new();
            volume.insert(Value::from("name"), Value::from(name));
            volume.insert(Value::from("emptyDir"), Value::Mapping(empty_dir));
            let volume = Value::Mapping(volume);

            match existing.iter().position(|n| n.as_deref() == Some(name)) {
                Some(idx) => volumes[idx] = volume,
                None => volumes.push(volume),
            }
        }

        tpl_spec.insert(Value::from("volumes"), Value::Sequence(volumes));
    }

    spec.remove("volumeClaimTemplates");
    obj.remove("status");
}

/// `spec.resources.requests.storage` of a claim template, when set.
fn storage_request(template: &Mapping) -> Option<String> {
    template
        .get("spec")
        .and_then(Value::as_mapping)
        .and_then(|spec| spec.get("resources"))
        .and_then(Value::as_mapping)
        .and_then(|resources| resources.get("requests"))
        .and_then(Value::as_mapping)
        .and_then(|requests| requests.get("storage"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Swap the production ACME issuer for the staging one.
fn replace_issuer_name(obj: &mut Mapping) {
    let Some(Value::Mapping(spec)) = obj.get_mut("spec") else {
        return;
    };
    let Some(Value::Mapping(issuer_ref)) = spec.get_mut("issuerRef") else {
        return;
    };

    if issuer_ref.get("name").and_then(Value::as_str) == Some("letsencrypt-prod") {
        issuer_ref.insert(Value::from("name"), Value::from("letsencrypt-staging"));
    }
}

/// Replace any `persistentVolumeClaim` key with an empty `emptyDir` at the
/// same level. Replaced nodes are not recursed into; traversal descends
/// through map values and sequence-of-map items only.
fn find_and_replace_pvc(obj: &mut Mapping) {
    if obj.contains_key("persistentVolumeClaim") {
        obj.remove("persistentVolumeClaim");
        obj.insert(Value::from("emptyDir"), Value::Mapping(Mapping::new()));
        return;
    }

    for (_key, value) in obj.iter_mut() {
        match value {
            Value::Mapping(child) => find_and_replace_pvc(child),
            Value::Sequence(items) => {
                for item in items {
                    if let Value::Mapping(child) = item {
                        find_and_replace_pvc(child);
                    }
                }
            }
            _ => {}
        }
    }
}
