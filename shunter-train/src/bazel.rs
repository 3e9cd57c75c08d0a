//! Build-query client: typed records for `cquery --output=jsonproto` and
//! the expression builders composed from configuration.

use std::process::Command;

use serde::Deserialize;

use crate::config::Config;
use crate::error::TrainError;

// ---------------------------------------------------------------------------
// Query schema
// ---------------------------------------------------------------------------

/// Result set of one `cquery --output=jsonproto` invocation. Unknown
/// fields, including unknown attribute names, are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CqueryResult {
    #[serde(default)]
    pub results: Vec<ConfiguredTarget>,
}

/// One configured target from the result set.
#[derive(Debug, Default, Deserialize)]
pub struct ConfiguredTarget {
    #[serde(default)]
    pub target: QueryTarget,
}

/// Rule information for one configured target.
#[derive(Debug, Default, Deserialize)]
pub struct QueryTarget {
    #[serde(default)]
    pub rule: QueryRule,
}

/// Name and attributes of a rule.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attribute: Vec<QueryAttribute>,
}

/// A single attribute name/value pair.
#[derive(Debug, Default, Deserialize)]
pub struct QueryAttribute {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "stringValue")]
    pub string_value: String,
}

// ---------------------------------------------------------------------------
// Query execution
// ---------------------------------------------------------------------------

/// Run `<bazel_cmd> cquery --output=jsonproto <query>` and parse the
/// payload.
///
/// The payload is read from stdout; on failure the tool's stderr is
/// surfaced in the error. A payload the schema does not match is a fatal
/// parse error.
pub fn cquery(bazel_cmd: &str, query: &str) -> Result<CqueryResult, TrainError> {
    tracing::info!(cmd = bazel_cmd, query, "running build query");

    let out = Command::new(bazel_cmd)
        .args(["cquery", "--output=jsonproto", query])
        .output()
        .map_err(|err| TrainError::Query {
            stderr: format!("spawning {bazel_cmd}: {err}"),
        })?;

    if !out.status.success() {
        return Err(TrainError::Query {
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        });
    }

    Ok(serde_json::from_slice(&out.stdout)?)
}

/// Rule names of all results, skipping unnamed entries.
pub fn extract_target_names(qr: &CqueryResult) -> Vec<String> {
    qr.results
        .iter()
        .filter(|r| !r.target.rule.name.is_empty())
        .map(|r| r.target.rule.name.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Query builders
// ---------------------------------------------------------------------------

/// Expression selecting deployment targets matching the configured rule
/// kinds: the ` + `-join of `kind("K", <target>)` per kind, or the raw
/// target pattern when no kinds are configured.
pub fn build_kind_query(cfg: &Config) -> String {
    if cfg.gitops_kinds.is_empty() {
        return cfg.target.clone();
    }

    cfg.gitops_kinds
        .iter()
        .map(|kind| format!("kind(\"{kind}\", {})", cfg.target))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Expression selecting image push targets: the ` + `-join of the
/// Cartesian product `kind("R", deps(T))` over targets and configured rule
/// names. Empty when no rule names (or no targets) are configured, which
/// callers treat as "nothing to push".
pub fn build_deps_query(targets: &[String], cfg: &Config) -> String {
    if cfg.gitops_rule_names.is_empty() {
        return String::new();
    }

    targets
        .iter()
        .flat_map(|target| {
            cfg.gitops_rule_names
                .iter()
                .map(move |rule| format!("kind(\"{rule}\", deps({target}))"))
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::trains::tests::test_config;

    #[test]
    fn parses_jsonproto_schema() {
        let raw = r#"{
            "results": [
                {
                    "target": {
                        "rule": {
                            "name": "//pkg:deploy",
                            "attribute": [
                                {"name": "deployment_branch", "stringValue": "prod"},
                                {"name": "release_branch_prefix", "stringValue": "release/v1"}
                            ]
                        }
                    }
                },
                {
                    "target": {
                        "rule": {
                            "name": "//pkg:staging",
                            "attribute": [
                                {"name": "deployment_branch", "stringValue": "staging"},
                                {"name": "release_branch_prefix", "stringValue": "release/v1"}
                            ]
                        }
                    }
                }
            ]
        }"#;

        let qr: CqueryResult = serde_json::from_str(raw).unwrap();
        assert_eq!(qr.results.len(), 2);

        let first = &qr.results[0].target.rule;
        assert_eq!(first.name, "//pkg:deploy");
        assert_eq!(first.attribute.len(), 2);
        assert_eq!(first.attribute[0].name, "deployment_branch");
        assert_eq!(first.attribute[0].string_value, "prod");
    }

    #[test]
    fn parses_empty_results() {
        let qr: CqueryResult = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(qr.results.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let raw = r#"{
            "results": [
                {
                    "target": {
                        "rule": {
                            "name": "//a:d",
                            "ruleClass": "gitops",
                            "attribute": [
                                {"name": "visibility", "listValue": ["//visibility:public"]}
                            ]
                        }
                    }
                }
            ],
            "version": "6.0"
        }"#;

        let qr: CqueryResult = serde_json::from_str(raw).unwrap();
        assert_eq!(qr.results[0].target.rule.name, "//a:d");
    }

    #[test]
    fn extract_target_names_skips_unnamed() {
        let raw = r#"{"results": [
            {"target": {"rule": {"name": "//a:push"}}},
            {"target": {"rule": {"name": "//b:push"}}},
            {"target": {"rule": {"name": ""}}}
        ]}"#;
        let qr: CqueryResult = serde_json::from_str(raw).unwrap();

        assert_eq!(
            extract_target_names(&qr),
            vec!["//a:push".to_string(), "//b:push".to_string()]
        );
    }

    #[test]
    fn kind_query_without_kinds_is_the_raw_target() {
        let mut cfg = test_config();
        cfg.target = "//deploy/...".to_string();
        cfg.gitops_kinds = vec![];

        assert_eq!(build_kind_query(&cfg), "//deploy/...");
    }

    #[test]
    fn kind_query_joins_kinds_with_plus() {
        let mut cfg = test_config();
        cfg.target = "//deploy/...".to_string();
        cfg.gitops_kinds = vec!["gitops".to_string(), "k8s_deploy".to_string()];

        assert_eq!(
            build_kind_query(&cfg),
            r#"kind("gitops", //deploy/...) + kind("k8s_deploy", //deploy/...)"#
        );
    }

    #[rstest]
    #[case::single(
        &["//pkg:deploy"], &["push_image"],
        r#"kind("push_image", deps(//pkg:deploy))"#
    )]
    #[case::two_targets(
        &["//a:deploy", "//b:deploy"], &["push_image"],
        r#"kind("push_image", deps(//a:deploy)) + kind("push_image", deps(//b:deploy))"#
    )]
    #[case::two_rules(
        &["//a:deploy"], &["push", "upload"],
        r#"kind("push", deps(//a:deploy)) + kind("upload", deps(//a:deploy))"#
    )]
    #[case::no_rules(&["//a:deploy"], &[], "")]
    #[case::no_targets(&[], &["push_image"], "")]
    fn deps_query_cases(
        #[case] targets: &[&str],
        #[case] rule_names: &[&str],
        #[case] want: &str,
    ) {
        let mut cfg = test_config();
        cfg.gitops_rule_names = rule_names.iter().map(|s| s.to_string()).collect();
        let targets: Vec<String> = targets.iter().map(|s| s.to_string()).collect();

        assert_eq!(build_deps_query(&targets, &cfg), want);
    }
}
