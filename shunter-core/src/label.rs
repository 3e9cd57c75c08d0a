//! Build-label to executable-path projection.

/// Convert a build label like `//pkg:name` to the corresponding
/// `bazel-bin` executable path. Non-label inputs are returned unchanged.
///
/// This is a textual projection, not a lookup: `//` becomes `bazel-bin/`
/// and the first `:` becomes `/`.
pub fn target_to_executable(target: &str) -> String {
    let Some(rest) = target.strip_prefix("//") else {
        return target.to_string();
    };

    format!("bazel-bin/{}", rest.replacen(':', "/", 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_maps_to_bazel_bin_path() {
        assert_eq!(target_to_executable("//pkg:name"), "bazel-bin/pkg/name");
        assert_eq!(
            target_to_executable("//deploy/api:gitops"),
            "bazel-bin/deploy/api/gitops"
        );
    }

    #[test]
    fn only_first_colon_is_replaced() {
        assert_eq!(target_to_executable("//a:b:c"), "bazel-bin/a/b:c");
    }

    #[test]
    fn non_label_is_unchanged() {
        assert_eq!(target_to_executable("bin/tool"), "bin/tool");
        assert_eq!(target_to_executable(""), "");
    }
}
