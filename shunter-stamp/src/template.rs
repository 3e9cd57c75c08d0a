//! Tag scanning and expansion.
//!
//! Placeholders between a start and end tag are replaced from a context
//! map. Unknown placeholders are preserved verbatim, tags included, so a
//! stamped file can be re-stamped with a richer context later.

use std::collections::HashMap;

/// Default start tag for stamping.
pub const DEFAULT_START_TAG: &str = "{{";
/// Default end tag for stamping.
pub const DEFAULT_END_TAG: &str = "}}";

/// Expand every `<start>NAME<end>` placeholder in `template` against `ctx`.
///
/// A start tag with no matching end tag is emitted verbatim through to the
/// end of input.
pub fn expand(template: &str, start_tag: &str, end_tag: &str, ctx: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let Some(start) = rest.find(start_tag) else {
            out.push_str(rest);
            return out;
        };

        out.push_str(&rest[..start]);
        let after_start = &rest[start + start_tag.len()..];

        let Some(end) = after_start.find(end_tag) else {
            // Unterminated tag: keep the remainder as-is.
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after_start[..end];
        match ctx.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str(start_tag);
                out.push_str(name);
                out.push_str(end_tag);
            }
        }

        rest = &after_start[end + end_tag.len()..];
    }
}

/// Expand `{NAME}` placeholders, the fixed single-brace regime used for
/// stamp-info substitution.
pub fn expand_single_brace(template: &str, ctx: &HashMap<String, String>) -> String {
    expand(template, "{", "}", ctx)
}
