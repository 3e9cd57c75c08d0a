//! Target lists embedded in commit messages.
//!
//! A deployment commit records the exact set of targets that produced it
//! between two literal marker lines, so the next run can detect retracted
//! targets by parsing the previous commit message.

const BEGIN_MARKER: &str = "--- gitops targets begin ---";
const END_MARKER: &str = "--- gitops targets end ---";

/// Produce a commit message section listing `targets` between the markers.
pub fn generate(targets: &[String]) -> String {
    let mut msg = String::new();
    msg.push('\n');
    msg.push_str(BEGIN_MARKER);
    msg.push('\n');
    for target in targets {
        msg.push_str(target);
        msg.push('\n');
    }
    msg.push_str(END_MARKER);
    msg.push('\n');
    msg
}

/// Extract the list of targets between the markers of `message`.
///
/// Text outside the marker pair is ignored. A begin marker with no matching
/// end marker yields an empty list with a warning; callers treat that the
/// same as "no previous targets".
pub fn extract(message: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut between_markers = false;

    for line in message.split('\n') {
        match line {
            BEGIN_MARKER => between_markers = true,
            END_MARKER => between_markers = false,
            _ => {
                if between_markers {
                    targets.push(line.to_string());
                }
            }
        }
    }

    if between_markers {
        tracing::warn!("unable to find end marker in commit message");
        return Vec::new();
    }

    targets
}
