//! Case-insensitive dependency name patterns
//!
//! `*` matches any run of characters (including none). Every other character,
//! `.` included, matches itself literally.

/// Returns true if `candidate` matches `pattern`, ignoring case
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let candidate = candidate.to_lowercase();

    if !pattern.contains('*') {
        return pattern == candidate;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return true,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return pattern == candidate,
    };

    if candidate.len() < first.len() + last.len() {
        return false;
    }
    if !candidate.starts_with(first) || !candidate.ends_with(last) {
        return false;
    }

    // Each literal between wildcards must appear, in order, in the remaining window
    let mut window = &candidate[first.len()..candidate.len() - last.len()];
    for part in middle.iter().filter(|p| !p.is_empty()) {
        match window.find(part) {
            Some(index) => window = &window[index + part.len()..],
            None => return false,
        }
    }

    true
}
