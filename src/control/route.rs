//! Address parsing
//!
//! Resolves an address into a typed [`Route`] without allocating. Addresses
//! are either global (`/frame_number`), scoped to this node
//! (`/client/<id>/show_stats`), or scoped to one of its outputs
//! (`/client/<id>/output/<name>/crop/x`). The returned paths borrow from the
//! input and carry no leading or trailing slash.

use std::fmt;

/// Segment introducing a node-scoped address
pub const CLIENT_SCOPE: &str = "client";
/// Segment introducing an output-scoped address inside the client scope
pub const OUTPUT_SCOPE: &str = "output";

/// Where a message should be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Node-level handler with the remaining path
    Node { path: &'a str },
    /// Output-level handler for output `name` with the remaining path
    Output { name: &'a str, path: &'a str },
}

/// Why an address could not be routed to this node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Nothing left after trimming
    Empty,
    /// Client scope without an identifier
    MissingClientId,
    /// Client scope addressed to a different node
    OtherClient(String),
    /// Output scope without an output name
    MissingOutputName,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Empty => write!(f, "empty address"),
            RouteError::MissingClientId => write!(f, "client scope without an id"),
            RouteError::OtherClient(id) => write!(f, "addressed to client {}", id),
            RouteError::MissingOutputName => write!(f, "output scope without a name"),
        }
    }
}

impl std::error::Error for RouteError {}

/// Split off the first non-empty segment, returning it and the rest
fn next_segment(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start_matches('/');
    if s.is_empty() {
        return None;
    }
    Some(match s.find('/') {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    })
}

fn clean_path(s: &str) -> &str {
    s.trim_matches('/')
}

/// Resolve `address` for the node identified by `client_id`
pub fn parse_route<'a>(address: &'a str, client_id: &str) -> Result<Route<'a>, RouteError> {
    let address = address.trim_matches(|c: char| c == ' ' || c == '\t');
    let (first, rest) = next_segment(address).ok_or(RouteError::Empty)?;

    if first != CLIENT_SCOPE {
        return Ok(Route::Node {
            path: clean_path(address),
        });
    }

    let (id, rest) = next_segment(rest).ok_or(RouteError::MissingClientId)?;
    if id != client_id {
        return Err(RouteError::OtherClient(id.to_string()));
    }

    match next_segment(rest) {
        Some((OUTPUT_SCOPE, after)) => {
            let (name, path) = next_segment(after).ok_or(RouteError::MissingOutputName)?;
            Ok(Route::Output {
                name,
                path: clean_path(path),
            })
        }
        _ => Ok(Route::Node {
            path: clean_path(rest),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_address() {
        assert_eq!(
            parse_route("/frame_number", "abc"),
            Ok(Route::Node { path: "frame_number" })
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(
            parse_route(" \t/frame_reset\t ", "abc"),
            Ok(Route::Node { path: "frame_reset" })
        );
    }

    #[test]
    fn test_client_scope() {
        assert_eq!(
            parse_route("/client/abc/show_stats", "abc"),
            Ok(Route::Node { path: "show_stats" })
        );
    }

    #[test]
    fn test_other_client_is_rejected() {
        assert_eq!(
            parse_route("/client/xyz/show_stats", "abc"),
            Err(RouteError::OtherClient("xyz".to_string()))
        );
        assert_eq!(parse_route("/client", "abc"), Err(RouteError::MissingClientId));
    }

    #[test]
    fn test_output_scope() {
        assert_eq!(
            parse_route("/client/abc/output/A/crop/x", "abc"),
            Ok(Route::Output { name: "A", path: "crop/x" })
        );
        assert_eq!(
            parse_route("/client/abc/output", "abc"),
            Err(RouteError::MissingOutputName)
        );
    }

    #[test]
    fn test_output_scope_only_inside_client() {
        assert_eq!(
            parse_route("/output/A/crop/x", "abc"),
            Ok(Route::Node { path: "output/A/crop/x" })
        );
    }

    #[test]
    fn test_empty_address() {
        assert_eq!(parse_route("  ", "abc"), Err(RouteError::Empty));
        assert_eq!(parse_route("///", "abc"), Err(RouteError::Empty));
    }
}
