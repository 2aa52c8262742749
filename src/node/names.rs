//! Name validation and topic resolution.
//!
//! Tokens (node names, namespace and topic segments) are
//! `[A-Za-z_][A-Za-z0-9_]*`. Namespaces are absolute. Relative topic names
//! are resolved against the node's namespace.

use crate::utils::{Result, TalkerError};

fn check_token(kind: &'static str, whole: &str, token: &str) -> Result<()> {
    let invalid = |reason| {
        Err(TalkerError::InvalidName {
            kind,
            name: whole.to_string(),
            reason,
        })
    };

    let mut chars = token.chars();
    match chars.next() {
        None => return invalid("must not contain empty segments"),
        Some(c) if c.is_ascii_digit() => return invalid("must not start with a digit"),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return invalid("may only contain letters, digits and underscores");
        }
        Some(_) => {}
    }
    if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return invalid("may only contain letters, digits and underscores");
    }
    Ok(())
}

pub fn validate_node_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TalkerError::InvalidName {
            kind: "node",
            name: String::new(),
            reason: "must not be empty",
        });
    }
    check_token("node", name, name)
}

pub fn validate_namespace(namespace: &str) -> Result<()> {
    let Some(rest) = namespace.strip_prefix('/') else {
        return Err(TalkerError::InvalidName {
            kind: "namespace",
            name: namespace.to_string(),
            reason: "must start with '/'",
        });
    };
    if rest.is_empty() {
        return Ok(());
    }
    rest.split('/')
        .try_for_each(|segment| check_token("namespace", namespace, segment))
}

/// Resolves `topic` against `namespace` and returns the absolute topic name.
pub fn resolve_topic(namespace: &str, topic: &str) -> Result<String> {
    let invalid = |reason| TalkerError::InvalidName {
        kind: "topic",
        name: topic.to_string(),
        reason,
    };

    if topic.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if topic.starts_with('~') {
        return Err(invalid("private names are not supported"));
    }

    let resolved = if topic.starts_with('/') {
        topic.to_string()
    } else if namespace == "/" {
        format!("/{topic}")
    } else {
        format!("{namespace}/{topic}")
    };

    resolved[1..]
        .split('/')
        .try_for_each(|segment| check_token("topic", topic, segment))?;
    Ok(resolved)
}
