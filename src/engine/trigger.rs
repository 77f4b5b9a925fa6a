//! Declarative attribute parsing.
//!
//! Two mini-languages feed the router:
//!
//! - the message-subscription attribute: a comma-separated list of message
//!   names (`push-swap="update, price"`);
//! - the framework's generic trigger attribute: comma-separated trigger
//!   entries, each an event name plus whitespace-separated modifiers, where
//!   the reserved `push:` prefix marks a push-message trigger instead of a
//!   DOM event (`trigger="click once, push:refresh"`).
//!
//! Both parse once at attach time into typed records; nothing is re-parsed
//! per message. Parsing is best-effort - malformed entries are skipped, the
//! rest of the list still applies.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::host::events::TRIGGER_PREFIX;

// ============================================================================
// TriggerTiming
// ============================================================================

/// Timing modifier on a DOM-event trigger.
///
/// Owned by the host's request rules; the engine only carries it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    /// Fire at most once.
    Once,
    /// Fire only when the observed value changed.
    Changed,
}

impl TriggerTiming {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "once" => Some(Self::Once),
            "changed" => Some(Self::Changed),
            _ => None,
        }
    }
}

// ============================================================================
// TriggerSpec
// ============================================================================

/// One parsed entry of a trigger attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSpec {
    /// Subscribe to a named push message.
    Push {
        /// The message name after the `push:` prefix.
        message: String,
    },
    /// An ordinary DOM-event trigger, handled by the host.
    Event {
        /// DOM event name.
        name: String,
        /// Optional timing modifier.
        timing: Option<TriggerTiming>,
    },
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a trigger attribute into typed entries.
///
/// Entries with an empty name (or a bare `push:` prefix) are dropped.
#[must_use]
pub fn parse_trigger_specs(value: &str) -> Vec<TriggerSpec> {
    value
        .split(',')
        .filter_map(|entry| parse_trigger_entry(entry.trim()))
        .collect()
}

fn parse_trigger_entry(entry: &str) -> Option<TriggerSpec> {
    let mut tokens = entry.split_whitespace();
    let name = tokens.next()?;

    if let Some(message) = name.strip_prefix(TRIGGER_PREFIX) {
        if message.is_empty() {
            debug!(entry, "trigger entry names no push message, skipping");
            return None;
        }
        return Some(TriggerSpec::Push {
            message: message.to_string(),
        });
    }

    // unknown modifiers belong to the host's richer syntax
    let timing = tokens.find_map(TriggerTiming::parse);
    Some(TriggerSpec::Event {
        name: name.to_string(),
        timing,
    })
}

/// Parses a comma-separated message-name list.
///
/// Names are trimmed; empty entries are dropped.
#[must_use]
pub fn parse_message_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_names() {
        assert_eq!(
            parse_message_names("update, price ,tick"),
            vec!["update", "price", "tick"]
        );
    }

    #[test]
    fn test_parse_message_names_skips_empty() {
        assert_eq!(parse_message_names("update,,  ,price"), vec!["update", "price"]);
        assert!(parse_message_names("").is_empty());
    }

    #[test]
    fn test_parse_push_trigger() {
        let specs = parse_trigger_specs("push:refresh");
        assert_eq!(
            specs,
            vec![TriggerSpec::Push {
                message: "refresh".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_mixed_triggers() {
        let specs = parse_trigger_specs("click once, push:refresh, keyup changed");
        assert_eq!(
            specs,
            vec![
                TriggerSpec::Event {
                    name: "click".to_string(),
                    timing: Some(TriggerTiming::Once),
                },
                TriggerSpec::Push {
                    message: "refresh".to_string()
                },
                TriggerSpec::Event {
                    name: "keyup".to_string(),
                    timing: Some(TriggerTiming::Changed),
                },
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let specs = parse_trigger_specs("push:, , click");
        assert_eq!(
            specs,
            vec![TriggerSpec::Event {
                name: "click".to_string(),
                timing: None,
            }]
        );
    }

    #[test]
    fn test_unknown_modifiers_ignored() {
        let specs = parse_trigger_specs("click delay:500ms once");
        assert_eq!(
            specs,
            vec![TriggerSpec::Event {
                name: "click".to_string(),
                timing: Some(TriggerTiming::Once),
            }]
        );
    }
}
