//! Response routing
//!
//! Every line the receive task frames is handed here, in receipt order.
//! The router decides whether the line answers the currently pending
//! command and, if so, publishes it to the waiting correlator. Everything
//! else is unsolicited and only fans out as a `LineReceived` event, so a
//! stale or device-initiated line can never be stored as a correlated
//! response (and therefore never mis-attributed to a later command).

use crate::client::Inner;
use crate::events::ClientEvent;
use cvx_core::{ERROR_TOKEN, FIELD_SEPARATOR, TELEMETRY_MARKER};

/// Check whether a tokenized line answers the pending command.
///
/// Two rules, tried in order:
/// 1. failure reply: first field is `ER` and the second names the
///    pending command
/// 2. success reply: first field is the pending command itself
///
/// With no command pending, nothing correlates.
pub(crate) fn correlates(pending: Option<&str>, fields: &[String]) -> bool {
    let Some(pending) = pending else {
        return false;
    };
    if fields.first().map(String::as_str) == Some(ERROR_TOKEN) {
        return fields.get(1).map(String::as_str) == Some(pending);
    }
    fields.first().map(String::as_str) == Some(pending)
}

/// Route one framed line.
///
/// Telemetry lines (leading `{`) skip correlation entirely. The
/// `LineReceived` event is published for every line, after correlation
/// handling; broadcast delivery cannot fail into this path.
pub(crate) fn route_line(inner: &Inner, line: String) {
    log::debug!("recv: {line}");

    if !line.starts_with(TELEMETRY_MARKER) {
        let fields: Vec<String> = line.split(FIELD_SEPARATOR).map(str::to_string).collect();
        // The pending guard stays held across the store, so the matched
        // command cannot release admission (and a successor be admitted)
        // between the match and the fields landing in the slot.
        let pending = inner.lock_pending();
        if correlates(pending.as_deref(), &fields) {
            *inner.lock_response() = Some(fields);
            inner.response_notify.notify_one();
        }
        drop(pending);
    }

    inner.emit(ClientEvent::LineReceived(line));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<String> {
        line.split(',').map(str::to_string).collect()
    }

    #[test]
    fn test_success_reply_matches_pending_token() {
        assert!(correlates(Some("RM"), &fields("RM,1")));
        assert!(correlates(Some("T1"), &fields("T1")));
    }

    #[test]
    fn test_error_reply_matches_on_second_field() {
        assert!(correlates(Some("PW"), &fields("ER,PW,3")));
        // ER reply for a different command is unsolicited
        assert!(!correlates(Some("PW"), &fields("ER,RM,3")));
    }

    #[test]
    fn test_foreign_line_does_not_match() {
        assert!(!correlates(Some("RM"), &fields("PR,1,5")));
    }

    #[test]
    fn test_nothing_matches_without_pending_command() {
        assert!(!correlates(None, &fields("RM,1")));
        assert!(!correlates(None, &fields("ER,RM,3")));
    }

    #[test]
    fn test_error_token_alone_never_matches_as_success() {
        // A bare "ER" line has no command field to match against
        assert!(!correlates(Some("RM"), &fields("ER")));
    }
}
