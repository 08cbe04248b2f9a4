//! Loading-status reporting.
//!
//! The runtime module reports free-text status messages during instantiation.
//! Messages of the form `label(current/total)` are progress updates and drive a
//! progress indicator; everything else is plain text. Updates are deduplicated
//! and progress updates are rate limited so a tight download loop cannot thrash
//! the page layout.

/// Minimum spacing between two displayed progress updates.
pub const MIN_PROGRESS_INTERVAL_MS: f64 = 30.0;

/// Scale factor applied to parsed progress values so the indicator keeps
/// fractional headroom.
pub const PROGRESS_SCALE: f64 = 100.0;

/// What the spinner should do for a given update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerEffect {
    Show,
    Hide,
    Leave,
}

/// A classified status message, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// Progress update: show the indicator at `current` out of `total`
    /// (both already scaled by [`PROGRESS_SCALE`]) with `label` as the text.
    Progress {
        label: String,
        current: f64,
        total: f64,
    },
    /// Plain message: hide and clear the indicator, show the text.
    Text(String),
}

impl StatusUpdate {
    /// Classify a raw status message.
    pub fn parse(text: &str) -> StatusUpdate {
        match parse_progress(text) {
            Some(update) => update,
            None => StatusUpdate::Text(text.to_string()),
        }
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, StatusUpdate::Progress { .. })
    }

    /// Spinner visibility change implied by this update. A plain non-empty
    /// message leaves the spinner alone; only an empty message hides it.
    pub fn spinner_effect(&self) -> SpinnerEffect {
        match self {
            StatusUpdate::Progress { .. } => SpinnerEffect::Show,
            StatusUpdate::Text(text) if text.is_empty() => SpinnerEffect::Hide,
            StatusUpdate::Text(_) => SpinnerEffect::Leave,
        }
    }

    /// The text shown in the status element.
    pub fn display_text(&self) -> &str {
        match self {
            StatusUpdate::Progress { label, .. } => label,
            StatusUpdate::Text(text) => text,
        }
    }
}

/// Try to interpret `text` as `label(current/total)`. The label is the run of
/// non-`(` characters immediately before the parenthesis and must be
/// non-empty; `current` may be fractional, `total` is integral. Trailing text
/// after the closing parenthesis is ignored.
fn parse_progress(text: &str) -> Option<StatusUpdate> {
    for (i, _) in text.match_indices('(') {
        let label = match text[..i].rsplit('(').next() {
            Some(label) if !label.is_empty() => label,
            _ => continue,
        };
        if let Some((current, total)) = parse_ratio(&text[i + 1..]) {
            return Some(StatusUpdate::Progress {
                label: label.to_string(),
                current: current * PROGRESS_SCALE,
                total: total * PROGRESS_SCALE,
            });
        }
    }
    None
}

/// Parse `current/total)` from the start of `rest`.
fn parse_ratio(rest: &str) -> Option<(f64, f64)> {
    let (current, rest) = take_number(rest, true)?;
    let rest = rest.strip_prefix('/')?;
    let (total, rest) = take_number(rest, false)?;
    rest.strip_prefix(')')?;
    Some((current, total))
}

/// Take a leading decimal number off `s`. A fractional part is only accepted
/// when `allow_fraction` is set.
fn take_number(s: &str, allow_fraction: bool) -> Option<(f64, &str)> {
    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let mut end = digits;
    if allow_fraction && s[end..].starts_with('.') {
        let frac = s[end + 1..]
            .len()
            .saturating_sub(s[end + 1..].trim_start_matches(|c: char| c.is_ascii_digit()).len());
        if frac > 0 {
            end += 1 + frac;
        }
    }
    let value = s[..end].parse::<f64>().ok()?;
    Some((value, &s[end..]))
}

/// Last displayed message and its timestamp, used to suppress redundant or
/// too-frequent updates.
pub struct StatusState {
    last_text: String,
    last_time_ms: f64,
}

impl StatusState {
    pub fn new() -> Self {
        StatusState {
            last_text: String::new(),
            // Nothing displayed yet, so the rate limit must not trigger.
            last_time_ms: f64::NEG_INFINITY,
        }
    }

    /// Decide whether `text` should be displayed at time `now_ms`.
    ///
    /// Returns the update to apply, or `None` when it is suppressed. Identical
    /// consecutive messages are dropped; a progress update arriving within
    /// [`MIN_PROGRESS_INTERVAL_MS`] of the last displayed message is dropped
    /// without advancing the timestamp.
    pub fn update(&mut self, text: &str, now_ms: f64) -> Option<StatusUpdate> {
        if text == self.last_text {
            return None;
        }

        let update = StatusUpdate::parse(text);
        if update.is_progress() && now_ms - self.last_time_ms < MIN_PROGRESS_INTERVAL_MS {
            return None;
        }

        self.last_time_ms = now_ms;
        self.last_text = text.to_string();
        Some(update)
    }
}

impl Default for StatusState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message_is_scaled() {
        let update = StatusUpdate::parse("Downloading data... (45/100)");
        assert_eq!(
            update,
            StatusUpdate::Progress {
                label: "Downloading data... ".to_string(),
                current: 4500.0,
                total: 10000.0,
            }
        );
    }

    #[test]
    fn test_fractional_current_is_accepted() {
        let update = StatusUpdate::parse("fetch(2.5/8)");
        match update {
            StatusUpdate::Progress { current, total, .. } => {
                assert_eq!(current, 250.0);
                assert_eq!(total, 800.0);
            }
            other => panic!("expected progress, got {:?}", other),
        }
    }

    #[test]
    fn test_fractional_total_is_rejected() {
        assert!(!StatusUpdate::parse("fetch(2/8.5)").is_progress());
    }

    #[test]
    fn test_plain_message_is_text() {
        assert_eq!(
            StatusUpdate::parse("Running..."),
            StatusUpdate::Text("Running...".to_string())
        );
    }

    #[test]
    fn test_empty_label_is_not_progress() {
        assert!(!StatusUpdate::parse("(3/10)").is_progress());
    }

    #[test]
    fn test_spinner_effects() {
        assert_eq!(
            StatusUpdate::parse("load(1/2)").spinner_effect(),
            SpinnerEffect::Show
        );
        assert_eq!(
            StatusUpdate::parse("Ready").spinner_effect(),
            SpinnerEffect::Leave
        );
        assert_eq!(StatusUpdate::parse("").spinner_effect(), SpinnerEffect::Hide);
    }

    #[test]
    fn test_identical_messages_are_deduplicated() {
        let mut state = StatusState::new();
        assert!(state.update("Loading...", 0.0).is_some());
        assert!(state.update("Loading...", 1000.0).is_none());
    }

    #[test]
    fn test_progress_within_window_is_dropped() {
        let mut state = StatusState::new();
        assert!(state.update("fetch(1/10)", 100.0).is_some());
        assert!(state.update("fetch(2/10)", 120.0).is_none());
        // The drop must not advance the timestamp.
        assert!(state.update("fetch(3/10)", 131.0).is_some());
    }

    #[test]
    fn test_progress_outside_window_applies() {
        let mut state = StatusState::new();
        assert!(state.update("fetch(1/10)", 100.0).is_some());
        assert!(state.update("fetch(2/10)", 130.0).is_some());
    }

    #[test]
    fn test_first_progress_message_is_never_rate_limited() {
        let mut state = StatusState::new();
        assert!(state.update("fetch(0/10)", 0.0).is_some());
    }

    #[test]
    fn test_plain_messages_are_not_rate_limited() {
        let mut state = StatusState::new();
        assert!(state.update("one", 100.0).is_some());
        assert!(state.update("two", 101.0).is_some());
    }
}
