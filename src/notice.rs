use std::time::{Duration, Instant};

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    shown_at: Instant,
}

/// Transient notices. Each one disappears a fixed interval after it was shown.
#[derive(Debug)]
pub struct Notices {
    ttl: Duration,
    items: Vec<Notice>,
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Notices {
            ttl,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.push_at(kind, text, Instant::now());
    }

    pub fn push_at(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) {
        self.items.push(Notice {
            kind,
            text: text.into(),
            shown_at: now,
        });
    }

    /// Drop notices older than the TTL. Returns true if anything was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        let ttl = self.ttl;
        self.items
            .retain(|n| now.saturating_duration_since(n.shown_at) < ttl);
        self.items.len() != before
    }

    /// Newest first, the order they are stacked on screen.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expires_after_ttl() {
        let start = Instant::now();
        let mut notices = Notices::new(Duration::from_secs(3));
        notices.push_at(NoticeKind::Error, "no such mailbox", start);

        assert!(!notices.expire(start + Duration::from_millis(2999)));
        assert_eq!(notices.iter().count(), 1);

        assert!(notices.expire(start + Duration::from_secs(3)));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_notices_expire_independently() {
        let start = Instant::now();
        let mut notices = Notices::new(Duration::from_secs(3));
        notices.push_at(NoticeKind::Error, "first", start);
        notices.push_at(NoticeKind::Success, "second", start + Duration::from_secs(2));

        notices.expire(start + Duration::from_secs(4));
        let texts: Vec<&str> = notices.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["second"]);
    }
}
