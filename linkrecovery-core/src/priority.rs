// Priority scoring for broken URLs

/// Upper bound of the priority scale.
pub const MAX_SCORE: u32 = 100;

/// Weight of a single referring page, in impression-equivalents.
pub const BACKLINK_WEIGHT: u32 = 10;

/// Score a broken URL on a 0-100 scale from its search impressions and the
/// number of pages still linking to it.
///
/// With no backlinks this is `min(impressions, 100)`.
pub fn priority_score(impressions: u32, backlink_count: u32) -> u32 {
    impressions
        .saturating_add(backlink_count.saturating_mul(BACKLINK_WEIGHT))
        .min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impressions_alone_are_capped() {
        assert_eq!(priority_score(0, 0), 0);
        assert_eq!(priority_score(42, 0), 42);
        assert_eq!(priority_score(450, 0), 100);
    }

    #[test]
    fn backlinks_raise_the_score() {
        assert_eq!(priority_score(0, 3), 30);
        assert_eq!(priority_score(15, 5), 65);
        assert_eq!(priority_score(80, 12), 100);
    }

    #[test]
    fn large_inputs_do_not_overflow() {
        assert_eq!(priority_score(u32::MAX, u32::MAX), 100);
    }
}
