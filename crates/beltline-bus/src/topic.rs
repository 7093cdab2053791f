/// Topic selection by the fixed part of a subscription filter.
///
/// The fixed prefix is everything before the first wildcard (`#` or `+`).
/// A topic is accepted when it starts with that prefix, ignoring ASCII case.
/// Wildcards after the prefix are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    filter: String,
    prefix: String,
}

impl TopicFilter {
    pub fn new(filter: &str) -> Self {
        let filter = filter.trim();
        let end = filter.find(['#', '+']).unwrap_or(filter.len());
        Self {
            filter: filter.to_string(),
            prefix: filter[..end].to_string(),
        }
    }

    /// The subscription filter as given (trimmed).
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// The non-wildcard prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, topic: &str) -> bool {
        topic
            .get(..self.prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_stops_at_first_wildcard() {
        assert_eq!(TopicFilter::new("IOT252/#").prefix(), "IOT252/");
        assert_eq!(TopicFilter::new("plant/+/cars").prefix(), "plant/");
        assert_eq!(TopicFilter::new("plant/line1").prefix(), "plant/line1");
        assert_eq!(TopicFilter::new("#").prefix(), "");
    }

    #[test]
    fn matches_by_prefix_ignoring_case() {
        let f = TopicFilter::new("IOT252/#");
        assert!(f.matches("IOT252/line1/cars"));
        assert!(f.matches("iot252/x"));
        assert!(f.matches("IOT252/"));
        assert!(!f.matches("IOT25"));
        assert!(!f.matches("other/IOT252/x"));
    }

    #[test]
    fn bare_wildcard_matches_everything() {
        let f = TopicFilter::new("#");
        assert!(f.matches(""));
        assert!(f.matches("anything/at/all"));
    }

    #[test]
    fn non_ascii_topic_does_not_panic() {
        let f = TopicFilter::new("ab#");
        // Prefix length lands inside a multi-byte char.
        assert!(!f.matches("aé/x"));
    }
}
