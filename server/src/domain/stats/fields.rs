//! Metric name field parsing
//!
//! Raw names follow a fixed positional schema,
//! `topic.category.subcategory.identity.metric`, with an optional
//! semicolon-delimited tag suffix on the metric segment:
//! `svcA.web.req.login.count;env=prod;debug`. Parsing is total: any input
//! yields a (possibly partial) result, never an error.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

/// Positions the metric name schema assigns, plus parsed tags.
///
/// A position the name did not reach is `None`; a present-but-empty segment
/// is kept verbatim as `Some("")`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatFields {
    pub topic: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub identity: Option<String>,
    pub metric: Option<String>,
    pub tags: BTreeMap<String, JsonValue>,
}

/// Number of dot-delimited positions before the metric segment
const METRIC_POSITION: usize = 4;

/// Decode a raw metric name into schema fields and tags.
///
/// Segments are assigned left-to-right. Segments past the metric position
/// are folded back into the metric segment (metric names may contain dots)
/// rather than dropped. Only the metric segment is split on `;`: the first
/// token is the metric name, each later token is `key=value` or a bare
/// `key` (boolean `true`). Malformed tag tokens are stored verbatim.
pub fn parse_fields(raw_name: &str) -> StatFields {
    if raw_name.is_empty() {
        return StatFields::default();
    }

    let segments: Vec<&str> = raw_name.split('.').collect();
    let position = |idx: usize| segments.get(idx).map(|s| s.to_string());

    let mut fields = StatFields {
        topic: position(0),
        category: position(1),
        subcategory: position(2),
        identity: position(3),
        metric: None,
        tags: BTreeMap::new(),
    };

    if segments.len() > METRIC_POSITION {
        let metric_segment = segments[METRIC_POSITION..].join(".");
        let mut parts = metric_segment.split(';');
        fields.metric = parts.next().map(str::to_string);
        for tag in parts {
            match tag.split_once('=') {
                Some((key, value)) => fields
                    .tags
                    .insert(key.to_string(), JsonValue::String(value.to_string())),
                None => fields.tags.insert(tag.to_string(), JsonValue::Bool(true)),
            };
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_schema_round_trip() {
        let fields = parse_fields("svcA.web.req.login.count");
        assert_eq!(fields.topic.as_deref(), Some("svcA"));
        assert_eq!(fields.category.as_deref(), Some("web"));
        assert_eq!(fields.subcategory.as_deref(), Some("req"));
        assert_eq!(fields.identity.as_deref(), Some("login"));
        assert_eq!(fields.metric.as_deref(), Some("count"));
        assert!(fields.tags.is_empty());
    }

    #[test]
    fn test_tag_parsing() {
        let fields = parse_fields("topic.category.subcategory.identity.metricName;env=prod;debug");
        assert_eq!(fields.metric.as_deref(), Some("metricName"));
        assert_eq!(fields.tags.get("env"), Some(&json!("prod")));
        assert_eq!(fields.tags.get("debug"), Some(&json!(true)));
        assert_eq!(fields.tags.len(), 2);
    }

    #[test]
    fn test_fewer_segments_leave_trailing_fields_absent() {
        let fields = parse_fields("svcA.web");
        assert_eq!(fields.topic.as_deref(), Some("svcA"));
        assert_eq!(fields.category.as_deref(), Some("web"));
        assert_eq!(fields.subcategory, None);
        assert_eq!(fields.identity, None);
        assert_eq!(fields.metric, None);
        assert!(fields.tags.is_empty());
    }

    #[test]
    fn test_single_segment_assigns_topic() {
        let fields = parse_fields("lonely");
        assert_eq!(fields.topic.as_deref(), Some("lonely"));
        assert_eq!(fields.metric, None);
    }

    #[test]
    fn test_empty_string_yields_nothing() {
        assert_eq!(parse_fields(""), StatFields::default());
    }

    #[test]
    fn test_extra_segments_fold_into_metric() {
        let fields = parse_fields("svcA.web.req.login.cache.hits");
        assert_eq!(fields.identity.as_deref(), Some("login"));
        assert_eq!(fields.metric.as_deref(), Some("cache.hits"));
    }

    #[test]
    fn test_extra_segments_with_tags() {
        let fields = parse_fields("svcA.web.req.login.cache.hits;region=eu");
        assert_eq!(fields.metric.as_deref(), Some("cache.hits"));
        assert_eq!(fields.tags.get("region"), Some(&json!("eu")));
    }

    #[test]
    fn test_tags_only_parsed_on_metric_segment() {
        // Too short to reach the metric position: the suffix stays verbatim
        let fields = parse_fields("svcA.web;env=prod");
        assert_eq!(fields.category.as_deref(), Some("web;env=prod"));
        assert!(fields.tags.is_empty());
    }

    #[test]
    fn test_empty_tag_tokens_stored_verbatim() {
        let fields = parse_fields("a.b.c.d.m;=orphan;key=");
        assert_eq!(fields.metric.as_deref(), Some("m"));
        assert_eq!(fields.tags.get(""), Some(&json!("orphan")));
        assert_eq!(fields.tags.get("key"), Some(&json!("")));
        assert_eq!(fields.tags.len(), 2);
    }

    #[test]
    fn test_repeated_tag_key_last_wins() {
        let fields = parse_fields("a.b.c.d.m;env=dev;env=prod");
        assert_eq!(fields.tags.get("env"), Some(&json!("prod")));
        assert_eq!(fields.tags.len(), 1);
    }

    #[test]
    fn test_tag_value_keeps_later_equals_signs() {
        let fields = parse_fields("a.b.c.d.m;expr=x=y");
        assert_eq!(fields.tags.get("expr"), Some(&json!("x=y")));
    }

    #[test]
    fn test_present_but_empty_segment_kept_verbatim() {
        let fields = parse_fields("svcA..req.login.count");
        assert_eq!(fields.category.as_deref(), Some(""));
        assert_eq!(fields.metric.as_deref(), Some("count"));
    }
}
