use serde_json::{json, Map, Value};

use crate::window::QueryWindow;

const DAILY_SUMMARY: &str = r#"
query($zoneTag: String!, $yesterday: String!) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      httpRequests1dGroups(limit: 1, filter: { date: $yesterday }) {
        sum {
          pageViews
          requests
        }
      }
    }
  }
}
"#;

const HOURLY_SUMMARY: &str = r#"
query($zoneTag: String!, $yesterday: String!, $today: String!) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      httpRequests1hGroups(limit: 24, filter: { datetime_geq: $yesterday, datetime_lt: $today }) {
        dimensions {
          datetime
        }
        sum {
          pageViews
          requests
        }
      }
    }
  }
}
"#;

const DETAIL_LOG: &str = r#"
query GetDetailedLogs($zoneTag: String!, $start: datetime!, $end: datetime!) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      httpRequestsAdaptiveGroups(
        limit: 1000,
        filter: {
          datetime_geq: $start,
          datetime_leq: $end
        },
        orderBy: [datetime_DESC]
      ) {
        dimensions {
          datetime
          clientRequestPath
          userAgent
          clientIP
        }
      }
    }
  }
}
"#;

/// A GraphQL template together with its variables.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub name: &'static str,
    pub template: &'static str,
    pub variables: Map<String, Value>,
}

impl QuerySpec {
    fn new(name: &'static str, template: &'static str, variables: Value) -> Self {
        let variables = match variables {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name,
            template,
            variables,
        }
    }

    /// Request body sent to the endpoint.
    pub fn body(&self) -> Value {
        json!({
            "query": self.template,
            "variables": self.variables,
        })
    }
}

/// Page views and requests for the window's first day.
pub fn daily_summary(zone_id: &str, window: &QueryWindow) -> QuerySpec {
    QuerySpec::new(
        "daily summary",
        DAILY_SUMMARY,
        json!({
            "zoneTag": zone_id,
            "yesterday": window.start_date(),
        }),
    )
}

/// Hourly buckets between window start and end.
pub fn hourly_summary(zone_id: &str, window: &QueryWindow) -> QuerySpec {
    QuerySpec::new(
        "hourly summary",
        HOURLY_SUMMARY,
        json!({
            "zoneTag": zone_id,
            "yesterday": window.start_datetime(),
            "today": window.end_datetime(),
        }),
    )
}

/// Up to 1000 raw request tuples, most recent first.
pub fn detail_log(zone_id: &str, window: &QueryWindow) -> QuerySpec {
    QuerySpec::new(
        "detail log",
        DETAIL_LOG,
        json!({
            "zoneTag": zone_id,
            "start": window.start_datetime(),
            "end": window.end_datetime(),
        }),
    )
}
