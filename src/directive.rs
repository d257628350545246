//! Comment-embedded directive grammar.
//!
//! Schema comment blocks interleave prose with `@key: value` directives.
//! Matching is line-local and pure: a directive key either matches one
//! line and yields its raw value, or it does not. A key absent from a
//! node's comment block means "use the default".

use std::sync::LazyLock;

use regex::Regex;

/// Canonical output marker produced by the tag merge engine.
pub const ATTR_MARKER: &str = "@attr:";

/// Sentinel directive value that suppresses tag injection for a field.
pub const IGNORE: &str = "ignore";

/// The fixed set of recognized directive keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    RouteGroup,
    RoutePrefix,
    EmitTo,
    Middleware,
    Store,
    Wire,
    WireStyle,
    Validate,
    Method,
    Api,
    Author,
    Desc,
    Error,
    Model,
    TableName,
    ServiceGen,
    Task,
    Schedule,
    Times,
    Range,
    Kind,
    Rate,
    Attr,
}

static ROUTE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@route_group:\s*(\w*)").unwrap());
static ROUTE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@route_prefix:\s*([\w/]*)").unwrap());
static EMIT_TO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@emit_to:\s*([\w/.-]*)").unwrap());
static MIDDLEWARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@middleware:\s*([^\s].*)").unwrap());
static STORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@store:\s*([\w-]+)").unwrap());
static WIRE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@wire:\s*([\w-]+)").unwrap());
static WIRE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@wire_style:\s*([a-z0-9_]+)").unwrap());
static VALIDATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@validate:\s*(.+)").unwrap());
static METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@method:\s*(\w*)").unwrap());
static API: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@api:\s*([\w/]*)").unwrap());
static AUTHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@author:\s*(.*)").unwrap());
static DESC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@desc:\s*(.*)").unwrap());
static ERROR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@error:\s*(.*)").unwrap());
static MODEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@model:\s*(true)").unwrap());
static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@table_name:\s*(\w+)").unwrap());
static SERVICE_GEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@service_gen:\s*(true)").unwrap());
static TASK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@task:\s*(true)").unwrap());
static SCHEDULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@schedule:\s*(.*)").unwrap());
static TIMES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@times:\s*(\d+)").unwrap());
static RANGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@range:\s*(\d+ \d+)").unwrap());
static KIND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@kind:\s*(\d)").unwrap());
static RATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@rate:\s*(\d+ \d+ \d+)").unwrap());
static ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@attr:\s*(.*)").unwrap());

static INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@index:\s*(\w+)\s+(asc|desc|ASC|DESC)").unwrap());
static UNIQUE_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@unique_index:\s*(\w+)\s+(asc|desc|ASC|DESC)").unwrap());
static TTL_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@ttl_index:\s*(\w+)\s+(asc|desc|ASC|DESC)\s+(\d+)").unwrap());

static MIDDLEWARE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_:]+)\[([^\]]*)\]").unwrap());

fn pattern(key: Key) -> &'static Regex {
    match key {
        Key::RouteGroup => &ROUTE_GROUP,
        Key::RoutePrefix => &ROUTE_PREFIX,
        Key::EmitTo => &EMIT_TO,
        Key::Middleware => &MIDDLEWARE,
        Key::Store => &STORE,
        Key::Wire => &WIRE,
        Key::WireStyle => &WIRE_STYLE,
        Key::Validate => &VALIDATE,
        Key::Method => &METHOD,
        Key::Api => &API,
        Key::Author => &AUTHOR,
        Key::Desc => &DESC,
        Key::Error => &ERROR,
        Key::Model => &MODEL,
        Key::TableName => &TABLE_NAME,
        Key::ServiceGen => &SERVICE_GEN,
        Key::Task => &TASK,
        Key::Schedule => &SCHEDULE,
        Key::Times => &TIMES,
        Key::Range => &RANGE,
        Key::Kind => &KIND,
        Key::Rate => &RATE,
        Key::Attr => &ATTR,
    }
}

/// A directive recovered from one comment line. Never stored in the
/// schema tree; recomputed on each pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub key: Key,
    pub value: String,
    pub line_index: usize,
}

/// Match a single comment line against `key`, returning the raw value.
pub fn match_value(line: &str, key: Key) -> Option<String> {
    pattern(key)
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// True when the line carries the directive at all, matched or not.
/// Used to distinguish "absent" from "present but malformed".
pub fn mentions(line: &str, key: Key) -> bool {
    let marker = match key {
        Key::RouteGroup => "@route_group:",
        Key::RoutePrefix => "@route_prefix:",
        Key::EmitTo => "@emit_to:",
        Key::Middleware => "@middleware:",
        Key::Store => "@store:",
        Key::Wire => "@wire:",
        Key::WireStyle => "@wire_style:",
        Key::Validate => "@validate:",
        Key::Method => "@method:",
        Key::Api => "@api:",
        Key::Author => "@author:",
        Key::Desc => "@desc:",
        Key::Error => "@error:",
        Key::Model => "@model:",
        Key::TableName => "@table_name:",
        Key::ServiceGen => "@service_gen:",
        Key::Task => "@task:",
        Key::Schedule => "@schedule:",
        Key::Times => "@times:",
        Key::Range => "@range:",
        Key::Kind => "@kind:",
        Key::Rate => "@rate:",
        Key::Attr => ATTR_MARKER,
    };
    line.contains(marker)
}

/// Find the first line in a comment block matching `key`.
pub fn find(lines: &[String], key: Key) -> Option<Directive> {
    lines.iter().enumerate().find_map(|(i, line)| {
        match_value(line, key).map(|value| Directive {
            key,
            value,
            line_index: i,
        })
    })
}

/// True when the block carries `@<key>: true`.
pub fn flag(lines: &[String], key: Key) -> bool {
    find(lines, key).is_some()
}

/// Sort direction of an index member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Numeric form used by the index metadata templates.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

/// One parsed `@index:` / `@unique_index:` / `@ttl_index:` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDirective {
    pub name: String,
    pub order: SortOrder,
    pub expire_after_seconds: Option<i64>,
}

fn parse_order(raw: &str) -> SortOrder {
    if raw.eq_ignore_ascii_case("asc") {
        SortOrder::Asc
    } else {
        SortOrder::Desc
    }
}

/// Parse a plain `@index:` line.
pub fn index_spec(line: &str) -> Option<IndexDirective> {
    INDEX.captures(line).map(|c| IndexDirective {
        name: c[1].to_string(),
        order: parse_order(&c[2]),
        expire_after_seconds: None,
    })
}

/// Parse a `@unique_index:` line.
pub fn unique_index_spec(line: &str) -> Option<IndexDirective> {
    UNIQUE_INDEX.captures(line).map(|c| IndexDirective {
        name: c[1].to_string(),
        order: parse_order(&c[2]),
        expire_after_seconds: None,
    })
}

/// Parse a `@ttl_index:` line, including the expiry in seconds.
pub fn ttl_index_spec(line: &str) -> Option<IndexDirective> {
    TTL_INDEX.captures(line).map(|c| IndexDirective {
        name: c[1].to_string(),
        order: parse_order(&c[2]),
        expire_after_seconds: c[3].parse().ok(),
    })
}

/// Middleware references declared on a service or rpc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiddlewareSpec {
    /// Module paths that generated code must import.
    pub imports: Vec<String>,
    /// `module::function` entries in declaration order.
    pub entries: Vec<String>,
}

/// Parse a `@middleware: path::to::module[f1, f2]` line. Multiple
/// bracketed groups may appear on one line.
pub fn middleware_spec(line: &str) -> MiddlewareSpec {
    let mut spec = MiddlewareSpec::default();
    let Some(content) = match_value(line, Key::Middleware) else {
        return spec;
    };
    for cap in MIDDLEWARE_ENTRY.captures_iter(&content) {
        let module = cap[1].to_string();
        let base = module.rsplit("::").next().unwrap_or(&module).to_string();
        for func in cap[2].split(',') {
            let func = func.trim();
            if !func.is_empty() {
                spec.entries.push(format!("{base}::{func}"));
            }
        }
        spec.imports.push(module);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_line_local() {
        assert_eq!(
            match_value(" @store: nick_name", Key::Store),
            Some("nick_name".to_string())
        );
        assert_eq!(match_value(" plain prose", Key::Store), None);
    }

    #[test]
    fn malformed_value_is_distinguishable_from_absent() {
        // marker present, value outside the grammar
        let line = " @store: ***";
        assert!(mentions(line, Key::Store));
        assert_eq!(match_value(line, Key::Store), None);
    }

    #[test]
    fn index_directives_parse_name_order_and_expiry() {
        let idx = index_spec(" @index: idx_uid ASC").unwrap();
        assert_eq!(idx.name, "idx_uid");
        assert_eq!(idx.order, SortOrder::Asc);
        assert_eq!(idx.expire_after_seconds, None);

        let ttl = ttl_index_spec(" @ttl_index: idx_expire desc 86400").unwrap();
        assert_eq!(ttl.order, SortOrder::Desc);
        assert_eq!(ttl.expire_after_seconds, Some(86400));
    }

    #[test]
    fn middleware_entries_use_module_basename() {
        let spec = middleware_spec(" @middleware: crate::middleware::auth[check, limit]");
        assert_eq!(spec.imports, vec!["crate::middleware::auth".to_string()]);
        assert_eq!(
            spec.entries,
            vec!["auth::check".to_string(), "auth::limit".to_string()]
        );
    }

    #[test]
    fn find_reports_the_first_matching_line() {
        let lines = vec![
            " prose".to_string(),
            " @wire: first".to_string(),
            " @wire: second".to_string(),
        ];
        let d = find(&lines, Key::Wire).unwrap();
        assert_eq!(d.value, "first");
        assert_eq!(d.line_index, 1);
    }

    #[test]
    fn rate_requires_three_fields() {
        assert_eq!(
            match_value(" @rate: 10 100 1000", Key::Rate),
            Some("10 100 1000".to_string())
        );
        assert_eq!(match_value(" @rate: 10 100", Key::Rate), None);
    }
}
