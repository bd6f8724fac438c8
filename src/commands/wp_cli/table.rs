//! Tab-separated table rendering shared by the shell and direct-API paths.
//!
//! Both paths describe a list as JSON row objects keyed the way WP-CLI's
//! `--format=json` keys them, so the rendered `result` string is the same
//! whichever path produced the rows.

use serde_json::{Map, Value};

/// Preferred column order per command group. Unknown keys follow in the order
/// they first appear.
#[must_use]
pub fn columns_for(group: &str) -> &'static [&'static str] {
    match group {
        "plugin" | "theme" => &["name", "status", "update", "version"],
        "user" => &[
            "ID",
            "user_login",
            "display_name",
            "user_email",
            "user_registered",
            "roles",
        ],
        "post" => &["ID", "post_title", "post_type", "post_date", "post_status"],
        "option" => &["option_name", "option_value"],
        "menu" => &["term_id", "name", "slug", "locations", "count"],
        "comment" => &[
            "comment_ID",
            "comment_post_ID",
            "comment_date",
            "comment_approved",
            "comment_author",
        ],
        "db" => &["name", "rows", "size", "status"],
        _ => &[],
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build from JSON row objects. Non-object rows are skipped.
    #[must_use]
    pub fn from_rows(rows: &[Value], preferred: &[&str]) -> Self {
        let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();

        let mut keys: Vec<String> = preferred
            .iter()
            .filter(|key| objects.iter().any(|row| row.contains_key(**key)))
            .map(|key| (*key).to_string())
            .collect();
        // An empty list still gets the preferred header row
        if objects.is_empty() {
            keys = preferred.iter().map(|key| (*key).to_string()).collect();
        }
        for row in &objects {
            for key in row.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }

        let rows = objects
            .iter()
            .map(|row| {
                keys.iter()
                    .map(|key| row.get(key).map(cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            headers: keys.iter().map(|key| key.to_uppercase()).collect(),
            rows,
        }
    }

    /// Header row first, one line per row.
    #[must_use]
    pub fn to_tsv(&self) -> String {
        std::iter::once(self.headers.join("\t"))
            .chain(self.rows.iter().map(|row| row.join("\t")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render a JSON value as a single table cell.
fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    };
    text.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_preferred_columns_come_first() {
        let rows = vec![
            json!({"version": "5.3.3", "status": "active", "name": "akismet", "update": "available"}),
            json!({"version": "1.7.2", "status": "inactive", "name": "hello", "update": "none", "auto_update": "off"}),
        ];
        let table = Table::from_rows(&rows, columns_for("plugin"));
        assert_eq!(
            table.to_tsv(),
            "NAME\tSTATUS\tUPDATE\tVERSION\tAUTO_UPDATE\n\
             akismet\tactive\tavailable\t5.3.3\t\n\
             hello\tinactive\tnone\t1.7.2\toff"
        );
    }

    #[test]
    fn test_cells_never_break_rows() {
        let rows = vec![json!({"option_name": "x", "option_value": "a\tb\nc", "roles": ["a", "b"]})];
        let table = Table::from_rows(&rows, columns_for("option"));
        assert_eq!(table.rows[0], vec!["x", "a b c", "a,b"]);
    }

    #[test]
    fn test_empty_list_keeps_header() {
        let table = Table::from_rows(&[], columns_for("menu"));
        assert!(table.is_empty());
        assert_eq!(table.to_tsv(), "TERM_ID\tNAME\tSLUG\tLOCATIONS\tCOUNT");
    }
}
