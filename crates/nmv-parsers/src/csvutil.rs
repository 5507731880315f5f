use std::collections::BTreeMap;

/// Shared helpers for the CSV fallback format produced by the fetcher layer.
/// The convention is a single header row (`MAC,Interface,VLAN` etc.); column
/// lookup is case-insensitive.

/// True when the first non-empty line looks like a CSV header containing
/// `marker` (case-insensitive).
pub fn looks_like_csv(raw: &str, marker: &str) -> bool {
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        return line.contains(',') && line.to_ascii_uppercase().contains(&marker.to_ascii_uppercase());
    }
    false
}

/// Parse CSV rows into maps keyed by the upper-cased header name. Ragged or
/// malformed rows are skipped rather than failing the whole parse.
pub fn csv_rows(raw: &str) -> Vec<BTreeMap<String, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw.trim().as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|c| c.trim().to_ascii_uppercase()).collect(),
        Err(_) => return Vec::new(),
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let mut row = BTreeMap::new();
        for (i, field) in record.iter().enumerate() {
            if let Some(header) = headers.get(i) {
                row.insert(header.clone(), field.trim().to_string());
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    rows
}

/// Fetch a column by (case-insensitive) name, empty string when absent.
pub fn col<'a>(row: &'a BTreeMap<String, String>, name: &str) -> &'a str {
    row.get(&name.to_ascii_uppercase())
        .map(String::as_str)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_csv_header() {
        assert!(looks_like_csv("MAC,Interface,VLAN\nAA:BB:CC:DD:EE:01,GE1/0/1,10", "MAC"));
        assert!(!looks_like_csv("  Mac Address Table\n----", "MAC"));
        assert!(!looks_like_csv("", "MAC"));
    }

    #[test]
    fn rows_are_keyed_by_uppercase_header() {
        let rows = csv_rows("Interface,ACL\nGE1/0/1,3001\nGE1/0/2,\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(col(&rows[0], "interface"), "GE1/0/1");
        assert_eq!(col(&rows[0], "ACL"), "3001");
        assert_eq!(col(&rows[1], "acl"), "");
    }

    #[test]
    fn ragged_rows_do_not_fail_parse() {
        let rows = csv_rows("IP,MAC\n10.0.0.1,AA:BB:CC:DD:EE:01\n10.0.0.2\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(col(&rows[1], "MAC"), "");
    }
}
