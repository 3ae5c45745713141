//! CSV rendering of result sets
//!
//! Header line of column names, then one line per row, `\n` terminated.
//! Fields are quoted only when they contain a delimiter, a quote or a line
//! break; quotes inside quoted fields are doubled. NULL is an empty field.

use sqldesk_core::{QueryResult, SqlValue};

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Render a result set as CSV; `NoRows` renders as the empty string
pub fn to_csv(result: &QueryResult) -> String {
    let QueryResult::Rows { columns, rows } = result else {
        return String::new();
    };

    let mut out = String::new();
    let header: Vec<&str> = columns.iter().map(String::as_str).collect();
    write_record(&mut out, &header);
    for row in rows {
        let fields: Vec<String> = row.iter().map(SqlValue::to_plain_string).collect();
        let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
        write_record(&mut out, &fields);
    }
    out
}

fn write_record(out: &mut String, fields: &[&str]) {
    // A lone empty field is quoted so the line is not read back as blank
    if let [""] = fields {
        out.push_str("\"\"\n");
        return;
    }

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        write_field(out, field);
    }
    out.push('\n');
}

fn write_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r');

    if needs_quotes {
        out.push(QUOTE);
        for c in field.chars() {
            if c == QUOTE {
                out.push(QUOTE);
            }
            out.push(c);
        }
        out.push(QUOTE);
    } else {
        out.push_str(field);
    }
}
