//! Cell tokenizer
//!
//! Splits one already-isolated line into fields. A field that starts with `"`
//! is quoted: it may contain the delimiter, and `""` inside it is a literal
//! quote. Text between a closing quote and the next delimiter is kept
//! verbatim, matching what RFC 4180 readers do with sloppy input.
//!
//! The field count is always the number of unquoted delimiters plus one, so
//! `"a,"` yields `["a", ""]` and an empty line yields one empty field.

use super::delimiter::Delimiter;

/// Split a delimited line into owned fields
pub fn split_line(line: &str, delimiter: &Delimiter) -> Vec<String> {
    let delim = delimiter.as_str();

    // Fast path: nothing quoted
    if !line.contains('"') {
        return line.split(delim).map(str::to_string).collect();
    }

    let bytes = line.as_bytes();
    let mut cells = Vec::new();
    let mut i = 0;

    loop {
        if bytes.get(i) == Some(&b'"') {
            let mut cell = String::new();
            i += 1;
            loop {
                match line[i..].find('"') {
                    Some(q) => {
                        cell.push_str(&line[i..i + q]);
                        i += q + 1;
                        if bytes.get(i) == Some(&b'"') {
                            cell.push('"');
                            i += 1;
                        } else {
                            break;
                        }
                    }
                    // Unterminated quote swallows the rest of the line
                    None => {
                        cell.push_str(&line[i..]);
                        i = line.len();
                        break;
                    }
                }
            }
            match line[i..].find(delim) {
                Some(d) => {
                    cell.push_str(&line[i..i + d]);
                    cells.push(cell);
                    i += d + delim.len();
                }
                None => {
                    cell.push_str(&line[i..]);
                    cells.push(cell);
                    break;
                }
            }
        } else {
            match line[i..].find(delim) {
                Some(d) => {
                    cells.push(line[i..i + d].to_string());
                    i += d + delim.len();
                }
                None => {
                    cells.push(line[i..].to_string());
                    break;
                }
            }
        }
    }

    cells
}

/// Drop a trailing `\n` and/or `\r` left over from the line span
pub fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Build a column-aligned row: identity in column 0, then the fields.
///
/// Missing fields become empty strings and surplus fields are dropped.
pub fn align_row(identity: String, fields: Vec<String>, column_count: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(column_count.max(1));
    out.push(identity);
    let mut fields = fields.into_iter();
    for _ in 1..column_count {
        out.push(fields.next().unwrap_or_default());
    }
    out
}
