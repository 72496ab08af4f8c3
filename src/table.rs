use std::fmt::Write as _;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized: String = value
            .chars()
            .map(|c| match c {
                '\n' | '\r' | '\t' => ' ',
                other => other,
            })
            .collect();
        let padding = widths[idx].saturating_sub(sanitized.chars().count());
        let mut cell = sanitized;
        cell.push_str(&" ".repeat(padding));
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_table_pads_columns_to_widest_cell() {
        let headers = vec!["key".to_string(), "count".to_string()];
        let rows = vec![
            vec!["West".to_string(), "10".to_string()],
            vec!["Northeast".to_string(), "3".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("key"));
        assert!(lines[1].starts_with("---------"));
        assert!(lines[2].starts_with("West      "));
    }
}
