use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Renders one spreadsheet cell to the string form the core expects.
/// Integral floats lose their ".0" so a 5 scores like a "5".
pub fn render_cell(cell: &calamine::DataType) -> String {
    match cell {
        calamine::DataType::String(s) => s.clone(),
        calamine::DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        calamine::DataType::Float(f) => f.to_string(),
        calamine::DataType::Int(i) => i.to_string(),
        calamine::DataType::Bool(b) => b.to_string(),
        calamine::DataType::Empty => String::new(),
        _ => String::new(),
    }
}

/// Character-safe truncation for free-text fields in reports.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_cells_as_score_strings() {
        assert_eq!(render_cell(&calamine::DataType::Float(5.0)), "5");
        assert_eq!(render_cell(&calamine::DataType::Float(4.5)), "4.5");
        assert_eq!(render_cell(&calamine::DataType::Int(3)), "3");
        assert_eq!(render_cell(&calamine::DataType::Empty), "");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("corto", 150), "corto");
        assert_eq!(truncate_chars("Innovación", 7), "Innovac...");
    }
}
