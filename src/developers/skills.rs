//! Skills are stored as a list but edited as one comma-separated string.
//! `join_for_edit` and `parse_from_edit` are the only conversions between
//! the two; for any list of trimmed, non-empty entries without commas they
//! round-trip exactly.

const SEPARATOR: char = ',';

/// Split the edit-form string into the stored list: trim each piece and drop
/// empty ones. Order and case are preserved.
pub fn parse_from_edit(input: &str) -> Vec<String> {
    input
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render the stored list for the edit form.
pub fn join_for_edit(skills: &[String]) -> String {
    skills.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_empty_and_trims() {
        assert_eq!(
            parse_from_edit("React, Node.js ,, Python"),
            vec!["React", "Node.js", "Python"]
        );
    }

    #[test]
    fn test_parse_blank_input() {
        assert!(parse_from_edit("").is_empty());
        assert!(parse_from_edit(" , ,").is_empty());
    }

    #[test]
    fn test_join() {
        let skills = vec!["Rust".to_string(), "Tokio".to_string()];
        assert_eq!(join_for_edit(&skills), "Rust, Tokio");
        assert_eq!(join_for_edit(&[]), "");
    }

    #[test]
    fn test_round_trip_preserves_order_and_case() {
        let cases: Vec<Vec<String>> = vec![
            vec![],
            vec!["Go".to_string()],
            vec!["React Native".to_string(), "node.js".to_string(), "C#".to_string()],
            vec!["UI/UX Design".to_string(), "AWS".to_string(), "aws".to_string()],
        ];

        for skills in cases {
            assert_eq!(parse_from_edit(&join_for_edit(&skills)), skills);
        }
    }
}
