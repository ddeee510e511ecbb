include!(concat!(env!("OUT_DIR"), "/scores.rs"));

/// A demo score with its name and OmniScore source
#[derive(Debug, Clone)]
pub struct Score {
    pub name: String,
    pub content: String,
}

impl Score {
    fn from_entry((name, content): &(&str, &str)) -> Self {
        Score {
            name: name.to_string(),
            content: content.to_string(),
        }
    }
}

/// Get all embedded scores
pub fn get_all_scores() -> Vec<Score> {
    SCORES.iter().map(Score::from_entry).collect()
}

/// Get a score by name (`starter/quickstart`)
pub fn get_score(name: &str) -> Option<Score> {
    SCORES
        .iter()
        .find(|(n, _)| *n == name)
        .map(Score::from_entry)
}

/// List all score names
pub fn list_scores() -> Vec<&'static str> {
    SCORES.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_is_embedded() {
        let names = list_scores();
        assert!(names.contains(&"starter/quickstart"));
        assert_eq!(get_all_scores().len(), names.len());
    }

    #[test]
    fn test_get_score() {
        let score = get_score("starter/quickstart").unwrap();
        assert!(score.content.contains("measure"));
        assert!(get_score("missing").is_none());
    }
}
