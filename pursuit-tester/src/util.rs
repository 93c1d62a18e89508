use chrono::Utc;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Compact UTC stamp for log lines and banners.
pub fn timestamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" smoke, ,rotation,  wall-stun ");
        assert_eq!(parts, vec!["smoke", "rotation", "wall-stun"]);
    }

    #[test]
    fn timestamp_is_compact() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "T");
    }
}
