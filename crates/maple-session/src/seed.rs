//! Sample history shown on first launch

use chrono::{DateTime, Duration, Utc};
use maple_core::{Language, Message, Region};

use crate::types::Session;

/// Two historical, view-only conversations relative to `now`
pub fn sample_history(now: DateTime<Utc>) -> Vec<Session> {
    let ontario_start = now - Duration::days(2);
    let quebec_start = now - Duration::days(1);

    vec![
        Session::historical(
            "history-ontario-services",
            ontario_start,
            Region::Ontario,
            Language::En,
            "Ontario Services Query",
            vec![
                Message::user("Hello, I have a question about services in Ontario.")
                    .at(ontario_start),
                Message::bot(
                    None,
                    "Hello! I can help with that. What is your question regarding Ontario services?",
                )
                .at(ontario_start + Duration::minutes(1)),
            ],
        ),
        Session::historical(
            "history-infos-quebec",
            quebec_start,
            Region::Quebec,
            Language::Fr,
            "Infos Québec",
            vec![
                Message::user("Bonjour, je cherche des informations pour le Québec.")
                    .at(quebec_start),
                Message::bot(None, "Bonjour! Comment puis-je vous aider concernant le Québec?")
                    .at(quebec_start + Duration::minutes(1)),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionStore;

    #[test]
    fn test_sample_history_order() {
        let store = SessionStore::with_history(sample_history(Utc::now()));
        let titles: Vec<&str> = store.all(None).iter().map(|s| s.display_title()).collect();
        assert_eq!(titles, vec!["Infos Québec", "Ontario Services Query"]);
        assert!(store.all(None).iter().all(|s| s.messages().len() == 2));
    }
}
