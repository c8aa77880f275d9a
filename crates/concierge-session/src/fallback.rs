//! Local fallback responder
//!
//! Canned replies used when the query service cannot be reached. Pure and
//! deterministic: the same utterance always yields the same reply.

use serde::{Deserialize, Serialize};

/// Reply used when no topic matches
pub const GENERIC_REPLY: &str = "Thank you for your inquiry! I'm here to help you plan your perfect Four Seasons experience. You can ask me about reservations, destinations, dining, spa treatments, activities, or any aspect of your luxury journey.";

/// Reply of [`ApologyResponder`]
pub const CONNECTIVITY_APOLOGY: &str = "Sorry, I'm having trouble connecting to the AI assistant right now. Please try again later.";

/// Maps an utterance to a canned reply. Must never fail.
pub trait FallbackResponder: Send + Sync {
    fn respond(&self, utterance: &str) -> String;
}

/// Topic groups, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Reservation,
    Maldives,
    Pricing,
    Dining,
    Wellness,
    Activities,
    Greeting,
    BoraBora,
    Hawaii,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Topic::Reservation => "reservation",
            Topic::Maldives => "maldives",
            Topic::Pricing => "pricing",
            Topic::Dining => "dining",
            Topic::Wellness => "wellness",
            Topic::Activities => "activities",
            Topic::Greeting => "greeting",
            Topic::BoraBora => "bora_bora",
            Topic::Hawaii => "hawaii",
        };
        write!(f, "{}", name)
    }
}

struct TopicGroup {
    topic: Topic,
    keywords: &'static [&'static str],
    reply: &'static str,
}

// Order matters: the first group with a matching keyword wins.
const TOPIC_GROUPS: &[TopicGroup] = &[
    TopicGroup {
        topic: Topic::Reservation,
        keywords: &["book", "reservation"],
        reply: "I'd be delighted to assist you with your Four Seasons reservation. Please share your preferred destination, travel dates, and number of guests, and I'll help you find the perfect accommodation.",
    },
    TopicGroup {
        topic: Topic::Maldives,
        keywords: &["maldives"],
        reply: "The Four Seasons Maldives offers two extraordinary properties: Kuda Huraa and Landaa Giraavaru. Both feature overwater villas, world-class dining, and pristine beaches. When would you like to experience this paradise?",
    },
    TopicGroup {
        topic: Topic::Pricing,
        keywords: &["price", "cost", "rate"],
        reply: "Our rates reflect the exceptional luxury and service you'll experience. They vary by property, season, and room category. I'd be happy to provide specific pricing for your preferred destination and dates.",
    },
    TopicGroup {
        topic: Topic::Dining,
        keywords: &["dining", "restaurant", "food"],
        reply: "Four Seasons properties feature award-winning restaurants with world-renowned chefs. From fine dining to casual beachfront experiences, we offer exceptional culinary journeys. Which destination interests you?",
    },
    TopicGroup {
        topic: Topic::Wellness,
        keywords: &["spa", "wellness"],
        reply: "Our spas offer transformative wellness experiences with expert therapists and luxurious treatments. Many properties feature signature spa programs unique to their location.",
    },
    TopicGroup {
        topic: Topic::Activities,
        keywords: &["experience", "activity", "adventure"],
        reply: "We offer curated experiences at every property - from cultural immersion to adventure activities. Whether you seek relaxation or excitement, our concierge team can arrange unforgettable moments.",
    },
    TopicGroup {
        topic: Topic::Greeting,
        keywords: &["hello", "hi", "welcome"],
        reply: "Welcome to Four Seasons! I'm your personal concierge, ready to help you plan the perfect luxury experience. How may I assist you today?",
    },
    TopicGroup {
        topic: Topic::BoraBora,
        keywords: &["bora bora", "tahiti"],
        reply: "Four Seasons Bora Bora is a true paradise with overwater bungalows, crystal-clear lagoons, and Mount Otemanu views. It's perfect for honeymoons and romantic getaways.",
    },
    TopicGroup {
        topic: Topic::Hawaii,
        keywords: &["hawaii", "maui", "lanai"],
        reply: "Our Hawaiian properties offer the perfect blend of luxury and authentic Aloha spirit. From Maui's pristine beaches to Lanai's secluded paradise, each location provides unique experiences.",
    },
];

/// Keyword-matched concierge replies
#[derive(Debug, Clone, Copy, Default)]
pub struct ConciergeResponder;

impl ConciergeResponder {
    /// Case-insensitive substring match against the topic table.
    pub fn classify(&self, utterance: &str) -> Option<Topic> {
        self.matching_group(utterance).map(|group| group.topic)
    }

    /// Canned reply for a topic
    pub fn reply_for(topic: Topic) -> &'static str {
        TOPIC_GROUPS
            .iter()
            .find(|group| group.topic == topic)
            .map(|group| group.reply)
            .unwrap_or(GENERIC_REPLY)
    }

    fn matching_group(&self, utterance: &str) -> Option<&'static TopicGroup> {
        let input = utterance.to_lowercase();
        TOPIC_GROUPS
            .iter()
            .find(|group| group.keywords.iter().any(|kw| input.contains(kw)))
    }
}

impl FallbackResponder for ConciergeResponder {
    fn respond(&self, utterance: &str) -> String {
        self.matching_group(utterance)
            .map(|group| group.reply)
            .unwrap_or(GENERIC_REPLY)
            .to_string()
    }
}

/// Answers every utterance with the same connectivity apology
#[derive(Debug, Clone)]
pub struct ApologyResponder {
    message: String,
}

impl ApologyResponder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for ApologyResponder {
    fn default() -> Self {
        Self::new(CONNECTIVITY_APOLOGY)
    }
}

impl FallbackResponder for ApologyResponder {
    fn respond(&self, _utterance: &str) -> String {
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_matching() {
        let responder = ConciergeResponder;

        assert_eq!(responder.classify("book a trip"), Some(Topic::Reservation));
        assert_eq!(responder.classify("Maldives trip"), Some(Topic::Maldives));
        assert_eq!(responder.classify("what does it cost?"), Some(Topic::Pricing));
        assert_eq!(responder.classify("Any good RESTAURANT?"), Some(Topic::Dining));
        assert_eq!(responder.classify("spa"), Some(Topic::Wellness));
        assert_eq!(responder.classify("adventure time"), Some(Topic::Activities));
        assert_eq!(responder.classify("Hello there"), Some(Topic::Greeting));
        assert_eq!(responder.classify("bora bora"), Some(Topic::BoraBora));
        assert_eq!(responder.classify("Maui"), Some(Topic::Hawaii));
        assert_eq!(responder.classify("xyz"), None);
    }

    #[test]
    fn test_earlier_group_wins_on_overlap() {
        let responder = ConciergeResponder;

        // pricing is listed before dining
        assert_eq!(
            responder.classify("price of the dining menu"),
            Some(Topic::Pricing)
        );
        // reservation beats the destination
        assert_eq!(
            responder.classify("book the maldives"),
            Some(Topic::Reservation)
        );
        // "tahiti" contains "hi", so the greeting group catches it first
        assert_eq!(responder.classify("tahiti"), Some(Topic::Greeting));
    }

    #[test]
    fn test_respond_is_deterministic() {
        let responder = ConciergeResponder;

        let first = responder.respond("Maldives trip");
        let second = responder.respond("Maldives trip");
        assert_eq!(first, second);
        assert_eq!(first, ConciergeResponder::reply_for(Topic::Maldives));
        assert_ne!(first, GENERIC_REPLY);
    }

    #[test]
    fn test_generic_reply_when_nothing_matches() {
        let responder = ConciergeResponder;
        assert_eq!(responder.respond(""), GENERIC_REPLY);
        assert_eq!(responder.respond("zzz"), GENERIC_REPLY);
    }

    #[test]
    fn test_apology_responder() {
        let responder = ApologyResponder::default();
        assert_eq!(responder.respond("book a trip"), CONNECTIVITY_APOLOGY);
        assert_eq!(responder.respond(""), CONNECTIVITY_APOLOGY);
    }
}
