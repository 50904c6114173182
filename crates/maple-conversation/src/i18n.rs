//! Localized interface strings

use maple_core::Language;

/// Every fixed string the chat surfaces in one language
#[derive(Debug)]
pub struct Strings {
    pub placeholder: &'static str,
    pub placeholder_history: &'static str,
    pub send: &'static str,
    pub typing: &'static str,
    pub connecting: &'static str,
    pub empty_title: &'static str,
    pub empty_hint: &'static str,
    pub historical_title: &'static str,
    pub historical_hint: &'static str,
    pub history_heading: &'static str,
    pub history_empty_title: &'static str,
    pub history_empty_hint: &'static str,
    pub region: &'static str,
    pub language: &'static str,
    pub live: &'static str,
    pub still_connecting_title: &'static str,
    pub still_connecting: &'static str,
    pub resend_title: &'static str,
    pub resend_prefix: &'static str,
    pub server_error_title: &'static str,
    pub malformed_title: &'static str,
    pub malformed: &'static str,
    pub connection_lost_title: &'static str,
    pub connection_lost: &'static str,
}

static EN: Strings = Strings {
    placeholder: "Type your message...",
    placeholder_history: "Viewing historical chat...",
    send: "Send",
    typing: "Bot is typing...",
    connecting: "Connecting to chat...",
    empty_title: "No messages yet.",
    empty_hint: "Start a conversation!",
    historical_title: "This is a historical chat session.",
    historical_hint: "To start a new chat, change region/language or select your active session.",
    history_heading: "Chat History",
    history_empty_title: "No chat history yet.",
    history_empty_hint: "Start a new chat to see it here.",
    region: "Region",
    language: "Language",
    live: "Live",
    still_connecting_title: "Still connecting",
    still_connecting: "Please wait for the connection before sending another message.",
    resend_title: "Message not sent",
    resend_prefix: "Please resend",
    server_error_title: "Server error",
    malformed_title: "Unreadable reply",
    malformed: "The server sent a message that could not be read.",
    connection_lost_title: "Connection lost",
    connection_lost: "The chat connection closed. Send a message to start a new chat.",
};

static FR: Strings = Strings {
    placeholder: "Écrivez votre message...",
    placeholder_history: "Consultation d'une conversation passée...",
    send: "Envoyer",
    typing: "Le robot écrit...",
    connecting: "Connexion au clavardage...",
    empty_title: "Aucun message pour l'instant.",
    empty_hint: "Commencez une conversation!",
    historical_title: "Ceci est une conversation passée.",
    historical_hint: "Pour commencer une nouvelle conversation, changez de région ou de langue, ou sélectionnez votre session active.",
    history_heading: "Historique",
    history_empty_title: "Aucun historique pour l'instant.",
    history_empty_hint: "Commencez une conversation pour la voir ici.",
    region: "Région",
    language: "Langue",
    live: "En direct",
    still_connecting_title: "Connexion en cours",
    still_connecting: "Veuillez attendre la connexion avant d'envoyer un autre message.",
    resend_title: "Message non envoyé",
    resend_prefix: "Veuillez renvoyer",
    server_error_title: "Erreur du serveur",
    malformed_title: "Réponse illisible",
    malformed: "Le serveur a envoyé un message illisible.",
    connection_lost_title: "Connexion perdue",
    connection_lost: "La connexion s'est fermée. Envoyez un message pour commencer une nouvelle conversation.",
};

impl Strings {
    pub fn for_language(language: Language) -> &'static Strings {
        match language {
            Language::En => &EN,
            Language::Fr => &FR,
        }
    }
}
