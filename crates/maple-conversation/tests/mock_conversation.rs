//! Full conversation over the offline connector

use std::time::Duration;

use maple_conversation::{Controller, ControllerSettings, InputState, Phase};
use maple_core::{Language, Region};
use maple_gateway::{event_channel, EventReceiver, MockConfig, MockConnector};
use maple_session::SessionStore;

async fn pump_until_settled(controller: &mut Controller<MockConnector>, rx: &mut EventReceiver) {
    while controller.is_loading() {
        let envelope = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for transport")
            .expect("transport channel closed");
        controller.handle_envelope(envelope);
    }
}

#[tokio::test]
async fn test_question_and_answer_over_mock() {
    let (tx, mut rx) = event_channel();
    let connector = MockConnector::new(
        MockConfig {
            reply_delay: Duration::from_millis(5),
        },
        tx,
    );
    let settings = ControllerSettings {
        region: Region::Ontario,
        language: Language::En,
        show_history: true,
    };
    let mut controller = Controller::new(connector, SessionStore::new(), settings);

    controller.send_message("How do I renew my health card?").unwrap();
    pump_until_settled(&mut controller, &mut rx).await;

    assert!(matches!(controller.phase(), Phase::Live { .. }));
    assert_eq!(controller.input_state(), InputState::Enabled);
    let session = controller.viewed_session().unwrap();
    assert_eq!(session.id(), "mock-conversation-1");
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].id, "mock-question-1");
    assert!(session.messages()[1].text.contains("Ontario"));

    controller.send_message("Thanks").unwrap();
    pump_until_settled(&mut controller, &mut rx).await;
    assert_eq!(controller.viewed_session().unwrap().messages().len(), 4);

    controller.shutdown();
    assert!(matches!(controller.phase(), Phase::Idle));
}

#[tokio::test]
async fn test_language_switch_starts_fresh_conversation() {
    let (tx, mut rx) = event_channel();
    let connector = MockConnector::new(
        MockConfig {
            reply_delay: Duration::from_millis(5),
        },
        tx,
    );
    let mut controller =
        Controller::new(connector, SessionStore::new(), ControllerSettings::default());

    controller.set_language(Language::Fr);
    pump_until_settled(&mut controller, &mut rx).await;

    assert_eq!(controller.live_session_id(), Some("mock-conversation-1"));
    assert_eq!(controller.chat_view().placeholder, "Écrivez votre message...");

    controller.set_region(Region::Quebec);
    assert!(!controller.store().contains("mock-conversation-1"));
    pump_until_settled(&mut controller, &mut rx).await;
    assert_eq!(controller.live_session_id(), Some("mock-conversation-2"));
}
