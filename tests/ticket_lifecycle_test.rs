//! End-to-end ticket lifecycle through the public API

mod common;

use common::{staff_close, select, TestDesk, PANEL_CHANNEL, REQUESTER, SUPPORT_ROLE};
use ticketdesk_core::platform::{InteractionReply, InteractionResponse};
use ticketdesk_core::tickets::{CloseOutcome, ComponentOutcome, CreationOutcome};
use ticketdesk_core::{Category, RuleDocument, TicketKey};

#[tokio::test]
async fn test_rule_edit_applies_to_new_tickets_only() {
    let desk = TestDesk::new();
    assert!(
        desk.rules
            .save(&RuleDocument::new(vec!["P1".into()], vec!["old rule".into()]))
            .await
    );

    let (mut reply, _rx) = InteractionReply::channel();
    let first = desk
        .controller
        .handle_component(&select("duvidas"), &mut reply)
        .await;
    assert!(matches!(
        first,
        ComponentOutcome::Creation(CreationOutcome::Created(_))
    ));

    assert!(
        desk.rules
            .save(&RuleDocument::new(vec!["P2".into()], vec!["new rule".into()]))
            .await
    );
    desk.panel.publish().await;

    let (mut reply, _rx) = InteractionReply::channel();
    desk.controller
        .handle_component(&select("reembolso"), &mut reply)
        .await;

    let log = desk.platform.log();
    let welcomes: Vec<&str> = log
        .messages
        .iter()
        .filter(|(channel, _)| *channel != PANEL_CHANNEL)
        .map(|(_, message)| message.embeds[0].description.as_str())
        .collect();
    assert_eq!(welcomes.len(), 2);
    assert!(welcomes[0].ends_with("old rule"));
    assert!(welcomes[1].ends_with("new rule"));

    let panels: Vec<_> = log
        .messages
        .iter()
        .filter(|(channel, _)| *channel == PANEL_CHANNEL)
        .collect();
    assert_eq!(panels.len(), 1);
    assert!(panels[0].1.embeds[0].description.contains("P2"));
}

#[tokio::test]
async fn test_open_then_close_ticket() {
    let desk = TestDesk::new();

    let (mut reply, rx) = InteractionReply::channel();
    let outcome = desk
        .controller
        .handle_category_select(&select("parceria"), &mut reply)
        .await;
    let CreationOutcome::Created(channel) = outcome else {
        panic!("expected ticket, got {:?}", outcome);
    };
    assert!(matches!(rx.await.unwrap(), InteractionResponse::Message(_)));

    let log = desk.platform.log();
    assert_eq!(log.topics, vec![(channel, REQUESTER.to_string())]);
    assert!(log.messages[0]
        .1
        .content
        .as_deref()
        .unwrap()
        .contains(&format!("<@&{}>", SUPPORT_ROLE)));

    let (mut reply, rx) = InteractionReply::channel();
    let outcome = desk
        .controller
        .handle_component(&staff_close(channel), &mut reply)
        .await;
    assert_eq!(outcome, ComponentOutcome::Close(CloseOutcome::Closed));
    assert!(matches!(rx.await.unwrap(), InteractionResponse::Message(_)));
    assert!(!desk.platform.channel_exists(channel));
}

#[tokio::test]
async fn test_lock_is_clean_after_every_attempt() {
    let desk = TestDesk::new();

    for value in ["duvidas", "denuncias", "reembolso", "parceria", "duvidas"] {
        let (mut reply, _rx) = InteractionReply::channel();
        desk.controller
            .handle_category_select(&select(value), &mut reply)
            .await;
    }

    for category in Category::ALL {
        assert!(!desk
            .controller
            .locks()
            .is_locked(&TicketKey::new(REQUESTER, category)));
    }
    assert_eq!(desk.controller.locks().in_flight(), 0);
    assert_eq!(desk.platform.log().created.len(), 5);
}
