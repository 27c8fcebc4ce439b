//! End-to-end dispatch tests: `Coordinator::send` → supervisor → actor →
//! delivery collaborator.
//!
//! Collaborators are in-memory fakes that forward every call to a channel, so
//! no external service is needed:
//!
//! ```bash
//! cargo test -p relay-engine --test integration
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use relay_common::types::{Action, Channel};
use relay_engine::{
    Actor, ActorConfig, Coordinator, CoordinatorConfig, Delivery, Directory, DispatchError,
};
use relay_notifier::{EmailSender, NotifierError, SmsSender};

// ============================================================
// Helpers
// ============================================================

type EmailCall = (String, String, String, String);
type SmsCall = (String, String, String);

struct Forwarding {
    emails: mpsc::UnboundedSender<EmailCall>,
    sms: mpsc::UnboundedSender<SmsCall>,
}

#[async_trait]
impl EmailSender for Forwarding {
    async fn send(
        &self,
        to: &str,
        from: &str,
        html_payload: &str,
        subject: &str,
    ) -> Result<bool, NotifierError> {
        let _ = self.emails.send((
            to.to_string(),
            from.to_string(),
            html_payload.to_string(),
            subject.to_string(),
        ));
        Ok(true)
    }
}

#[async_trait]
impl SmsSender for Forwarding {
    async fn send(&self, to: &str, from: &str, payload: &str) -> Result<bool, NotifierError> {
        let _ = self
            .sms
            .send((to.to_string(), from.to_string(), payload.to_string()));
        Ok(true)
    }
}

struct Harness {
    delivery: Delivery,
    emails: mpsc::UnboundedReceiver<EmailCall>,
    sms: mpsc::UnboundedReceiver<SmsCall>,
}

fn harness() -> Harness {
    let (email_tx, emails) = mpsc::unbounded_channel();
    let (sms_tx, sms) = mpsc::unbounded_channel();
    let fake = Arc::new(Forwarding {
        emails: email_tx,
        sms: sms_tx,
    });
    Harness {
        delivery: Delivery::new(fake.clone(), fake),
        emails,
        sms,
    }
}

/// An actor whose heartbeat never lands inside its alive window.
fn dead_config() -> ActorConfig {
    ActorConfig {
        heartbeat_interval: Duration::from_secs(3600),
        alive_window: Duration::from_millis(10),
        ..ActorConfig::default()
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

// ============================================================
// Scenarios
// ============================================================

#[tokio::test]
async fn test_email_delivered_exactly_once() {
    let mut h = harness();
    let coordinator = Coordinator::new(CoordinatorConfig::default(), h.delivery.clone());

    let result = coordinator.send(Channel::Email, "a@x.com", "b@x.com", "hi", "t");
    assert_eq!(result, Ok(()));

    let call = tokio::time::timeout(Duration::from_secs(2), h.emails.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        call,
        (
            "a@x.com".to_string(),
            "b@x.com".to_string(),
            "hi".to_string(),
            "t".to_string()
        )
    );

    let email_actor = coordinator.directory().actors(Channel::Email)[0].clone();
    wait_until(|| email_actor.occupancy() == 0).await;
    assert!(h.emails.try_recv().is_err());
    assert!(h.sms.try_recv().is_err());
    assert_eq!(coordinator.stats().routed, 1);
}

#[tokio::test]
async fn test_full_ingress_rejects_without_enqueue() {
    let h = harness();
    let config = CoordinatorConfig {
        ingress_capacity: 5,
        ..CoordinatorConfig::default()
    };
    let coordinator = Coordinator::new(config, h.delivery.clone());

    // No await between sends: the supervisor gets no chance to drain.
    for i in 0..5 {
        let payload = format!("msg-{}", i);
        assert_eq!(
            coordinator.send(Channel::Push, "device", "app", &payload, "t"),
            Ok(())
        );
    }
    assert_eq!(coordinator.queued(), 5);

    let result = coordinator.send(Channel::Push, "device", "app", "one more", "t");
    assert_eq!(result, Err(DispatchError::Overloaded));
    assert_eq!(
        result.unwrap_err().to_string(),
        "node is loaded please retry after some time"
    );
    assert_eq!(coordinator.queued(), 5);

    // Once the supervisor drains, capacity frees up again.
    wait_until(|| coordinator.queued() == 0).await;
    assert_eq!(
        coordinator.send(Channel::Push, "device", "app", "after", "t"),
        Ok(())
    );
}

#[tokio::test]
async fn test_dead_sms_actor_is_skipped() {
    let mut h = harness();
    let mut directory = Directory::new();
    let sms_actor = Actor::spawn(Channel::Sms, dead_config(), h.delivery.clone());
    directory.register(sms_actor.clone());
    directory.register(Actor::spawn(
        Channel::Email,
        ActorConfig::default(),
        h.delivery.clone(),
    ));
    let coordinator = Coordinator::start(directory, 100);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!sms_actor.is_alive());

    coordinator
        .send(Channel::Sms, "+15550001", "+15550002", "code", "t")
        .unwrap();
    // The supervisor is FIFO: once the email lands, the sms was already routed.
    coordinator
        .send(Channel::Email, "a@x.com", "b@x.com", "hi", "t")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(2), h.emails.recv())
        .await
        .unwrap()
        .unwrap();

    assert!(h.sms.try_recv().is_err());
    assert_eq!(sms_actor.occupancy(), 0);
    assert_eq!(coordinator.stats().dropped, 1);
}

#[tokio::test]
async fn test_push_accepted_without_collaborator() {
    let mut h = harness();
    let coordinator = Coordinator::new(CoordinatorConfig::default(), h.delivery.clone());
    let push_actor = coordinator.directory().actors(Channel::Push)[0].clone();

    assert_eq!(
        coordinator.send(Channel::Push, "device-1", "app", "ping", "hello"),
        Ok(())
    );

    wait_until(|| coordinator.stats().routed == 1 && push_actor.occupancy() == 0).await;
    assert!(h.emails.try_recv().is_err());
    assert!(h.sms.try_recv().is_err());
    assert_eq!(coordinator.stats().dropped, 0);
}

#[tokio::test]
async fn test_unregistered_channel_dropped_silently() {
    let mut h = harness();
    let mut directory = Directory::new();
    directory.register(Actor::spawn(
        Channel::Email,
        ActorConfig::default(),
        h.delivery.clone(),
    ));
    let coordinator = Coordinator::start(directory, 10);

    assert_eq!(
        coordinator.submit(Action::new(Channel::Push, "device", "app", "ping", "t")),
        Ok(())
    );
    coordinator
        .send(Channel::Email, "a@x.com", "b@x.com", "hi", "t")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(2), h.emails.recv())
        .await
        .unwrap()
        .unwrap();

    let stats = coordinator.stats();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.dropped, 1);
}

#[tokio::test]
async fn test_email_order_preserved_through_coordinator() {
    let mut h = harness();
    let coordinator = Coordinator::new(CoordinatorConfig::default(), h.delivery.clone());

    for i in 0..5 {
        let payload = format!("msg-{}", i);
        coordinator
            .send(Channel::Email, "a@x.com", "b@x.com", &payload, "t")
            .unwrap();
        // Let the actor keep up so its 10-slot mailbox never fills.
        tokio::task::yield_now().await;
    }

    let mut payloads = Vec::new();
    for _ in 0..5 {
        let (_, _, payload, _) = tokio::time::timeout(Duration::from_secs(2), h.emails.recv())
            .await
            .unwrap()
            .unwrap();
        payloads.push(payload);
    }
    assert_eq!(payloads, vec!["msg-0", "msg-1", "msg-2", "msg-3", "msg-4"]);

    let email_actor = coordinator.directory().actors(Channel::Email)[0].clone();
    wait_until(|| email_actor.occupancy() == 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_senders_deliver_each_routed_email_once() {
    let mut h = harness();
    let coordinator = Arc::new(Coordinator::new(
        CoordinatorConfig::default(),
        h.delivery.clone(),
    ));

    let senders: Vec<_> = (0..8)
        .map(|task| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                let mut accepted = 0u64;
                for i in 0..50 {
                    let payload = format!("task-{}-{}", task, i);
                    if coordinator
                        .send(Channel::Email, "a@x.com", "b@x.com", &payload, "t")
                        .is_ok()
                    {
                        accepted += 1;
                    }
                    tokio::task::yield_now().await;
                }
                accepted
            })
        })
        .collect();

    let mut accepted = 0;
    for sender in senders {
        accepted += sender.await.unwrap();
    }
    assert_eq!(coordinator.stats().accepted, accepted);

    let email_actor = coordinator.directory().actors(Channel::Email)[0].clone();
    wait_until(|| {
        let stats = coordinator.stats();
        stats.routed + stats.dropped == accepted && email_actor.occupancy() == 0
    })
    .await;
    assert!(email_actor.occupancy() <= email_actor.capacity());

    let mut delivered = 0;
    while h.emails.try_recv().is_ok() {
        delivered += 1;
    }
    assert_eq!(delivered, coordinator.stats().routed);
}
