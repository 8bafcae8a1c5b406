use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::AppointmentEvent;

pub type EventReceiver = broadcast::Receiver<AppointmentEvent>;

const ESTABLISHMENT_CHANNEL_CAPACITY: usize = 1000;
const PROFESSIONAL_CHANNEL_CAPACITY: usize = 100;

/// Fans committed booking changes out to connected viewers so stale slot
/// lists get refreshed. Delivery is at-least-once per live subscriber and
/// best-effort overall: a missed event is recovered by the consumer's own
/// periodic refetch, never by replay.
pub struct ChangeNotifier {
    professional_channels: RwLock<HashMap<Uuid, broadcast::Sender<AppointmentEvent>>>,
    establishment: broadcast::Sender<AppointmentEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (establishment, _) = broadcast::channel(ESTABLISHMENT_CHANNEL_CAPACITY);

        Self {
            professional_channels: RwLock::new(HashMap::new()),
            establishment,
        }
    }

    /// Subscribe to every appointment change in the establishment.
    pub fn subscribe_all(&self) -> EventReceiver {
        self.establishment.subscribe()
    }

    /// Subscribe to changes for a single professional's calendar.
    pub async fn subscribe_professional(&self, professional_id: Uuid) -> EventReceiver {
        let mut channels = self.professional_channels.write().await;
        channels
            .entry(professional_id)
            .or_insert_with(|| broadcast::channel(PROFESSIONAL_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Fire-and-forget publish. Channels without live receivers return a
    /// send error, which is not a failure here.
    pub async fn publish(&self, event: AppointmentEvent) {
        let professional_id = event.professional_id();

        let channels = self.professional_channels.read().await;
        if let Some(sender) = channels.get(&professional_id) {
            let _ = sender.send(event.clone());
        }
        drop(channels);

        let _ = self.establishment.send(event);

        debug!("Published appointment event for professional {}", professional_id);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, AppointmentStatus};
    use chrono::{Duration, Utc};

    fn appointment(professional_id: Uuid) -> Appointment {
        let starts_at = Utc::now() + Duration::days(1);
        Appointment {
            id: Uuid::new_v4(),
            professional_id,
            client_name: "Dana".to_string(),
            client_phone: "+15550100".to_string(),
            client_account_id: None,
            service_ids: vec![Uuid::new_v4()],
            starts_at,
            ends_at: starts_at + Duration::minutes(30),
            status: AppointmentStatus::Scheduled,
            notes: None,
            cancelled_by: None,
            cancellation_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn establishment_subscribers_see_every_event() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe_all();

        let apt = appointment(Uuid::new_v4());
        notifier
            .publish(AppointmentEvent::Created {
                appointment: apt.clone(),
            })
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.appointment().id, apt.id);
    }

    #[tokio::test]
    async fn professional_channels_are_isolated() {
        let notifier = ChangeNotifier::new();
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut rx = notifier.subscribe_professional(watched).await;

        notifier
            .publish(AppointmentEvent::Created {
                appointment: appointment(other),
            })
            .await;
        notifier
            .publish(AppointmentEvent::Cancelled {
                appointment: appointment(watched),
            })
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.professional_id(), watched);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let notifier = ChangeNotifier::new();
        notifier
            .publish(AppointmentEvent::Completed {
                appointment: appointment(Uuid::new_v4()),
            })
            .await;
    }
}
