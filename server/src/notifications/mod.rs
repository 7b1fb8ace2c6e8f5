//! E-mail notifications about events.
//!
//! Handlers hand a [`Notification`] to [`Notifier::dispatch`], which resolves
//! the recipients and sends on a spawned task. Failures are logged and never
//! reach the request that triggered them.

mod mailer;
mod reminders;
mod smtp;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Event, RsvpStatus};
use crate::store::{EventStore, StoreError};

pub use mailer::{LogMailer, MailError, Mailer, OutgoingEmail, RecordingMailer};
pub use reminders::{run_reminder_sweep, spawn_reminder_worker, REMINDER_WINDOW_HOURS};
pub use smtp::SmtpMailer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Sent to everyone who said "Going" to an earlier event by the same organizer.
    EventCreated { event_id: Uuid },
    /// Sent to every RSVP holder of the event.
    EventUpdated { event_id: Uuid },
    RsvpConfirmation { event_id: Uuid, user_id: Uuid },
    /// Sent to "Going" attendees the day before the event.
    EventReminder { event_id: Uuid },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::EventCreated { .. } => "event_created",
            Notification::EventUpdated { .. } => "event_updated",
            Notification::RsvpConfirmation { .. } => "rsvp_confirmation",
            Notification::EventReminder { .. } => "event_reminder",
        }
    }

    pub fn event_id(&self) -> Uuid {
        match self {
            Notification::EventCreated { event_id }
            | Notification::EventUpdated { event_id }
            | Notification::RsvpConfirmation { event_id, .. }
            | Notification::EventReminder { event_id } => *event_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn EventStore>,
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl Notifier {
    pub fn new(store: Arc<dyn EventStore>, mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            store,
            mailer,
            from: from.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Sends in the background.
    pub fn dispatch(&self, notification: Notification) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.deliver(notification).await {
                warn!(
                    kind = notification.kind(),
                    event_id = %notification.event_id(),
                    error = %e,
                    "Failed to send notification"
                );
            }
        });
    }

    /// Sends one message per recipient and returns how many went out. A
    /// recipient whose message fails is logged and skipped; only store
    /// failures abort the delivery.
    pub async fn deliver(&self, notification: Notification) -> Result<usize, NotifyError> {
        let Some(event) = self.store.get_event(notification.event_id()).await? else {
            debug!(kind = notification.kind(), "Notification for a deleted event dropped");
            return Ok(0);
        };

        let recipients = self.recipients(&notification, &event).await?;
        if recipients.is_empty() {
            return Ok(0);
        }

        let (subject, body) = self.compose(&notification, &event).await?;
        let mut delivered = 0;
        for to in recipients {
            let email = OutgoingEmail {
                from: self.from.clone(),
                to,
                subject: subject.clone(),
                body: body.clone(),
            };
            let to = email.to.clone();
            match self.mailer.send(email).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    kind = notification.kind(),
                    event_id = %event.id,
                    to = %to,
                    error = %e,
                    "Failed to send e-mail"
                ),
            }
        }

        info!(
            kind = notification.kind(),
            event_id = %event.id,
            recipients = delivered,
            "Notification sent"
        );
        Ok(delivered)
    }

    async fn recipients(
        &self,
        notification: &Notification,
        event: &Event,
    ) -> Result<Vec<String>, StoreError> {
        match notification {
            Notification::EventCreated { .. } => {
                self.store.past_attendee_emails(event.organizer_id).await
            }
            Notification::EventUpdated { .. } => self.store.attendee_emails(event.id, None).await,
            Notification::RsvpConfirmation { user_id, .. } => Ok(self
                .store
                .get_user(*user_id)
                .await?
                .map(|user| vec![user.email])
                .unwrap_or_default()),
            Notification::EventReminder { .. } => {
                self.store
                    .attendee_emails(event.id, Some(RsvpStatus::Going))
                    .await
            }
        }
    }

    async fn compose(
        &self,
        notification: &Notification,
        event: &Event,
    ) -> Result<(String, String), StoreError> {
        let message = match notification {
            Notification::EventCreated { .. } => {
                let organizer = self
                    .store
                    .get_user(event.organizer_id)
                    .await?
                    .map(|user| user.username)
                    .unwrap_or_default();
                (
                    format!("New Event Created: {}", event.title),
                    format!(
                        "A new event has been created!\n\n{}Organizer: {}\n",
                        details(event, true),
                        organizer
                    ),
                )
            }
            Notification::EventUpdated { .. } => (
                format!("Event Updated: {}", event.title),
                format!(
                    "An event you're interested in has been updated!\n\n{}",
                    details(event, true)
                ),
            ),
            Notification::RsvpConfirmation { .. } => (
                format!("RSVP Confirmation: {}", event.title),
                format!(
                    "Your RSVP has been confirmed!\n\n{}\nWe look forward to seeing you there!\n",
                    details(event, false)
                ),
            ),
            Notification::EventReminder { .. } => (
                format!("Event Reminder: {} - Tomorrow!", event.title),
                format!(
                    "Don't forget about the event tomorrow!\n\n{}\nSee you there!\n",
                    details(event, false)
                ),
            ),
        };
        Ok(message)
    }
}

fn details(event: &Event, with_description: bool) -> String {
    let mut text = format!("Event: {}\n", event.title);
    if with_description {
        text.push_str(&format!("Description: {}\n", event.description));
    }
    text.push_str(&format!(
        "Location: {}\nStart Time: {}\nEnd Time: {}\n",
        event.location,
        event.start_time.format("%Y-%m-%d %H:%M UTC"),
        event.end_time.format("%Y-%m-%d %H:%M UTC"),
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventInput, NewProfile, NewUser};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    async fn user(store: &MemoryStore, username: &str) -> crate::models::User {
        store
            .create_user(
                NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password_hash: String::new(),
                },
                NewProfile::default(),
            )
            .await
            .unwrap()
    }

    fn input(title: &str) -> EventInput {
        let start = Utc::now() + Duration::days(3);
        EventInput {
            title: title.to_string(),
            description: "Talks and snacks".to_string(),
            location: "Main hall".to_string(),
            start_time: start,
            end_time: start + Duration::hours(2),
            is_public: true,
        }
    }

    #[tokio::test]
    async fn test_event_created_goes_to_past_attendees() {
        let store = Arc::new(MemoryStore::new());
        let organizer = user(&store, "organizer").await;
        let going = user(&store, "going").await;
        let maybe = user(&store, "maybe").await;

        let first = store.create_event(organizer.id, input("Meetup #1")).await.unwrap();
        store.upsert_rsvp(first.id, going.id, RsvpStatus::Going).await.unwrap();
        store.upsert_rsvp(first.id, maybe.id, RsvpStatus::Maybe).await.unwrap();
        let second = store.create_event(organizer.id, input("Meetup #2")).await.unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(store, mailer.clone(), "noreply@example.com");
        let sent = notifier
            .deliver(Notification::EventCreated { event_id: second.id })
            .await
            .unwrap();

        assert_eq!(sent, 1);
        let outbox = mailer.sent();
        assert_eq!(outbox[0].to, "going@example.com");
        assert_eq!(outbox[0].subject, "New Event Created: Meetup #2");
        assert!(outbox[0].body.contains("Organizer: organizer"));
    }

    #[tokio::test]
    async fn test_rsvp_confirmation_goes_to_the_user() {
        let store = Arc::new(MemoryStore::new());
        let organizer = user(&store, "organizer").await;
        let guest = user(&store, "guest").await;
        let event = store.create_event(organizer.id, input("Launch")).await.unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(store, mailer.clone(), "noreply@example.com");
        notifier
            .deliver(Notification::RsvpConfirmation {
                event_id: event.id,
                user_id: guest.id,
            })
            .await
            .unwrap();

        let outbox = mailer.sent();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "guest@example.com");
        assert_eq!(outbox[0].subject, "RSVP Confirmation: Launch");
    }

    #[tokio::test]
    async fn test_missing_event_sends_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(store, mailer.clone(), "noreply@example.com");

        let sent = notifier
            .deliver(Notification::EventUpdated {
                event_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        assert_eq!(sent, 0);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bounced_recipient_does_not_stop_the_rest() {
        let store = Arc::new(MemoryStore::new());
        let organizer = user(&store, "organizer").await;
        let bounce = user(&store, "bounce").await;
        let guest = user(&store, "guest").await;
        let event = store.create_event(organizer.id, input("Launch")).await.unwrap();
        store.upsert_rsvp(event.id, bounce.id, RsvpStatus::Maybe).await.unwrap();
        store.upsert_rsvp(event.id, guest.id, RsvpStatus::Going).await.unwrap();

        let mailer = Arc::new(RecordingMailer::rejecting("bounce@example.com"));
        let notifier = Notifier::new(store, mailer.clone(), "noreply@example.com");
        let sent = notifier
            .deliver(Notification::EventUpdated { event_id: event.id })
            .await
            .unwrap();

        assert_eq!(sent, 1);
        let outbox = mailer.sent();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "guest@example.com");
    }
}
