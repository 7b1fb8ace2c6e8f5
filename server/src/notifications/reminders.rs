use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{Notification, Notifier, NotifyError};

/// How far ahead of an event its reminder goes out.
pub const REMINDER_WINDOW_HOURS: i64 = 24;

/// Reminds "Going" attendees of every event starting within the window and
/// marks those events so they are reminded only once. Returns how many events
/// were reminded.
///
/// Bounced recipients are skipped, not retried. An event stays unmarked only
/// when its recipients could not be resolved, in which case nothing was sent.
pub async fn run_reminder_sweep(notifier: &Notifier, now: DateTime<Utc>) -> Result<usize, NotifyError> {
    let store = notifier.store();
    let until = now + Duration::hours(REMINDER_WINDOW_HOURS);
    let due = store.events_needing_reminder(now, until).await?;

    let mut reminded = 0;
    for event in due {
        match notifier
            .deliver(Notification::EventReminder { event_id: event.id })
            .await
        {
            Ok(_) => {
                store.mark_reminder_sent(event.id, now).await?;
                reminded += 1;
            }
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Failed to send event reminder");
            }
        }
    }
    Ok(reminded)
}

pub fn spawn_reminder_worker(notifier: Notifier, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "Reminder worker started");
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match run_reminder_sweep(&notifier, Utc::now()).await {
                Ok(0) => {}
                Ok(count) => info!(events = count, "Event reminders sent"),
                Err(e) => warn!(error = %e, "Reminder sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::{EventInput, NewProfile, NewUser, RsvpStatus};
    use crate::notifications::RecordingMailer;
    use crate::store::{EventStore, MemoryStore};

    fn starting_in(hours: i64) -> EventInput {
        let start = Utc::now() + Duration::hours(hours);
        EventInput {
            title: format!("In {hours}h"),
            description: String::new(),
            location: "Library".to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            is_public: true,
        }
    }

    #[tokio::test]
    async fn test_reminds_going_attendees_once() {
        let store = Arc::new(MemoryStore::new());
        let organizer = store
            .create_user(
                NewUser {
                    username: "organizer".to_string(),
                    email: "organizer@example.com".to_string(),
                    password_hash: String::new(),
                },
                NewProfile::default(),
            )
            .await
            .unwrap();
        let guest = store
            .create_user(
                NewUser {
                    username: "guest".to_string(),
                    email: "guest@example.com".to_string(),
                    password_hash: String::new(),
                },
                NewProfile::default(),
            )
            .await
            .unwrap();

        let soon = store.create_event(organizer.id, starting_in(3)).await.unwrap();
        let later = store.create_event(organizer.id, starting_in(72)).await.unwrap();
        for event in [&soon, &later] {
            store
                .upsert_rsvp(event.id, guest.id, RsvpStatus::Going)
                .await
                .unwrap();
        }
        store
            .upsert_rsvp(soon.id, organizer.id, RsvpStatus::NotGoing)
            .await
            .unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(store.clone(), mailer.clone(), "noreply@example.com");

        assert_eq!(run_reminder_sweep(&notifier, Utc::now()).await.unwrap(), 1);
        assert_eq!(run_reminder_sweep(&notifier, Utc::now()).await.unwrap(), 0);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "guest@example.com");
        assert_eq!(sent[0].subject, "Event Reminder: In 3h - Tomorrow!");

        let soon = store.get_event(soon.id).await.unwrap().unwrap();
        assert!(soon.reminder_sent_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_reminder_is_not_resent() {
        let store = Arc::new(MemoryStore::new());
        let organizer = store
            .create_user(
                NewUser {
                    username: "organizer".to_string(),
                    email: "organizer@example.com".to_string(),
                    password_hash: String::new(),
                },
                NewProfile::default(),
            )
            .await
            .unwrap();
        let event = store.create_event(organizer.id, starting_in(2)).await.unwrap();
        store
            .upsert_rsvp(event.id, organizer.id, RsvpStatus::Going)
            .await
            .unwrap();

        let failing = Notifier::new(
            store.clone(),
            Arc::new(RecordingMailer::failing()),
            "noreply@example.com",
        );
        assert_eq!(run_reminder_sweep(&failing, Utc::now()).await.unwrap(), 1);

        let working = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(store.clone(), working.clone(), "noreply@example.com");
        assert_eq!(run_reminder_sweep(&notifier, Utc::now()).await.unwrap(), 0);
        assert!(working.sent().is_empty());
    }

    #[tokio::test]
    async fn test_one_bounced_attendee_does_not_repeat_reminders() {
        let store = Arc::new(MemoryStore::new());
        let mut users = Vec::new();
        for username in ["organizer", "good", "bounce"] {
            let user = store
                .create_user(
                    NewUser {
                        username: username.to_string(),
                        email: format!("{username}@example.com"),
                        password_hash: String::new(),
                    },
                    NewProfile::default(),
                )
                .await
                .unwrap();
            users.push(user);
        }
        let event = store.create_event(users[0].id, starting_in(4)).await.unwrap();
        for attendee in &users[1..] {
            store
                .upsert_rsvp(event.id, attendee.id, RsvpStatus::Going)
                .await
                .unwrap();
        }

        let mailer = Arc::new(RecordingMailer::rejecting("bounce@example.com"));
        let notifier = Notifier::new(store.clone(), mailer.clone(), "noreply@example.com");
        for _ in 0..3 {
            run_reminder_sweep(&notifier, Utc::now()).await.unwrap();
        }

        let sent: Vec<String> = mailer.sent().into_iter().map(|m| m.to).collect();
        assert_eq!(sent, vec!["good@example.com".to_string()]);
    }
}
