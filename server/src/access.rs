//! Event visibility and organizer-only mutation rules.
//!
//! Both checks are pure functions; callers resolve whether the viewer holds
//! an RSVP before asking.

use uuid::Uuid;

use crate::models::{Event, User};

/// Who is looking at an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User { id: Uuid, has_rsvp: bool },
}

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User { id, .. } => Some(*id),
        }
    }
}

/// Public events are visible to everyone; private events only to their
/// organizer and to users holding an RSVP.
pub fn can_view(event: &Event, viewer: &Viewer) -> bool {
    if event.is_public {
        return true;
    }
    match viewer {
        Viewer::Anonymous => false,
        Viewer::User { id, has_rsvp } => *id == event.organizer_id || *has_rsvp,
    }
}

pub fn authorize_mutation(event: &Event, requester: &User) -> bool {
    event.organizer_id == requester.id
}
