pub mod event;
pub mod review;
pub mod rsvp;
pub mod user;
pub mod validation;

pub use event::{Event, EventInput, EventListing, EventPatch, EventView};
pub use review::{
    CreateReviewRequest, Review, ReviewPatch, ReviewRequest, ReviewView, ReviewWithAuthor,
};
pub use rsvp::{AttendeeRsvp, CreateRsvpRequest, Rsvp, RsvpRequest, RsvpStatus, RsvpView, UserRsvp};
pub use user::{
    LoginRequest, NewProfile, NewUser, ProfileUpdate, ProfileView, PublicUser, RegisterRequest,
    User, UserProfile, UserSummary,
};
