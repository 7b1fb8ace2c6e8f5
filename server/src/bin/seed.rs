//! Wipes the database and fills it with demo users, events, RSVPs and
//! reviews. Every demo account uses the password `password123`.

use chrono::{Duration, Utc};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use eventhub_server::auth::hash_password;
use eventhub_server::config::Config;
use eventhub_server::models::{EventInput, NewProfile, NewUser, RsvpStatus, User};
use eventhub_server::store::{EventStore, PgStore};

const DEMO_PASSWORD: &str = "password123";

const USERS: [(&str, &str, &str, &str); 8] = [
    ("john_doe", "John Doe", "Event enthusiast and tech lover", "San Francisco, CA"),
    ("jane_smith", "Jane Smith", "Professional event organizer", "New York, NY"),
    ("mike_jones", "Mike Jones", "Music festival fanatic", "Austin, TX"),
    ("sarah_wilson", "Sarah Wilson", "Corporate event planner", "Chicago, IL"),
    ("david_brown", "David Brown", "Startup founder and networker", "Seattle, WA"),
    ("emily_davis", "Emily Davis", "Marketing professional", "Boston, MA"),
    ("alex_miller", "Alex Miller", "Software developer", "Denver, CO"),
    ("lisa_garcia", "Lisa Garcia", "Photography enthusiast", "Miami, FL"),
];

struct DemoEvent {
    title: &'static str,
    description: &'static str,
    organizer: usize,
    location: &'static str,
    starts_in_days: i64,
    duration_hours: i64,
    is_public: bool,
}

const EVENTS: [DemoEvent; 8] = [
    DemoEvent {
        title: "Tech Innovation Summit",
        description: "A day of technology talks, networking and product showcases.",
        organizer: 1,
        location: "Moscone Center, San Francisco",
        starts_in_days: 10,
        duration_hours: 8,
        is_public: true,
    },
    DemoEvent {
        title: "Summer Music Festival",
        description: "A weekend of live music on three stages, with food trucks and camping.",
        organizer: 2,
        location: "Zilker Park, Austin",
        starts_in_days: 20,
        duration_hours: 48,
        is_public: true,
    },
    DemoEvent {
        title: "Startup Networking Night",
        description: "Meet founders, investors and mentors in a relaxed setting.",
        organizer: 4,
        location: "WeWork Downtown, Seattle",
        starts_in_days: 5,
        duration_hours: 3,
        is_public: true,
    },
    DemoEvent {
        title: "Photography Workshop",
        description: "Composition, lighting and post-processing with working photographers.",
        organizer: 7,
        location: "Art District Studio, Miami",
        starts_in_days: 15,
        duration_hours: 6,
        is_public: true,
    },
    DemoEvent {
        title: "Corporate Team Building Retreat",
        description: "Invitation-only retreat on team cohesion and leadership.",
        organizer: 3,
        location: "Resort & Conference Center, Chicago",
        starts_in_days: 30,
        duration_hours: 48,
        is_public: false,
    },
    DemoEvent {
        title: "Web Development Bootcamp",
        description: "Three intensive days of modern web development and cloud deployment.",
        organizer: 6,
        location: "Tech Hub, Denver",
        starts_in_days: 25,
        duration_hours: 54,
        is_public: true,
    },
    DemoEvent {
        title: "Community Charity Run",
        description: "Annual 5K supporting local education. All fitness levels welcome.",
        organizer: 0,
        location: "Central Park, New York",
        starts_in_days: 12,
        duration_hours: 3,
        is_public: true,
    },
    DemoEvent {
        title: "Spring Product Meetup",
        description: "Lightning talks from product teams, followed by drinks.",
        organizer: 1,
        location: "Pier 27, San Francisco",
        starts_in_days: -14,
        duration_hours: 4,
        is_public: true,
    },
];

const REVIEW_COMMENTS: [&str; 4] = [
    "Amazing event! Well organized and great content.",
    "Fantastic experience. Would definitely attend again.",
    "Excellent networking opportunities and valuable insights.",
    "Good event overall, but could use better timing.",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let store = PgStore::new(pool);
    tracing::info!("Clearing existing data");
    store.reset().await?;

    let password_hash = hash_password(DEMO_PASSWORD)?;
    let mut users: Vec<User> = Vec::with_capacity(USERS.len());
    for (username, full_name, bio, location) in USERS {
        let user = store
            .create_user(
                NewUser {
                    username: username.to_string(),
                    email: format!("{}@example.com", username.replace('_', ".")),
                    password_hash: password_hash.clone(),
                },
                NewProfile {
                    full_name: full_name.to_string(),
                    bio: bio.to_string(),
                    location: location.to_string(),
                    profile_picture: None,
                },
            )
            .await?;
        users.push(user);
    }
    tracing::info!(count = users.len(), "Created users");

    let now = Utc::now();
    let mut rsvp_count = 0;
    let mut review_count = 0;
    for (index, demo) in EVENTS.iter().enumerate() {
        let start_time = now + Duration::days(demo.starts_in_days);
        let organizer = &users[demo.organizer];
        let event = store
            .create_event(
                organizer.id,
                EventInput {
                    title: demo.title.to_string(),
                    description: demo.description.to_string(),
                    location: demo.location.to_string(),
                    start_time,
                    end_time: start_time + Duration::hours(demo.duration_hours),
                    is_public: demo.is_public,
                },
            )
            .await?;

        // Everyone but the organizer answers, cycling through the statuses.
        let attendees = users.iter().filter(|u| u.id != organizer.id);
        for (offset, user) in attendees.enumerate().take(3 + index % 4) {
            let status = RsvpStatus::ALL[(index + offset) % RsvpStatus::ALL.len()];
            store.upsert_rsvp(event.id, user.id, status).await?;
            rsvp_count += 1;

            if status == RsvpStatus::Going && event.has_started(now) {
                let comment = REVIEW_COMMENTS[(index + offset) % REVIEW_COMMENTS.len()];
                let rating = 4 + (offset % 2) as i16;
                store
                    .create_review(event.id, user.id, rating, comment.to_string())
                    .await?;
                review_count += 1;
            }
        }
    }

    tracing::info!(
        events = EVENTS.len(),
        rsvps = rsvp_count,
        reviews = review_count,
        "Demo data ready; log in as any user with password {}",
        DEMO_PASSWORD
    );
    Ok(())
}
