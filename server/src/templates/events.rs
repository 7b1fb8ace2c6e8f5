use std::fmt::Write as _;

use super::{escape, format_datetime, FormErrors, Layout};
use crate::handlers::pages::forms::{EventForm, ReviewForm};
use crate::models::{AttendeeRsvp, EventView, ReviewWithAuthor, Rsvp, RsvpStatus, User};
use crate::services::events::EventQuery;
use crate::utils::pagination::Paginated;

pub struct EventListContext<'a> {
    pub page: &'a Paginated<EventView>,
    pub query: &'a EventQuery,
    pub organizers: &'a [User],
}

fn page_link(query: &EventQuery, page: u32) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    for (key, value) in [
        ("search", &query.search),
        ("location", &query.location),
        ("organizer", &query.organizer),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            params.push((key, value.to_string()));
        }
    }
    params.push(("page", page.to_string()));
    let encoded = serde_urlencoded::to_string(&params).unwrap_or_default();
    format!("/?{}", escape(&encoded))
}

fn event_card(event: &EventView) -> String {
    let visibility = if event.is_public { "" } else { r#" <span class="muted">(private)</span>"# };
    format!(
        r#"<div class="card">
  <h3><a href="/events/{id}">{title}</a>{visibility}</h3>
  <p class="muted">{start} &middot; {location} &middot; by {organizer}</p>
  <p class="muted">{count} RSVP(s)</p>
</div>"#,
        id = event.id,
        title = escape(&event.title),
        start = format_datetime(event.start_time),
        location = escape(&event.location),
        organizer = escape(&event.organizer.username),
        count = event.rsvp_count,
    )
}

pub fn event_list_page(layout: Layout<'_>, ctx: &EventListContext<'_>) -> String {
    let query = ctx.query;
    let value = |v: &Option<String>| escape(v.as_deref().unwrap_or_default());

    let mut organizer_options = String::from(r#"<option value="">All organizers</option>"#);
    for organizer in ctx.organizers {
        let id = organizer.id.to_string();
        let selected = if query.organizer.as_deref() == Some(id.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            organizer_options,
            r#"<option value="{id}"{selected}>{}</option>"#,
            escape(&organizer.username)
        );
    }

    let mut cards = String::new();
    for event in &ctx.page.results {
        cards.push_str(&event_card(event));
    }
    if cards.is_empty() {
        cards.push_str(r#"<p class="muted">No events found.</p>"#);
    }

    let mut pagination = String::new();
    if ctx.page.total_pages > 1 {
        if ctx.page.has_previous {
            let _ = write!(
                pagination,
                r#"<a href="{}">&laquo; Previous</a> "#,
                page_link(query, ctx.page.page - 1)
            );
        }
        let _ = write!(
            pagination,
            "Page {} of {}",
            ctx.page.page, ctx.page.total_pages
        );
        if ctx.page.has_next {
            let _ = write!(
                pagination,
                r#" <a href="{}">Next &raquo;</a>"#,
                page_link(query, ctx.page.page + 1)
            );
        }
    }

    let body = format!(
        r#"<h1>Upcoming events</h1>
<form method="get" action="/" class="card">
  <label for="search">Search</label>
  <input id="search" name="search" value="{search}">
  <label for="location">Location</label>
  <input id="location" name="location" value="{location}">
  <label for="organizer">Organizer</label>
  <select id="organizer" name="organizer">{organizer_options}</select>
  <button type="submit">Filter</button>
</form>
{cards}
<nav class="pagination">{pagination}</nav>"#,
        search = value(&query.search),
        location = value(&query.location),
    );
    layout.render("Events", &body)
}

pub struct EventDetailContext<'a> {
    pub event: &'a EventView,
    pub rsvps: &'a [AttendeeRsvp],
    pub user_rsvp: Option<&'a Rsvp>,
    pub reviews: &'a [ReviewWithAuthor],
    pub review_form: &'a ReviewForm,
    pub review_errors: &'a FormErrors,
}

fn organizer_controls(event: &EventView) -> String {
    format!(
        r#"<div class="card">
  <a href="/events/{id}/edit">Edit event</a>
  <form method="post" action="/events/{id}/delete">
    <button type="submit">Delete event</button>
  </form>
</div>"#,
        id = event.id
    )
}

fn rsvp_form(event: &EventView, current: Option<&Rsvp>) -> String {
    let mut options = String::new();
    for status in RsvpStatus::ALL {
        let selected = if current.map(|r| r.status) == Some(status) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{s}"{selected}>{s}</option>"#,
            s = status.as_str()
        );
    }
    let current = current
        .map(|r| format!(r#"<p>Your RSVP: <strong>{}</strong></p>"#, r.status))
        .unwrap_or_default();
    format!(
        r#"<div class="card">
  <h2>RSVP</h2>
  {current}
  <form method="post" action="/events/{id}/rsvp">
    <select name="status">{options}</select>
    <button type="submit">Save RSVP</button>
  </form>
</div>"#,
        id = event.id
    )
}

fn review_section(ctx: &EventDetailContext<'_>, viewer: Option<&User>) -> String {
    let event = ctx.event;
    let mut items = String::new();
    for row in ctx.reviews {
        let review = &row.review;
        let delete = match viewer {
            Some(user) if user.id == review.user_id => format!(
                r#"<form method="post" action="/events/{event}/review/delete">
      <input type="hidden" name="review_id" value="{id}">
      <button type="submit">Delete</button>
    </form>"#,
                event = event.id,
                id = review.id
            ),
            _ => String::new(),
        };
        let _ = write!(
            items,
            r#"<div class="card">
    <strong>{rating}/5</strong> by {author} <span class="muted">{when}</span>
    <p>{comment}</p>
    {delete}
  </div>"#,
            rating = review.rating,
            author = escape(&row.username),
            when = format_datetime(review.created_at),
            comment = escape(&review.comment),
        );
    }
    if items.is_empty() {
        items.push_str(r#"<p class="muted">No reviews yet.</p>"#);
    }

    let form = match viewer {
        Some(_) => format!(
            r#"<form method="post" action="/events/{id}/review" class="card">
    {non_field}
    <label for="rating">Rating (1-5)</label>
    <input id="rating" name="rating" type="number" min="1" max="5" value="{rating}">
    {rating_errors}
    <label for="comment">Comment</label>
    <textarea id="comment" name="comment" rows="3">{comment}</textarea>
    {comment_errors}
    <button type="submit">Submit review</button>
  </form>"#,
            id = event.id,
            non_field = ctx.review_errors.render_non_field(),
            rating = escape(&ctx.review_form.rating),
            rating_errors = ctx.review_errors.render("rating"),
            comment = escape(&ctx.review_form.comment),
            comment_errors = ctx.review_errors.render("comment"),
        ),
        None => String::new(),
    };

    format!(
        r#"<section>
  <h2>Reviews</h2>
  {items}
  {form}
</section>"#
    )
}

pub fn event_detail_page(layout: Layout<'_>, ctx: &EventDetailContext<'_>) -> String {
    let event = ctx.event;
    let viewer = layout.user;
    let is_organizer = viewer.is_some_and(|u| u.id == event.organizer.id);

    let mut attendees = String::new();
    for row in ctx.rsvps {
        let _ = write!(
            attendees,
            "<li>{} &middot; {}</li>",
            escape(&row.username),
            row.rsvp.status
        );
    }
    if attendees.is_empty() {
        attendees.push_str(r#"<li class="muted">No RSVPs yet.</li>"#);
    }

    let actions = match viewer {
        Some(_) => {
            let mut actions = rsvp_form(event, ctx.user_rsvp);
            if is_organizer {
                actions.push_str(&organizer_controls(event));
            }
            actions
        }
        None => format!(
            r#"<p><a href="/login?next=/events/{}">Log in</a> to RSVP or leave a review.</p>"#,
            event.id
        ),
    };

    let body = format!(
        r#"<article>
  <h1>{title}</h1>
  <p class="muted">Organized by {organizer}{visibility}</p>
  <p><strong>When:</strong> {start} &ndash; {end}</p>
  <p><strong>Where:</strong> {location}</p>
  <p>{description}</p>
</article>
{actions}
<section>
  <h2>Attendees ({count})</h2>
  <ul>{attendees}</ul>
</section>
{reviews}"#,
        title = escape(&event.title),
        organizer = escape(&event.organizer.username),
        visibility = if event.is_public { "" } else { " &middot; private event" },
        start = format_datetime(event.start_time),
        end = format_datetime(event.end_time),
        location = escape(&event.location),
        description = escape(&event.description),
        count = event.rsvp_count,
        reviews = review_section(ctx, viewer),
    );
    layout.render(&event.title, &body)
}

pub fn event_form_page(
    layout: Layout<'_>,
    heading: &str,
    action: &str,
    form: &EventForm,
    errors: &FormErrors,
) -> String {
    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}" class="card">
  {non_field}
  <label for="title">Title</label>
  <input id="title" name="title" maxlength="200" value="{title}">
  {title_errors}
  <label for="description">Description</label>
  <textarea id="description" name="description" rows="4">{description}</textarea>
  {description_errors}
  <label for="location">Location</label>
  <input id="location" name="location" maxlength="255" value="{location}">
  {location_errors}
  <label for="start_time">Start time (UTC)</label>
  <input id="start_time" name="start_time" type="datetime-local" value="{start}">
  {start_errors}
  <label for="end_time">End time (UTC)</label>
  <input id="end_time" name="end_time" type="datetime-local" value="{end}">
  {end_errors}
  <label><input type="checkbox" name="is_public"{checked}> Public event</label>
  <button type="submit">Save</button>
</form>"#,
        heading = escape(heading),
        action = escape(action),
        non_field = errors.render_non_field(),
        title = escape(&form.title),
        title_errors = errors.render("title"),
        description = escape(&form.description),
        description_errors = errors.render("description"),
        location = escape(&form.location),
        location_errors = errors.render("location"),
        start = escape(&form.start_time),
        start_errors = errors.render("start_time"),
        end = escape(&form.end_time),
        end_errors = errors.render("end_time"),
        checked = if form.is_public() { " checked" } else { "" },
    );
    layout.render(heading, &body)
}
