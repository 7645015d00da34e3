use super::handlers::{self, types};
use utoipa::OpenApi;
use utoipa::openapi::{Contact, License};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::login::login, handlers::health::health),
    components(schemas(
        types::LoginRequest,
        types::LoginResponse,
        types::LoginUser,
        types::ErrorResponse,
        types::SuspendedResponse,
        types::Health,
    )),
    tags(
        (name = "auth", description = "Password login with account suspension and origin blocking"),
        (name = "health", description = "Liveness"),
    )
)]
struct ApiDoc;

/// `OpenAPI` document for every served endpoint, described from Cargo metadata.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = optional_str(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
    doc.info.contact = cargo_contact();
    doc.info.license = cargo_license();
    doc
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `:` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(':').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    let (name, email) = match author.find('<') {
        Some(start) => (
            author[..start].trim(),
            author[start + 1..].trim_end_matches('>').trim(),
        ),
        None => (author.trim(), ""),
    };
    (
        (!name.is_empty()).then_some(name),
        (!email.is_empty()).then_some(email),
    )
}
