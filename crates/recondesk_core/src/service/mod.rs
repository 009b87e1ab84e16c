//! Manager use-cases over tenant storage slots.
//!
//! # Responsibility
//! - Orchestrate slot reads/writes into contact, todo, calendar, settings
//!   and dashboard operations.
//! - Keep CLI and integration callers decoupled from storage details.
//!
//! # Invariants
//! - Services are generic over `SlotRepository`; none touch SQL directly.
//! - Filtering and search are linear scans over the loaded collection.

pub mod calendar_service;
pub mod contact_service;
pub mod dashboard_service;
pub mod settings_service;
pub mod todo_service;

/// Case-insensitive substring match of a lowercase `needle` against fields.
pub(crate) fn matches_text<'a>(fields: impl IntoIterator<Item = &'a str>, needle: &str) -> bool {
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::matches_text;

    #[test]
    fn matches_text_ignores_case_of_fields() {
        assert!(matches_text(["Metro BODY Shop", "x"], "body"));
        assert!(!matches_text(["Metro"], "body"));
        assert!(!matches_text(Vec::<&str>::new(), "a"));
    }
}
