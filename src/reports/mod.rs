//! Output formats for a completed fetch run
//!
//! Every generator takes its input by reference and writes into a caller-supplied
//! writer, so the same batch can be rendered to several destinations:
//! - **Console**: ranked table with each repository's authors, optionally colored
//! - **JSON**: the whole batch, pretty-printed
//! - **CSV**: one file per record shape from [`crate::records`]

mod console;
mod csv;
mod json;

pub use console::generate as generate_console;
pub use csv::generate as generate_csv;
pub use json::generate as generate_json;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::{AuthorCommitCount, EntityReport, EntitySummary, FetchBatch};
    use chrono::{DateTime, Utc};

    pub fn sample_batch() -> FetchBatch {
        let fetched_at: DateTime<Utc> = "2024-01-15T10:30:00Z".parse().unwrap();
        let summary = |rank: u32, owner: &str, name: &str, language: &str| EntitySummary {
            name: name.to_string(),
            owner: owner.to_string(),
            rank,
            stars: 400_000 / u64::from(rank),
            watchers: 9_000 / u64::from(rank),
            forks: 30_000 / u64::from(rank),
            language: language.to_string(),
        };

        FetchBatch::new(
            fetched_at,
            vec![
                EntityReport {
                    summary: summary(1, "freeCodeCamp", "freeCodeCamp", "TypeScript"),
                    authors_today: vec![AuthorCommitCount::new("Naomi", 3), AuthorCommitCount::new("renovate[bot]", 1)],
                },
                EntityReport {
                    summary: summary(2, "EbookFoundation", "free-programming-books", "Unknown"),
                    authors_today: Vec::new(),
                },
            ],
        )
    }
}
