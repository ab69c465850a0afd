mod fixtures;

pub use fixtures::{ClipboardFixtures, Fixture};
