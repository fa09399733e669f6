use super::{load_index, Outcome, Services};
use anyhow::Result;
use std::io::Write;

/// Print every catalog entry as `<id>\t<name>`, ordered by display name.
pub async fn execute(services: &Services, refresh: bool, out: &mut dyn Write) -> Result<Outcome> {
    let index = load_index(services, refresh).await?;
    for entry in index.entries_sorted_by_name() {
        writeln!(out, "{}\t{}", entry.id, entry.name)?;
    }
    Ok(Outcome::Completed)
}
