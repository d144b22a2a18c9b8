//! Tabular export of accumulated lineages.

use std::collections::HashSet;
use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};

use super::{Lineage, Taxonomy};
use crate::Result;

/// Fixed metadata columns preceding the rank columns.
const META_COLUMNS: [&str; 4] = ["tax_id", "parent_id", "rank", "tax_name"];

impl Taxonomy {
    /// Serialize cached lineages as a rectangular CSV table with
    /// non-numeric fields quoted.
    ///
    /// Columns are `tax_id, parent_id, rank, tax_name` followed by rank
    /// columns in registry order; with `full = false` only ranks that
    /// occur in at least one exported lineage get a column, with
    /// `full = true` the entire registry does. Rows are ordered by tax_id
    /// (numeric value, then lexicographic). `taxa` restricts the export
    /// to a subset of the cache; `None` exports everything cached.
    ///
    /// This is a pure projection: lineages absent from the cache are not
    /// built here, and nothing is mutated.
    pub fn write_table<W: Write>(
        &self,
        taxa: Option<&HashSet<String>>,
        full: bool,
        out: W,
    ) -> Result<()> {
        let mut rows: Vec<&Lineage> = self
            .lineages
            .values()
            .filter(|lineage| taxa.map_or(true, |t| t.contains(&lineage.tax_id)))
            .collect();
        rows.sort_by_key(|lineage| {
            (
                lineage.tax_id.parse::<u64>().unwrap_or(u64::MAX),
                lineage.tax_id.clone(),
            )
        });

        let rank_columns: Vec<&str> = if full {
            self.ranks.labels().collect()
        } else {
            self.ranks
                .labels()
                .filter(|rank| rows.iter().any(|lineage| lineage.ranks.contains_key(*rank)))
                .collect()
        };

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::NonNumeric)
            .from_writer(out);

        writer.write_record(META_COLUMNS.iter().copied().chain(rank_columns.iter().copied()))?;
        for lineage in rows {
            let mut record: Vec<&str> = Vec::with_capacity(META_COLUMNS.len() + rank_columns.len());
            record.push(&lineage.tax_id);
            record.push(&lineage.parent_id);
            record.push(&lineage.rank);
            record.push(&lineage.tax_name);
            for rank in &rank_columns {
                record.push(lineage.ancestor_at(rank).unwrap_or(""));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
