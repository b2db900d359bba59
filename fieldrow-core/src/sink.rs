use crate::schema::LabelSchema;
use crate::types::ExtractionRow;
use anyhow::Result;
use std::path::Path;

/// Row sink abstraction: accepts one Extraction Row per document plus the
/// ordered schema and persists them as a tabular file. Merging rows by
/// document identity is the sink's responsibility, not the engine's.
pub trait RowSink {
    /// Record a row under a document identity; a later row for the same
    /// identity replaces the earlier one (last write wins).
    fn upsert(&mut self, identity: &str, row: ExtractionRow);

    /// Persist everything recorded so far.
    fn write(&self) -> Result<()>;
}

/// Delimited-text sink: one `file` identity column followed by the schema
/// columns, one row per document.
pub struct CsvSink {
    output_path: std::path::PathBuf,
    schema: LabelSchema,
    rows: Vec<(String, ExtractionRow)>,
}

impl CsvSink {
    pub fn new(output_path: &Path, schema: LabelSchema) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            schema,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSink for CsvSink {
    fn upsert(&mut self, identity: &str, row: ExtractionRow) {
        match self.rows.iter_mut().find(|(id, _)| id == identity) {
            Some(entry) => entry.1 = row,
            None => self.rows.push((identity.to_string(), row)),
        }
    }

    fn write(&self) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().from_path(&self.output_path)?;

        let mut header: Vec<&str> = vec!["file"];
        header.extend(self.schema.iter());
        writer.write_record(&header)?;

        for (identity, row) in &self.rows {
            let mut record: Vec<&str> = vec![identity.as_str()];
            // rows are schema-ordered by construction; fall back through the
            // schema anyway so a foreign row can't shift columns
            record.extend(self.schema.iter().map(|label| row.get(label).unwrap_or("")));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
