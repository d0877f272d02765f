//! Checkpointed, append-only persistence of results and errors.
//!
//! Rows are buffered in memory and appended to their CSV store whenever a
//! buffer reaches its flush size, and once more at the end of the run. Each
//! flush is a self-contained append followed by an fsync, so a process killed
//! between flushes leaves both stores parseable. A store's header is written
//! only by the first append to a store that does not exist yet (or is empty).
//! A store whose last line was cut off by a kill mid-flush is truncated back to
//! its last complete line before anything new is appended.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::RunConfig;
use crate::error::Result;
use crate::records::{ErrorRecord, ResultRecord};

/// Outcome of one append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Rows appended
    pub rows: usize,
    /// Whether this append wrote the header line
    pub wrote_header: bool,
}

/// An append-only CSV table of `R` rows.
#[derive(Debug)]
pub struct AppendStore<R> {
    path: PathBuf,
    needs_header: bool,
    tail_checked: bool,
    _row: PhantomData<R>,
}

impl<R: Serialize> AppendStore<R> {
    /// Open (lazily) the store at `path`. Nothing is created until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let needs_header = std::fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        Self {
            path,
            needs_header,
            tail_checked: needs_header,
            _row: PhantomData,
        }
    }

    /// Store location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append rows. An empty slice is a no-op and does not create the file.
    pub fn append(&mut self, rows: &[R]) -> Result<FlushReport> {
        if rows.is_empty() {
            return Ok(FlushReport {
                rows: 0,
                wrote_header: false,
            });
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if !self.tail_checked {
            if !ends_with_newline(&self.path)? {
                let complete = complete_len(&self.path)?;
                log::warn!(
                    "{} ends mid-row; dropping {} trailing byte(s)",
                    self.path.display(),
                    file.metadata()?.len() - complete
                );
                file.set_len(complete)?;
                if complete == 0 {
                    self.needs_header = true;
                }
            }
            self.tail_checked = true;
        }

        let wrote_header = self.needs_header;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(wrote_header)
                .from_writer(&mut file);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        file.sync_data()?;
        self.needs_header = false;

        log::debug!(
            "Flushed {} row(s) to {}{}",
            rows.len(),
            self.path.display(),
            if wrote_header { " (with header)" } else { "" }
        );
        Ok(FlushReport {
            rows: rows.len(),
            wrote_header,
        })
    }
}

/// Whether the file's last byte is a newline. An empty file counts as terminated.
pub(crate) fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Length of the file up to and including its last newline.
fn complete_len(path: &Path) -> Result<u64> {
    const CHUNK: u64 = 8 * 1024;
    let mut file = File::open(path)?;
    let mut end = file.metadata()?.len();
    let mut buf = vec![0u8; CHUNK as usize];
    while end > 0 {
        let start = end.saturating_sub(CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

/// A store plus its in-memory buffer and flush threshold.
#[derive(Debug)]
struct Buffered<R: Serialize> {
    store: AppendStore<R>,
    pending: Vec<R>,
    flush_at: usize,
    history: Vec<FlushReport>,
}

impl<R: Serialize> Buffered<R> {
    fn new(path: PathBuf, flush_at: usize) -> Self {
        Self {
            store: AppendStore::new(path),
            pending: Vec::new(),
            flush_at: flush_at.max(1),
            history: Vec::new(),
        }
    }

    fn push(&mut self, row: R) -> Result<Option<FlushReport>> {
        self.pending.push(row);
        if self.pending.len() >= self.flush_at {
            return self.flush().map(Some);
        }
        Ok(None)
    }

    fn flush(&mut self) -> Result<FlushReport> {
        if self.pending.is_empty() {
            return Ok(FlushReport {
                rows: 0,
                wrote_header: false,
            });
        }
        // Rows stay buffered if the append fails
        let report = self.store.append(&self.pending)?;
        self.pending.clear();
        self.history.push(report);
        Ok(report)
    }
}

/// Buffers result and error rows and checkpoints them to their stores.
///
/// The two buffers are independent: a results flush never waits on, or forces,
/// an errors flush. Call [`CheckpointWriter::finish`] at the end of a run; if the
/// writer is dropped with rows still pending (for instance while unwinding), it
/// makes a best-effort final flush.
#[derive(Debug)]
pub struct CheckpointWriter {
    results: Buffered<ResultRecord>,
    errors: Buffered<ErrorRecord>,
}

impl CheckpointWriter {
    /// Create a writer with explicit flush sizes.
    pub fn new(
        results_path: impl Into<PathBuf>,
        errors_path: impl Into<PathBuf>,
        result_flush_at: usize,
        error_flush_at: usize,
    ) -> Self {
        Self {
            results: Buffered::new(results_path.into(), result_flush_at),
            errors: Buffered::new(errors_path.into(), error_flush_at),
        }
    }

    /// Create a writer for the stores of a corpus root.
    pub fn from_config(root: &Path, config: &RunConfig) -> Self {
        Self::new(
            config.results_path(root),
            config.errors_path(root),
            config.batch_flush_size,
            config.effective_error_flush_size(),
        )
    }

    /// Buffer a result, flushing the results store if its buffer is full.
    pub fn push_result(&mut self, record: ResultRecord) -> Result<Option<FlushReport>> {
        self.results.push(record)
    }

    /// Buffer an error, flushing the errors store if its buffer is full.
    pub fn push_error(&mut self, record: ErrorRecord) -> Result<Option<FlushReport>> {
        self.errors.push(record)
    }

    /// Flush whatever is pending in both buffers.
    ///
    /// Both stores are attempted even if the first fails; the first error is returned.
    pub fn finish(&mut self) -> Result<()> {
        let results = self.results.flush();
        let errors = self.errors.flush();
        results?;
        errors?;
        Ok(())
    }

    /// Result rows waiting in memory.
    pub fn pending_results(&self) -> usize {
        self.results.pending.len()
    }

    /// Error rows waiting in memory.
    pub fn pending_errors(&self) -> usize {
        self.errors.pending.len()
    }

    /// Every results flush so far, in order.
    pub fn result_flushes(&self) -> &[FlushReport] {
        &self.results.history
    }

    /// Every errors flush so far, in order.
    pub fn error_flushes(&self) -> &[FlushReport] {
        &self.errors.history
    }

    /// Results store location.
    pub fn results_path(&self) -> &Path {
        self.results.store.path()
    }

    /// Errors store location.
    pub fn errors_path(&self) -> &Path {
        self.errors.store.path()
    }
}

impl Drop for CheckpointWriter {
    fn drop(&mut self) {
        if self.pending_results() == 0 && self.pending_errors() == 0 {
            return;
        }
        if let Err(e) = self.finish() {
            log::error!("Final flush on drop failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn result(id: u64) -> ResultRecord {
        ResultRecord {
            file_id: id,
            file_path: format!("doc{}.pdf", id),
            word_count: id as usize * 10,
        }
    }

    fn error(id: u64) -> ErrorRecord {
        ErrorRecord {
            file_id: id,
            file_path: format!("doc{}.pdf", id),
            error_message: "boom".to_string(),
        }
    }

    #[test]
    fn test_two_intermediate_flushes_then_final() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.csv");
        let mut writer = CheckpointWriter::new(&results, dir.path().join("errors.csv"), 2, 1);

        for id in 0..5 {
            writer.push_result(result(id)).unwrap();
        }
        assert_eq!(writer.pending_results(), 1);
        writer.finish().unwrap();

        let reports = writer.result_flushes().to_vec();
        assert_eq!(reports.iter().map(|r| r.rows).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(
            reports.iter().map(|r| r.wrote_header).collect::<Vec<_>>(),
            vec![true, false, false]
        );

        let body = fs::read_to_string(&results).unwrap();
        assert_eq!(body.matches("file_id,file_name,word_count").count(), 1);
        assert_eq!(body.lines().count(), 6);
    }

    #[test]
    fn test_final_flush_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.csv");
        let mut writer = CheckpointWriter::new(&results, dir.path().join("errors.csv"), 200, 40);

        writer.push_result(result(3)).unwrap();
        assert!(!results.exists());
        writer.finish().unwrap();

        assert_eq!(
            fs::read_to_string(&results).unwrap(),
            "file_id,file_name,word_count\n3,doc3.pdf,30\n"
        );
    }

    #[test]
    fn test_existing_store_gets_no_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.csv");
        fs::write(&results, "file_id,file_name,word_count\n0,doc0.pdf,0\n").unwrap();

        let mut writer = CheckpointWriter::new(&results, dir.path().join("errors.csv"), 10, 10);
        writer.push_result(result(1)).unwrap();
        writer.finish().unwrap();

        assert_eq!(
            fs::read_to_string(&results).unwrap(),
            "file_id,file_name,word_count\n0,doc0.pdf,0\n1,doc1.pdf,10\n"
        );
    }

    #[test]
    fn test_empty_existing_store_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let errors = dir.path().join("errors.csv");
        fs::write(&errors, "").unwrap();

        let mut writer = CheckpointWriter::new(dir.path().join("results.csv"), &errors, 10, 10);
        writer.push_error(error(4)).unwrap();
        writer.finish().unwrap();

        assert_eq!(
            fs::read_to_string(&errors).unwrap(),
            "file_id,file_name,error\n4,doc4.pdf,boom\n"
        );
    }

    #[test]
    fn test_torn_tail_is_dropped_before_append() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.csv");
        fs::write(&results, "file_id,file_name,word_count\n0,doc0.pdf,0\n1,do").unwrap();

        let mut writer = CheckpointWriter::new(&results, dir.path().join("errors.csv"), 1, 1);
        writer.push_result(result(2)).unwrap();

        assert_eq!(
            fs::read_to_string(&results).unwrap(),
            "file_id,file_name,word_count\n0,doc0.pdf,0\n2,doc2.pdf,20\n"
        );
    }

    #[test]
    fn test_row_cut_inside_last_field_is_not_kept() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.csv");
        // "1,doc1.pdf,10" lost its last digit and newline
        fs::write(&results, "file_id,file_name,word_count\n0,doc0.pdf,0\n1,doc1.pdf,1").unwrap();

        let mut writer = CheckpointWriter::new(&results, dir.path().join("errors.csv"), 1, 1);
        writer.push_result(result(1)).unwrap();

        assert_eq!(
            fs::read_to_string(&results).unwrap(),
            "file_id,file_name,word_count\n0,doc0.pdf,0\n1,doc1.pdf,10\n"
        );
    }

    #[test]
    fn test_torn_header_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let errors = dir.path().join("errors.csv");
        fs::write(&errors, "file_id,file_na").unwrap();

        let mut writer = CheckpointWriter::new(dir.path().join("results.csv"), &errors, 1, 1);
        let report = writer.push_error(error(4)).unwrap();

        assert_eq!(report.map(|r| r.wrote_header), Some(true));
        assert_eq!(
            fs::read_to_string(&errors).unwrap(),
            "file_id,file_name,error\n4,doc4.pdf,boom\n"
        );
    }

    #[test]
    fn test_complete_len_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.csv");
        let mut body = "x".repeat(20_000);
        body.push('\n');
        body.push_str(&"y".repeat(9_000));
        fs::write(&path, &body).unwrap();

        assert_eq!(complete_len(&path).unwrap(), 20_001);
    }

    #[test]
    fn test_buffers_flush_independently() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.csv");
        let errors = dir.path().join("errors.csv");
        let mut writer = CheckpointWriter::new(&results, &errors, 3, 1);

        let flushed = writer.push_error(error(0)).unwrap();
        assert_eq!(flushed.map(|r| r.rows), Some(1));
        assert!(errors.exists());
        assert!(!results.exists());

        writer.push_result(result(1)).unwrap();
        writer.push_result(result(2)).unwrap();
        let flushed = writer.push_result(result(3)).unwrap();
        assert_eq!(flushed.map(|r| r.rows), Some(3));
        assert_eq!(writer.error_flushes().len(), 1);
    }

    #[test]
    fn test_finish_without_rows_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CheckpointWriter::new(
            dir.path().join("results.csv"),
            dir.path().join("errors.csv"),
            2,
            2,
        );
        writer.finish().unwrap();
        assert!(!dir.path().join("results.csv").exists());
        assert!(!dir.path().join("errors.csv").exists());
    }

    #[test]
    fn test_drop_flushes_pending_rows() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.csv");
        {
            let mut writer =
                CheckpointWriter::new(&results, dir.path().join("errors.csv"), 100, 100);
            writer.push_result(result(7)).unwrap();
        }
        assert!(fs::read_to_string(&results).unwrap().contains("7,doc7.pdf,70"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let errors = dir.path().join("errors.csv");
        let mut writer = CheckpointWriter::new(dir.path().join("results.csv"), &errors, 1, 1);
        writer
            .push_error(ErrorRecord {
                file_id: 9,
                file_path: "a, b.pdf".into(),
                error_message: "bad xref, offset 12".into(),
            })
            .unwrap();

        let mut reader = csv::Reader::from_path(&errors).unwrap();
        let rows: Vec<ErrorRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0].file_path, "a, b.pdf");
        assert_eq!(rows[0].error_message, "bad xref, offset 12");
    }
}
