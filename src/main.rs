#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use vastrow::cli::{CliArgs, RowSelection, RunConfig, SourceChoice};
use vastrow::config::VastrowConfig;
use vastrow::scroll::{RowId, TableViewport};
use vastrow::source::{describe_rows, DataSource, FileTableSource, UuidSpaceSource, Windowed};

/// Upper bound for the index scan of one file
const INDEX_TIMEOUT: Duration = Duration::from_secs(600);

/// Upper bound for one window load
const ROW_TIMEOUT: Duration = Duration::from_secs(30);

/// Bytes read to sniff the delimiter
const SNIFF_BYTES: u64 = 64 * 1024;

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    vastrow::tracing::init();

    let args = CliArgs::parse();
    let run = args.into_config().map_err(|e| anyhow!(e))?;
    let config = VastrowConfig::load();

    let mut source = open_source(&run, &config)?;
    tracing::info!("Opened source with {}", describe_rows(&*source));

    let rows = select_rows(&run.selection, &config, source.row_count_big());
    print_rows(&mut *source, rows, io::stdout().lock())
}

fn open_source(run: &RunConfig, config: &VastrowConfig) -> Result<Box<dyn DataSource>> {
    match &run.source {
        SourceChoice::UuidSpace => Ok(Box::new(UuidSpaceSource::new())),
        SourceChoice::File {
            path,
            delimiter,
            encoding,
        } => {
            let mut options = config.to_file_table_options();
            options.delimiter = delimiter.resolve(path, || sniff(path, *encoding));
            options.encoding = *encoding;
            if let Some(execution) = run.execution {
                options.execution = execution;
            }

            let mut source = FileTableSource::open(path.clone(), options);
            let ready = source
                .wait_ready(INDEX_TIMEOUT)
                .with_context(|| format!("Failed to index {}", path.display()))?;
            if !ready {
                bail!("Timed out indexing {}", path.display());
            }
            Ok(Box::new(source))
        }
    }
}

/// Leading text of the file for delimiter detection; empty when unreadable
fn sniff(path: &Path, encoding: vastrow::loader::Encoding) -> String {
    let mut bytes = Vec::new();
    match File::open(path) {
        Ok(file) => {
            if let Err(e) = file.take(SNIFF_BYTES).read_to_end(&mut bytes) {
                tracing::warn!("Failed to sniff {}: {}", path.display(), e);
            }
        }
        Err(e) => tracing::warn!("Failed to sniff {}: {}", path.display(), e),
    }
    encoding.decode(&bytes)
}

/// Half-open row range for the selection, clipped to the table
fn select_rows(selection: &RowSelection, config: &VastrowConfig, total: RowId) -> (RowId, RowId) {
    match *selection {
        RowSelection::Range { start, count } => {
            let start = start.min(total);
            (start, start.saturating_add(RowId::from(count)).min(total))
        }
        RowSelection::Scroll {
            px,
            viewport,
            count,
        } => {
            let mut geometry = config.geometry();
            if let Some(height) = viewport {
                geometry.viewport_height = height;
            }
            let mut table = TableViewport::new(geometry, total, config.overscan);
            table.scroll_to(px);
            let range = table.visible_range();
            tracing::debug!(
                "Scroll {}px maps to row {} (+{}px)",
                px,
                range.first,
                range.offset_within
            );
            let end = match count {
                Some(count) => range.first.saturating_add(RowId::from(count)).min(total),
                None => range.end().min(total),
            };
            (range.first, end)
        }
    }
}

fn print_rows(
    source: &mut dyn DataSource,
    (start, end): (RowId, RowId),
    out: impl Write,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(source.columns().iter().map(|c| c.label.as_str()))?;

    if let (Ok(first), Ok(last)) = (u64::try_from(start), u64::try_from(end)) {
        if let Some(windowed) = source.windowed() {
            windowed.prefetch(first, last);
        }
    }

    let mut row = start;
    while row < end {
        let cells = fetch_row(source, row)?;
        writer.write_record(&cells)?;
        row += 1;
    }

    writer.flush()?;
    Ok(())
}

fn fetch_row(source: &mut dyn DataSource, row: RowId) -> Result<Vec<String>> {
    if let Ok(index) = u64::try_from(row) {
        if let Some(windowed) = source.windowed() {
            return windowed
                .row_blocking(index, ROW_TIMEOUT)
                .ok_or_else(|| anyhow!("Row {} failed to load", index));
        }
    }
    Ok(source.row_big(row))
}
