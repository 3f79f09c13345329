//! Per-group workbook export and zip packaging

use std::io::{Cursor, Write};

use rustc_hash::FxHashSet;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::group::Group;

use super::xlsx::TableWriter;

/// An in-memory file destined for an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBuffer {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Write one workbook per group, named `{stem}_split.xlsx`.
///
/// Stems that collide after sanitizing get a numeric suffix so every
/// group keeps its own entry.
pub fn export_groups(groups: &[Group], config: &EngineConfig) -> Result<Vec<NamedBuffer>> {
    let writer = TableWriter::new(config);
    let mut used: FxHashSet<String> = FxHashSet::default();

    groups
        .iter()
        .map(|group| {
            let stem = group.file_stem(config.group_name_max_chars);
            let mut name = format!("{}_split.xlsx", stem);
            let mut n = 2;
            while used.contains(&name) {
                name = format!("{}_split_{}.xlsx", stem, n);
                n += 1;
            }
            used.insert(name.clone());

            let bytes = writer.write_named(&group.table, &stem)?;
            debug!(file = %name, rows = group.table.row_count(), "exported group");
            Ok(NamedBuffer { name, bytes })
        })
        .collect()
}

/// Pack buffers into a deflated zip archive, in order
pub fn zip_buffers(buffers: &[NamedBuffer]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for buffer in buffers {
        zip.start_file(buffer.name.as_str(), options)?;
        zip.write_all(&buffer.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}
