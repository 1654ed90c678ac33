//! Exposure record builder.
//!
//! Turns one listed file plus its (optional) tag map into an [`Exposure`].
//! Nothing here can fail the roll: bad names, missing metadata and bad tag
//! values are recorded on the exposure and reported through the roll log.

use std::collections::BTreeMap;
use std::path::Path;

use super::filename::{parse_name, ParsedName};
use super::tags::{keys, ExposureTags};
use super::{Exposure, ExposureId, FilmAttributes, Geometry};
use crate::core::metadata::TagMap;
use crate::core::scanner::ScannedFile;
use crate::events::{DiagnosticKind, RollLog, Subject};

/// Roll-level settings that affect how records are built
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    /// Scene tag rewrites applied before stock lookup
    pub stock_aliases: &'a BTreeMap<String, String>,
    /// Replaces the extension of the expected RAW file name
    pub raw_extension: Option<&'a str>,
}

/// Build one exposure record
pub fn build_exposure(
    id: ExposureId,
    file: &ScannedFile,
    tags: Option<&TagMap>,
    ctx: &RecordContext<'_>,
    log: &mut RollLog,
) -> Exposure {
    let stem = Path::new(&file.file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.file_name.clone());
    let name = parse_name(&stem);

    if let ParsedName::FormatError { reason, .. } = &name {
        log.warn(
            DiagnosticKind::FormatError,
            Subject::exposure(&file.file_name, None),
            format!("unrecognized filename: {}", reason),
        );
    }
    let index = name.index();

    let (parsed, tag_errors) = match tags {
        Some(map) if !map.is_empty() => {
            let (mut parsed, errors) = ExposureTags::from_tag_map(map);
            if let Some(alias) = parsed.scene.as_ref().and_then(|s| ctx.stock_aliases.get(s)) {
                parsed.scene = Some(alias.clone());
            }
            (Some(parsed), errors)
        }
        _ => {
            log.warn(
                DiagnosticKind::MissingMetadata,
                Subject::exposure(&file.file_name, index),
                "no metadata returned; exposure will not be grouped",
            );
            (None, Vec::new())
        }
    };

    for error in &tag_errors {
        let message = format!("{} = '{}': {}", error.tag, error.value, error.reason);
        let subject = Subject::exposure(&file.file_name, index);
        if error.tag == keys::SHUTTER_SPEED {
            log.error(DiagnosticKind::TagConversion, subject, message);
        } else {
            log.warn(DiagnosticKind::TagConversion, subject, message);
        }
    }

    let geometry = parsed
        .as_ref()
        .and_then(|t| Geometry::from_dimensions(t.width?, t.height?));

    let expected_raw = parsed
        .as_ref()
        .and_then(|t| t.preserved_file_name.as_deref())
        .map(|raw| match ctx.raw_extension {
            Some(ext) => with_extension(raw, ext),
            None => raw.to_string(),
        });

    Exposure {
        id,
        path: file.path.clone(),
        file_name: file.file_name.clone(),
        file_size: file.size,
        name,
        tags: parsed,
        tag_errors,
        geometry,
        expected_raw,
        raw_path: None,
        is_master: false,
        original: None,
        copies: Vec::new(),
        index: None,
        film: FilmAttributes::default(),
    }
}

fn with_extension(file_name: &str, extension: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    format!("{}.{}", stem, extension.trim_start_matches('.'))
}
