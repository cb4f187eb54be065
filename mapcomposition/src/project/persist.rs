//! Project document encoding and file I/O.
//!
//! Documents are JSON. Files whose extension is `gz` or `qgz` are written
//! gzip-compressed; reads sniff the gzip magic instead of trusting the
//! extension, so a renamed file still loads. Writes land in a sibling temp
//! file and are renamed into place so a crashed write never leaves a
//! truncated project behind.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::{ProjectDocument, ProjectError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extensions that select compressed output.
const COMPRESSED_EXTENSIONS: &[&str] = &["gz", "qgz"];

pub(super) fn is_compressed_target(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| COMPRESSED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub(super) fn read_document(path: &Path) -> Result<ProjectDocument, ProjectError> {
    let bytes = fs::read(path).map_err(|e| ProjectError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let json = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(&bytes[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).map_err(|e| ProjectError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        out
    } else {
        bytes
    };

    serde_json::from_slice(&json).map_err(|e| ProjectError::Decode {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(super) fn write_document(path: &Path, document: &ProjectDocument) -> Result<(), ProjectError> {
    let json = serde_json::to_vec_pretty(document).map_err(ProjectError::Encode)?;

    let payload = if is_compressed_target(path) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json).map_err(|e| ProjectError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        encoder.finish().map_err(|e| ProjectError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
    } else {
        json
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ProjectError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = Path::new(&temp);

    fs::write(temp_path, payload).map_err(|e| ProjectError::Io {
        path: temp_path.to_path_buf(),
        source: e,
    })?;
    fs::rename(temp_path, path).map_err(|e| ProjectError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
