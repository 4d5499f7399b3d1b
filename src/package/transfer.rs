//! Artifact transfer (http, https and file URLs) with progress and abort.

use crate::context::AppContext;
use crate::error::{Result, UnipkgError};
use reqwest::Url;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 64 * 1024;

/// Copy `url` to `dest`, reporting `(downloaded, total)` after every chunk.
///
/// Data lands in `<dest>.part` first and is renamed on completion; the partial
/// file is removed on any failure, including cancellation.
pub(super) fn fetch(
    cx: &AppContext,
    url: &Url,
    dest: &Path,
    mut on_progress: impl FnMut(u64, Option<u64>),
) -> Result<u64> {
    let (mut reader, total) = open(cx, url)?;

    let dir = dest.parent().ok_or_else(|| UnipkgError::Io {
        path: Some(dest.to_path_buf()),
        reason: "download path has no parent directory".to_string(),
    })?;
    fs::create_dir_all(dir).map_err(|e| UnipkgError::io(dir, e))?;

    let part = part_path(dest);
    let result = copy_chunks(cx, reader.as_mut(), &part, total, &mut on_progress)
        .and_then(|written| {
            fs::rename(&part, dest)
                .map(|_| written)
                .map_err(|e| UnipkgError::io(dest, e))
        });

    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn open(cx: &AppContext, url: &Url) -> Result<(Box<dyn Read>, Option<u64>)> {
    match url.scheme() {
        "http" | "https" => {
            let response = cx.http.get(url.clone()).send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(UnipkgError::remote(
                    Some(status.as_u16()),
                    format!("download of {} failed", url),
                ));
            }
            let total = response.content_length();
            Ok((Box::new(response), total))
        }
        "file" => {
            let path = url.to_file_path().map_err(|_| {
                UnipkgError::InvalidArgument(format!("'{}' is not a local file path", url))
            })?;
            let file = File::open(&path).map_err(|e| UnipkgError::io(&path, e))?;
            let total = file.metadata().ok().map(|m| m.len());
            Ok((Box::new(file), total))
        }
        other => Err(UnipkgError::InvalidArgument(format!(
            "unsupported download scheme '{}'",
            other
        ))),
    }
}

fn copy_chunks(
    cx: &AppContext,
    reader: &mut dyn Read,
    part: &Path,
    total: Option<u64>,
    on_progress: &mut impl FnMut(u64, Option<u64>),
) -> Result<u64> {
    let file = File::create(part).map_err(|e| UnipkgError::io(part, e))?;
    let mut writer = BufWriter::new(file);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;

    loop {
        if cx.cancel.is_cancelled() {
            return Err(UnipkgError::Cancelled);
        }

        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(UnipkgError::io(part, e)),
        };

        writer
            .write_all(&buf[..read])
            .map_err(|e| UnipkgError::io(part, e))?;
        downloaded += read as u64;
        on_progress(downloaded, total);
    }

    writer.flush().map_err(|e| UnipkgError::io(part, e))?;
    Ok(downloaded)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
