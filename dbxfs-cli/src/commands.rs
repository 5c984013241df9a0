// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use console::style;
use dbxfs_core::{
    CopyOptions, CopySource, DbxError, DbxResult, EntryKind, ErrorPolicy, FileInfo, ListOptions,
    Listing, OpenMode, RemoteClient, RemoteFileSystem,
};
use std::io::Write;
use std::path::Path;
use tabled::{Table, Tabled};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Format file size
fn format_size(size: Option<u64>, human: bool) -> String {
    match size {
        Some(s) if human => bytesize::ByteSize(s).to_string(),
        Some(s) => s.to_string(),
        None => "-".to_string(),
    }
}

/// Format entry kind
fn format_kind(kind: Option<EntryKind>) -> String {
    match kind {
        Some(EntryKind::Directory) => style("d").cyan().to_string(),
        Some(EntryKind::File) => "-".to_string(),
        None => "?".to_string(),
    }
}

/// Turn a batch of swallowed failures into one CLI error.
fn failures(op: &str, failed: &[&String]) -> DbxResult<()> {
    if failed.is_empty() {
        Ok(())
    } else {
        let paths: Vec<&str> = failed.iter().map(|s| s.as_str()).collect();
        Err(DbxError::Other(format!("{} failed for: {}", op, paths.join(", "))))
    }
}

#[derive(Tabled)]
struct LsEntry {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl LsEntry {
    fn from_info(info: &FileInfo, human: bool) -> Self {
        Self {
            kind: format_kind(info.kind),
            size: format_size(info.size, human),
            name: info.name.clone(),
        }
    }
}

/// List folder contents
pub async fn ls<C: RemoteClient>(
    fs: &RemoteFileSystem<C>,
    path: &str,
    long: bool,
    recursive: bool,
    human: bool,
) -> DbxResult<()> {
    tracing::debug!(path, recursive, "listing");

    let options = ListOptions { recursive, detail: long };
    let listing = fs
        .ls(path, &options)
        .await
        .ok_or_else(|| DbxError::NotFound(path.to_string()))?;

    match listing {
        listing if listing.is_empty() => println!("(empty directory)"),
        Listing::Detailed(infos) => {
            let entries: Vec<LsEntry> = infos.iter().map(|i| LsEntry::from_info(i, human)).collect();
            println!("{}", Table::new(entries));
        }
        Listing::Names(names) => {
            for name in &names {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

/// Show information about one path
pub async fn stat<C: RemoteClient>(fs: &RemoteFileSystem<C>, path: &str, json: bool) -> DbxResult<()> {
    let info = fs
        .info(path)
        .await
        .ok_or_else(|| DbxError::NotFound(path.to_string()))?;

    if json {
        let rendered = serde_json::to_string_pretty(&info)
            .map_err(|e| DbxError::Serialization(e.to_string()))?;
        println!("{rendered}");
    } else {
        println!("  Name: {}", info.name);
        println!("  Type: {}", info.kind.map(|k| k.as_str()).unwrap_or("unknown"));
        println!("  Size: {}", format_size(info.size, true));
    }
    Ok(())
}

/// Create folders
pub async fn mkdir<C: RemoteClient>(fs: &RemoteFileSystem<C>, paths: &[String]) -> DbxResult<()> {
    let mut failed = Vec::new();
    for path in paths {
        match fs.mkdir(path).await {
            Some(info) => println!("{} {}", style("created").green(), info.name),
            None => failed.push(path),
        }
    }
    failures("mkdir", &failed)
}

/// Remove files or folders
pub async fn rm<C: RemoteClient>(fs: &RemoteFileSystem<C>, paths: &[String]) -> DbxResult<()> {
    let mut failed = Vec::new();
    for path in paths {
        match fs.rm(path).await {
            Some(info) => println!("{} {}", style("removed").red(), info.name),
            None => failed.push(path),
        }
    }
    failures("rm", &failed)
}

/// Copy with cp semantics
pub async fn cp<C: RemoteClient>(
    fs: &RemoteFileSystem<C>,
    mut sources: Vec<String>,
    dest: &str,
    recursive: bool,
    on_error: Option<ErrorPolicy>,
) -> DbxResult<()> {
    let source = if sources.len() == 1 {
        CopySource::Single(sources.remove(0))
    } else {
        CopySource::Many(sources)
    };
    let options = CopyOptions { recursive, on_error };

    let plan = fs.plan_copy(source, dest, &options).await?;
    for instruction in &plan.instructions {
        tracing::debug!(from = %instruction.source, to = %instruction.destination, "planned");
    }

    let planned = plan.len();
    let copied = fs.execute_copy(&plan).await?;

    if copied == planned {
        println!("{} {} object(s)", style("copied").green(), copied);
    } else {
        println!(
            "{} {} of {} object(s), {} skipped",
            style("copied").yellow(),
            copied,
            planned,
            planned - copied
        );
    }
    Ok(())
}

/// Print a remote file to stdout
pub async fn cat<C: RemoteClient>(fs: &RemoteFileSystem<C>, path: &str) -> DbxResult<()> {
    let mut reader = fs.open_read(path).await?;
    let chunk = fs.config().block_size as u64;
    let mut stdout = std::io::stdout().lock();
    loop {
        let bytes = reader.read(Some(chunk)).await?;
        if bytes.is_empty() {
            break;
        }
        stdout.write_all(&bytes)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Upload a local file
pub async fn put<C: RemoteClient>(
    fs: &RemoteFileSystem<C>,
    local: &Path,
    remote: &str,
    append: bool,
) -> DbxResult<()> {
    let mode = if append { OpenMode::Append } else { OpenMode::Write };
    let mut file = tokio::fs::File::open(local).await?;
    let mut writer = fs.open_write(remote, mode)?;
    let mut buf = vec![0u8; fs.config().block_size];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write(&buf[..n]).await?;
    }

    match writer.close().await? {
        Some(info) => println!("{} {} ({})", style("uploaded").green(), info.name, format_size(info.size, true)),
        None => println!("{} {}", style("uploaded").green(), remote),
    }
    Ok(())
}

/// Download a remote file
pub async fn get<C: RemoteClient>(fs: &RemoteFileSystem<C>, remote: &str, local: &Path) -> DbxResult<()> {
    let mut reader = fs.open_read(remote).await?;
    let chunk = fs.config().block_size as u64;
    let mut file = tokio::fs::File::create(local).await?;

    loop {
        let bytes = reader.read(Some(chunk)).await?;
        if bytes.is_empty() {
            break;
        }
        file.write_all(&bytes).await?;
    }
    file.flush().await?;

    println!(
        "{} {} -> {} ({})",
        style("downloaded").green(),
        remote,
        local.display(),
        format_size(Some(reader.size()), true)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None, true), "-");
        assert_eq!(format_size(Some(20), false), "20");
        assert!(!format_size(Some(4 * 1024 * 1024), true).is_empty());
    }

    #[test]
    fn test_format_kind_unknown() {
        assert_eq!(format_kind(None), "?");
        assert_eq!(format_kind(Some(EntryKind::File)), "-");
    }

    #[test]
    fn test_failures() {
        assert!(failures("rm", &[]).is_ok());
        let a = "/a".to_string();
        let b = "/b".to_string();
        let err = failures("rm", &[&a, &b]).unwrap_err();
        assert_eq!(err.to_string(), "rm failed for: /a, /b");
    }
}
