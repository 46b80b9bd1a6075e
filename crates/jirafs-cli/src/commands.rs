use std::io::{Read, Write};

use anyhow::{Context, Result};
use jirafs_namespace::{DirEntry, Namespace, Node};

/// One `ls -l` style line per entry; directories carry a trailing slash.
pub(crate) fn render_listing(entries: &[DirEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let suffix = if entry.mode.is_dir() { "/" } else { "" };
            format!(
                "{} {} {} {}{suffix}\n",
                entry.mode, entry.owner, entry.group, entry.name
            )
        })
        .collect()
}

pub(crate) async fn list_node(namespace: &Namespace, node: &Node) -> Result<String> {
    if !node.is_dir() {
        return Ok(render_listing(&[node.entry()]));
    }
    let entries = namespace
        .list(node)
        .await
        .with_context(|| format!("failed to list {}", node.name()))?;
    Ok(render_listing(&entries))
}

pub(crate) async fn run_ls(namespace: &Namespace, path: &str, out: &mut impl Write) -> Result<()> {
    let node = namespace
        .resolve(path)
        .await
        .with_context(|| format!("failed to resolve {path}"))?;
    out.write_all(list_node(namespace, &node).await?.as_bytes())?;
    Ok(())
}

pub(crate) async fn run_cat(namespace: &Namespace, path: &str, out: &mut impl Write) -> Result<()> {
    let node = namespace
        .resolve(path)
        .await
        .with_context(|| format!("failed to resolve {path}"))?;
    let content = namespace
        .read_file(&node)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    out.write_all(&content)?;
    Ok(())
}

pub(crate) async fn run_write(
    namespace: &Namespace,
    path: &str,
    append: bool,
    mut input: impl Read,
) -> Result<()> {
    let mut content = Vec::new();
    input
        .read_to_end(&mut content)
        .context("failed to read new file contents")?;
    let node = namespace
        .resolve(path)
        .await
        .with_context(|| format!("failed to resolve {path}"))?;
    let written = if append {
        namespace.append_file(&node, &content).await
    } else {
        namespace.write_file(&node, &content).await
    };
    written.with_context(|| format!("failed to write {path}"))
}

pub(crate) async fn run_rm(namespace: &Namespace, path: &str) -> Result<()> {
    namespace
        .remove(path)
        .await
        .with_context(|| format!("failed to remove {path}"))
}
