use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use jirafs_namespace::{Namespace, Node};
use rustyline::{error::ReadlineError, history::DefaultHistory, Config as ReadlineConfig, Editor};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::list_node;

const SHELL_USAGE: &str = "\
cd [PATH]          change directory (.. goes up, / is the root)
ls [PATH]          list a directory
cat PATH           print a file
write PATH TEXT... replace a file with TEXT and commit it
rm PATH            remove a saved search or comment
pwd                print the working directory
exit               leave the shell
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShellControl {
    Continue,
    Exit,
}

/// Shell state. The working directory is held as live nodes, so a draft
/// issue entered with `cd` stays the same draft across commands.
pub(crate) struct Shell {
    namespace: Namespace,
    cwd: Vec<Node>,
}

impl Shell {
    pub(crate) fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            cwd: Vec::new(),
        }
    }

    pub(crate) fn pwd(&self) -> String {
        let names: Vec<&str> = self.cwd.iter().map(Node::name).collect();
        format!("/{}", names.join("/"))
    }

    fn prompt(&self) -> String {
        format!("jirafs:{}> ", self.pwd())
    }

    async fn resolve_stack(&self, path: &str) -> Result<Vec<Node>> {
        let mut stack = if path.starts_with('/') {
            Vec::new()
        } else {
            self.cwd.clone()
        };
        for element in path.split('/').filter(|element| !element.is_empty() && *element != ".") {
            if element == ".." {
                stack.pop();
                continue;
            }
            let parent = stack.last().unwrap_or(self.namespace.root()).clone();
            let node = self
                .namespace
                .walk(&parent, element)
                .await
                .with_context(|| format!("cannot resolve {path}"))?;
            stack.push(node);
        }
        Ok(stack)
    }

    async fn resolve(&self, path: &str) -> Result<Node> {
        let stack = self.resolve_stack(path).await?;
        Ok(stack
            .last()
            .cloned()
            .unwrap_or_else(|| self.namespace.root().clone()))
    }

    pub(crate) async fn dispatch(
        &mut self,
        line: &str,
        out: &mut impl Write,
    ) -> Result<ShellControl> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(ShellControl::Continue);
        };
        let args: Vec<&str> = words.collect();
        match (command, args.as_slice()) {
            ("exit" | "quit", []) => return Ok(ShellControl::Exit),
            ("pwd", []) => writeln!(out, "{}", self.pwd())?,
            ("help", []) => out.write_all(SHELL_USAGE.as_bytes())?,
            ("cd", []) => self.cwd.clear(),
            ("cd", [path]) => {
                let stack = self.resolve_stack(path).await?;
                if let Some(target) = stack.last() {
                    target.as_dir()?;
                }
                self.cwd = stack;
            }
            ("ls", []) => {
                let node = self.resolve(".").await?;
                out.write_all(list_node(&self.namespace, &node).await?.as_bytes())?;
            }
            ("ls", [path]) => {
                let node = self.resolve(path).await?;
                out.write_all(list_node(&self.namespace, &node).await?.as_bytes())?;
            }
            ("cat", [path]) => {
                let node = self.resolve(path).await?;
                let content = self
                    .namespace
                    .read_file(&node)
                    .await
                    .with_context(|| format!("failed to read {path}"))?;
                out.write_all(&content)?;
            }
            ("write", [path, text @ ..]) if !text.is_empty() => {
                let node = self.resolve(path).await?;
                let content = format!("{}\n", text.join(" "));
                self.namespace
                    .write_file(&node, content.as_bytes())
                    .await
                    .with_context(|| format!("failed to write {path}"))?;
            }
            ("rm", [path]) => {
                let (parent, name) = match path.rsplit_once('/') {
                    Some(("", name)) => ("/", name),
                    Some((parent, name)) => (parent, name),
                    None => (".", *path),
                };
                let parent = self.resolve(parent).await?;
                self.namespace
                    .remove_from(&parent, name)
                    .await
                    .with_context(|| format!("failed to remove {path}"))?;
            }
            _ => bail!("unrecognized command: {line} (try help)"),
        }
        Ok(ShellControl::Continue)
    }
}

pub(crate) async fn run_shell(namespace: Namespace, history: Option<&Path>) -> Result<()> {
    let mut shell = Shell::new(namespace);
    if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        run_shell_tty(&mut shell, &resolve_history_path(history)).await
    } else {
        run_shell_stdin(&mut shell).await
    }
}

async fn run_shell_stdin(shell: &mut Shell) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = std::io::stdout();
    while let Some(line) = lines.next_line().await? {
        match shell.dispatch(&line, &mut stdout).await {
            Ok(ShellControl::Continue) => stdout.flush().context("failed to flush stdout")?,
            Ok(ShellControl::Exit) => break,
            Err(error) => report_shell_error(&error),
        }
    }
    Ok(())
}

async fn run_shell_tty(shell: &mut Shell, history_path: &Path) -> Result<()> {
    let config = ReadlineConfig::builder().build();
    let mut editor = Editor::<(), DefaultHistory>::with_config(config)
        .context("failed to initialize interactive editor")?;
    load_history(&mut editor, history_path);
    let mut stdout = std::io::stdout();

    loop {
        let prompt = shell.prompt();
        let readline = tokio::task::block_in_place(|| editor.readline(&prompt));
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(anyhow!("failed to read shell input: {error}")),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        match shell.dispatch(&line, &mut stdout).await {
            Ok(ShellControl::Continue) => stdout.flush().context("failed to flush stdout")?,
            Ok(ShellControl::Exit) => break,
            Err(error) => report_shell_error(&error),
        }
    }

    save_history(&mut editor, history_path);
    Ok(())
}

fn resolve_history_path(history: Option<&Path>) -> PathBuf {
    history.map_or_else(
        || PathBuf::from(".jirafs/shell_history.txt"),
        Path::to_path_buf,
    )
}

fn load_history(editor: &mut Editor<(), DefaultHistory>, path: &Path) {
    if let Err(error) = editor.load_history(path) {
        if !matches!(
            error,
            ReadlineError::Io(ref io_error) if io_error.kind() == std::io::ErrorKind::NotFound
        ) {
            eprintln!(
                "warning: failed to load shell history from {}: {error}",
                path.display()
            );
        }
    }
}

fn save_history(editor: &mut Editor<(), DefaultHistory>, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                eprintln!(
                    "warning: failed to create shell history directory {}: {error}",
                    parent.display()
                );
                return;
            }
        }
    }
    if let Err(error) = editor.save_history(path) {
        eprintln!(
            "warning: failed to persist shell history to {}: {error}",
            path.display()
        );
    }
}

fn report_shell_error(error: &anyhow::Error) {
    eprintln!("error: {error:#}");
}
