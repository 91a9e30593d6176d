//! # Shell Completion Module
//!
//! Completion scripts for the `encore` CLI, plus the song-id listing used by
//! the hidden `complete-songs` command.
//!
//! ```bash
//! encore completion bash > ~/.local/share/bash-completion/completions/encore
//! encore completion zsh > ~/.config/zsh/completions/_encore
//! ```

use crate::catalog::Catalog;
use crate::cli::Shell;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Write completions for `cmd` to `out`.
pub fn write_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Generate shell completions for the given shell on stdout
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    write_completions(gen, cmd, &mut io::stdout());
}

#[must_use]
pub const fn shell_to_completion_shell(shell: &Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// One `id<TAB>title` line per song, in catalog order.
pub fn song_completions(catalog: &dyn Catalog) -> Result<Vec<String>> {
    Ok(catalog
        .list_all_songs()?
        .into_iter()
        .map(|song| format!("{}\t{}", song.id, song.title))
        .collect())
}

/// Print song completions; errors are swallowed so a broken database never
/// breaks the user's shell.
pub fn print_song_completions(catalog: &dyn Catalog) {
    if let Ok(lines) = song_completions(catalog) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for line in lines {
            if writeln!(handle, "{line}").is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, Song};
    use crate::cli::Args;
    use clap::CommandFactory;

    #[test]
    fn test_bash_completion_mentions_commands() {
        let mut cmd = Args::command();
        let mut out = Vec::new();
        write_completions(shell_to_completion_shell(&Shell::Bash), &mut cmd, &mut out);
        let script = String::from_utf8(out).expect("utf-8 script");
        assert!(script.contains("_encore"));
        assert!(script.contains("recommend"));
    }

    #[test]
    fn test_song_completions() -> Result<()> {
        let mut catalog = MemoryCatalog::new();
        catalog.add_song(Song {
            id: "s1".to_string(),
            title: "Intro".to_string(),
            ..Default::default()
        });
        assert_eq!(song_completions(&catalog)?, vec!["s1\tIntro".to_string()]);
        Ok(())
    }
}
