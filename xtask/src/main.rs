//! Development tasks for linkshelf.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for linkshelf")]
enum Task {
    /// Generate man pages for shelf and each of its subcommands
    GenerateManPages {
        /// Output directory for man pages
        #[arg(short, long, default_value = "man")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    match Task::parse() {
        Task::GenerateManPages { output } => generate_man_pages(&output),
    }
}

fn render(cmd: clap::Command, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create man page: {}", path.display()))?;
    clap_mangen::Man::new(cmd).render(&mut BufWriter::new(file))?;
    println!("✓ Generated: {}", path.display());
    Ok(())
}

fn generate_man_pages(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let cmd = linkshelf::cli::Cli::command();
    render(cmd.clone(), &output_dir.join("shelf.1"))?;

    // One page per subcommand, named like git's: shelf-add.1, shelf-watch.1, ...
    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "completion") {
        let name = format!("shelf-{}", sub.get_name());
        render(sub.clone().name(name.clone()), &output_dir.join(format!("{name}.1")))?;
    }

    println!("\nInstall with: sudo cp {}/*.1 /usr/share/man/man1/", output_dir.display());
    Ok(())
}
