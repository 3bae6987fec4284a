use crate::Result;
use crate::model::{EntityReport, FetchBatch};
use core::fmt::Write;
use owo_colors::OwoColorize;

pub fn generate<W: Write>(batch: &FetchBatch, use_colors: bool, writer: &mut W) -> Result<()> {
    if batch.is_empty() {
        writeln!(writer, "No repositories found")?;
        return Ok(());
    }

    let title = format!(
        "Top {} repositories as of {}",
        batch.len(),
        batch.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }

    let key_width = batch.reports().iter().map(|r| r.summary.key().len()).max().unwrap_or(0);
    let rank_width = batch.len().to_string().len() + 1;

    for report in batch.reports() {
        writeln!(writer)?;
        write_repository(report, rank_width, key_width, use_colors, writer)?;
        write_authors(report, rank_width, use_colors, writer)?;
    }

    writeln!(writer)?;
    writeln!(writer, "{} commits in the last 24 hours", batch.total_commits())?;
    Ok(())
}

fn write_repository<W: Write>(report: &EntityReport, rank_width: usize, key_width: usize, use_colors: bool, writer: &mut W) -> Result<()> {
    let summary = &report.summary;
    let rank = format!("#{}", summary.rank);
    let key = summary.key();

    if use_colors {
        write!(
            writer,
            "{:>rank_width$}  {:<key_width$}",
            rank.dimmed(),
            key.cyan().bold()
        )?;
    } else {
        write!(writer, "{rank:>rank_width$}  {key:<key_width$}")?;
    }

    writeln!(
        writer,
        "  {} stars  {} watchers  {} forks  {}",
        summary.stars, summary.watchers, summary.forks, summary.language
    )?;
    Ok(())
}

fn write_authors<W: Write>(report: &EntityReport, rank_width: usize, use_colors: bool, writer: &mut W) -> Result<()> {
    let indent = rank_width + 4;

    if report.authors_today.is_empty() {
        let line = "no commits today";
        if use_colors {
            writeln!(writer, "{:indent$}{}", "", line.dimmed())?;
        } else {
            writeln!(writer, "{:indent$}{line}", "")?;
        }
        return Ok(());
    }

    let author_width = report.authors_today.iter().map(|a| a.author.chars().count()).max().unwrap_or(0);
    for author in &report.authors_today {
        if use_colors {
            writeln!(
                writer,
                "{:indent$}{:<author_width$}  {}",
                "",
                author.author,
                author.commits.green()
            )?;
        } else {
            writeln!(writer, "{:indent$}{:<author_width$}  {}", "", author.author, author.commits)?;
        }
    }

    Ok(())
}
