use std::io::Write;

use owo_colors::OwoColorize;
use pdfstats_core::{AnalysisReport, TextStats, WordCount};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Longest word shown in the frequency table before it is truncated.
const MAX_WORD_WIDTH: usize = 32;

/// Print the full human-readable report for one document.
pub fn print_report(
    w: &mut dyn Write,
    file_name: &str,
    report: &AnalysisReport,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "Analysis of".bold(), file_name.bold().cyan())?;
    } else {
        writeln!(w, "Analysis of {}", file_name)?;
    }
    writeln!(w)?;
    print_stats(w, &report.stats, color)?;
    writeln!(w)?;
    print_frequency_table(w, &report.word_frequency, color)
}

/// Print the five text statistics, one per line.
pub fn print_stats(w: &mut dyn Write, stats: &TextStats, color: ColorMode) -> std::io::Result<()> {
    print_header(w, "STATISTICS", color)?;

    let rows = [
        ("Words", stats.word_count.to_string()),
        ("Characters", stats.char_count.to_string()),
        (
            "Characters (no spaces)",
            stats.char_count_without_spaces.to_string(),
        ),
        ("Sentences", stats.sentence_count.to_string()),
        ("Avg. word length", format!("{:.2}", stats.avg_word_length)),
    ];
    for (label, value) in rows {
        if color.enabled() {
            writeln!(w, "  {:<24}{}", label.dimmed(), value.bold())?;
        } else {
            writeln!(w, "  {:<24}{}", label, value)?;
        }
    }
    Ok(())
}

/// Print the ranked word-frequency table.
pub fn print_frequency_table(
    w: &mut dyn Write,
    words: &[WordCount],
    color: ColorMode,
) -> std::io::Result<()> {
    print_header(w, "TOP WORDS", color)?;

    if words.is_empty() {
        if color.enabled() {
            writeln!(w, "  {}", "(no words found)".dimmed())?;
        } else {
            writeln!(w, "  (no words found)")?;
        }
        return Ok(());
    }

    let width = words
        .iter()
        .map(|wc| wc.word().chars().count().min(MAX_WORD_WIDTH))
        .max()
        .unwrap_or(0)
        .max("Word".len());
    let max_count = words.iter().map(WordCount::count).max().unwrap_or(1);

    writeln!(w, "  {:>3}  {:<width$}  {:>6}", "#", "Word", "Count")?;
    for (rank, wc) in words.iter().enumerate() {
        let word = truncate(wc.word(), MAX_WORD_WIDTH);
        let bar = "#".repeat(bar_len(wc.count(), max_count));
        if color.enabled() {
            writeln!(
                w,
                "  {:>3}  {:<width$}  {:>6}  {}",
                rank + 1,
                word.green(),
                wc.count(),
                bar.cyan()
            )?;
        } else {
            writeln!(
                w,
                "  {:>3}  {:<width$}  {:>6}  {}",
                rank + 1,
                word,
                wc.count(),
                bar
            )?;
        }
    }
    Ok(())
}

fn print_header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(40);
    if color.enabled() {
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.dimmed())?;
    } else {
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// Bar length scaled so the most frequent word gets 20 marks.
fn bar_len(count: usize, max_count: usize) -> usize {
    if max_count == 0 {
        return 0;
    }
    (count * 20).div_ceil(max_count)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}
