//! Terminal presentation: progress, video details, summaries and the URL prompt.

use crate::document::Document;
use crate::pipeline::Stage;
use crate::summary::SummaryResult;
use crate::youtube::VideoDetails;
use colored::*;
use dialoguer::Input;
use std::fmt::Display;

/// Steps shown while a URL is processed
const TOTAL_STEPS: usize = 3;

/// Print a progress line for a pipeline stage
pub fn print_stage(stage: Stage) {
    match stage {
        Stage::Acquiring => print_step(1, "🔍 Analyzing content..."),
        Stage::Summarizing { documents } => print_step(
            2,
            &format!(
                "📝 Generating summary from {} document{}...",
                documents,
                if documents == 1 { "" } else { "s" }
            ),
        ),
        Stage::Done => print_step(3, "✅ Done"),
    }
}

fn print_step(step: usize, msg: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, TOTAL_STEPS).cyan().bold(), msg);
}

pub fn print_error(err: &dyn Display) {
    eprintln!("{} {}", "⚠️".red().bold(), err.to_string().red());
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg.yellow());
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg.green());
}

/// Print title, channel, duration and thumbnail of a video
pub fn print_video_details(details: &VideoDetails) {
    println!("{} {}", "Title:".bold(), details.title);
    println!("{} {}", "Channel:".bold(), details.channel);
    if let Some(secs) = details.duration_secs {
        println!("{} {}", "Duration:".bold(), format_duration(secs));
    }
    if let Some(thumbnail) = &details.thumbnail_url {
        println!("{} {}", "Thumbnail:".bold(), thumbnail.dimmed());
    }
    println!();
}

/// Print the final summary
pub fn print_summary(result: &SummaryResult) {
    println!("{}\n", "📋 Summary".bold());
    println!("{}", result.text);
    println!(
        "\n{}",
        format!(
            "--- {} map / {} combine calls, {} ---",
            result.map_calls,
            result.combine_calls,
            result.created_at.format("%Y-%m-%d %H:%M")
        )
        .dimmed()
    );
}

/// Print extracted documents without summarizing
pub fn print_documents(documents: &[Document]) {
    for (index, doc) in documents.iter().enumerate() {
        let heading = doc
            .meta("section")
            .or_else(|| doc.meta("title"))
            .unwrap_or("Document");
        println!("\n=== [{}] {} ===\n", index + 1, heading);
        println!("{}", doc.text);
    }
    let chars: usize = documents.iter().map(|d| d.text.len()).sum();
    println!(
        "\n--- Extracted {} document(s), {} characters ---",
        documents.len(),
        chars
    );
}

/// Ask for a URL; `None` on an empty answer
pub fn prompt_url() -> dialoguer::Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt("Enter URL (YouTube or website, empty to quit)")
        .allow_empty(true)
        .interact_text()?;
    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}

/// `h:mm:ss` or `m:ss`
pub fn format_duration(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(212), "3:32");
        assert_eq!(format_duration(3725), "1:02:05");
    }
}
