//! Console output formatter for council turns

use colored::Colorize;
use council_application::TurnOutcome;
use council_domain::{
    AggregateRankingEntry, CouncilEvent, FinalResponse, ModelResponse, RankingSubmission,
    Stage2Metadata, image_note,
};

/// Formats council events and results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Render one streamed event, or `None` for events with nothing to show
    pub fn format_event(event: &CouncilEvent) -> Option<String> {
        match event {
            CouncilEvent::Stage1Start => None,
            CouncilEvent::Stage1Complete { data } => Some(Self::stage1(data)),
            CouncilEvent::Stage2Start => None,
            CouncilEvent::Stage2Complete { data, metadata } => Some(Self::stage2(data, metadata)),
            CouncilEvent::Stage3Start => None,
            CouncilEvent::Stage3Complete { data } => Some(Self::stage3(data)),
            CouncilEvent::TitleComplete { data } => {
                Some(format!("{} {}\n", "Title:".cyan().bold(), data.title))
            }
            CouncilEvent::Complete => Some(Self::footer()),
            CouncilEvent::Error { message } => {
                Some(format!("\n{} {}\n", "Error:".red().bold(), message))
            }
        }
    }

    /// Format as JSON (`{stage1, stage2, stage3, metadata}`)
    pub fn format_json(outcome: &TurnOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the chairman's answer only
    pub fn format_final(question: &str, outcome: &TurnOutcome) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n\n", "=== LLM Council Answer ===".cyan().bold()));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), question));

        let consulted: Vec<&str> = outcome.stage1.iter().map(|r| r.model.as_str()).collect();
        output.push_str(&format!(
            "{} {}\n",
            "Models consulted:".dimmed(),
            consulted.join(", ")
        ));
        output.push_str(&format!(
            "{} {}\n\n",
            "Chairman:".dimmed(),
            outcome.stage3.model
        ));

        output.push_str(&outcome.stage3.response);
        output.push('\n');
        output
    }

    /// Banner shown before a streamed turn
    pub fn header(question: &str) -> String {
        let line = "=".repeat(60);
        format!(
            "{}\n{:^60}\n{}\n{} {}\n",
            line.cyan(),
            "LLM Council".bold(),
            line.cyan(),
            "Question:".cyan().bold(),
            question
        )
    }

    fn stage1(responses: &[ModelResponse]) -> String {
        let mut output = Self::section_header("Stage 1: Individual Responses");
        for response in responses {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", response.model).yellow().bold(),
                response.response
            ));
            if let Some(note) = image_note(&response.images) {
                output.push_str(&format!("{}\n", note.dimmed()));
            }
        }
        output
    }

    fn stage2(rankings: &[RankingSubmission], metadata: &Stage2Metadata) -> String {
        let mut output = Self::section_header("Stage 2: Peer Rankings");

        if metadata.web_search_used {
            let note = "Stage 1 answers used web search results.".dimmed();
            output.push_str(&format!("\n{}\n", note));
        }

        if rankings.is_empty() {
            output.push_str(&format!("\n{}\n", "No evaluator returned a ranking.".dimmed()));
        }

        for submission in rankings {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", submission.model).yellow().bold(),
                submission.ranking
            ));

            if submission.is_unparsed() {
                output.push_str(&format!("{}\n", "(no parseable ranking)".dimmed()));
            } else {
                // De-anonymized view of the evaluator's order
                let resolved: Vec<String> = submission
                    .parsed_ranking
                    .iter()
                    .map(|label| match metadata.label_to_model.model_for(label) {
                        Some(model) => format!("{} ({})", label, model),
                        None => label.to_string(),
                    })
                    .collect();
                output.push_str(&format!("{} {}\n", "Parsed:".dimmed(), resolved.join(" > ")));
            }
        }

        if !metadata.aggregate_rankings.is_empty() {
            output.push_str(&format!("\n{}\n", "Aggregate Rankings:".green().bold()));
            output.push_str(&Self::aggregate(&metadata.aggregate_rankings));
        }

        output
    }

    fn aggregate(entries: &[AggregateRankingEntry]) -> String {
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                format!(
                    "  {}. {} (avg {:.2}, {} vote(s))\n",
                    i + 1,
                    entry.model,
                    entry.average_rank,
                    entry.votes_count
                )
            })
            .collect()
    }

    fn stage3(response: &FinalResponse) -> String {
        let mut output = Self::section_header("Stage 3: Final Answer");
        output.push_str(&format!(
            "\n{}\n\n{}\n",
            format!("Chairman: {}", response.model).yellow().bold(),
            response.response
        ));
        if let Some(note) = image_note(&response.images) {
            output.push_str(&format!("{}\n", note.dimmed()));
        }
        output
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
