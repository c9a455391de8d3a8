use std::fmt::Write;

use crate::{
    ai::Interpretation,
    domain::{Classification, HistoryEntry},
    history::HistoryStats,
};

const BAR_WIDTH: usize = 20;

pub fn verdict(interpretation: &Interpretation) -> String {
    let result = interpretation.result();
    let mut out = String::new();

    let banner = match result.classification {
        Classification::Spam => "SPAM DETECTED",
        Classification::NotSpam => "LEGITIMATE EMAIL",
    };
    let _ = writeln!(out, "==== {banner} ====");
    let _ = writeln!(out, "Risk level: {}", result.risk_level.as_str().to_uppercase());
    let _ = writeln!(out, "{}", confidence_bar(result.confidence_score));
    let _ = writeln!(out, "\nReasoning:\n  {}", result.reasoning);
    let _ = writeln!(out, "\nIndicators:");
    if result.spam_indicators.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for indicator in &result.spam_indicators {
        let _ = writeln!(out, "  - {indicator}");
    }
    if let Interpretation::Fallback { reason, .. } = interpretation {
        let _ = writeln!(
            out,
            "\nNote: the model reply could not be parsed ({reason}); this verdict comes from a keyword heuristic."
        );
    }
    out
}

pub fn confidence_bar(score: u8) -> String {
    let score = score.min(100) as usize;
    let filled = (score * BAR_WIDTH + 50) / 100;
    format!(
        "Confidence: [{}{}] {score}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

pub fn statistics(stats: HistoryStats) -> String {
    match (stats.spam_percentage(), stats.legitimate_percentage()) {
        (Some(spam_pct), Some(legit_pct)) => format!(
            "Total emails analyzed: {}\nSpam detected: {} ({spam_pct:.1}%)\nLegitimate emails: {} ({legit_pct:.1}%)\n",
            stats.total,
            stats.spam,
            stats.legitimate()
        ),
        _ => "No emails analyzed yet.\n".to_string(),
    }
}

pub fn title(classification: Classification) -> &'static str {
    match classification {
        Classification::Spam => "Spam",
        Classification::NotSpam => "Not Spam",
    }
}

pub fn history_line(entry: &HistoryEntry) -> String {
    format!(
        "#{} - {} - {} ({}%, {})\n    {}",
        entry.id,
        entry.session_info.classification_time,
        title(entry.result.classification),
        entry.result.confidence_score,
        entry.result.risk_level,
        entry.content_preview.replace('\n', " ")
    )
}

pub fn history_entry(entry: &HistoryEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} - {}", entry.id, entry.session_info.classification_time);
    let _ = writeln!(out, "Classification: {}", entry.result.classification);
    let _ = writeln!(out, "Confidence: {}%", entry.result.confidence_score);
    let _ = writeln!(out, "Risk level: {}", entry.result.risk_level);
    let _ = writeln!(out, "Reasoning: {}", entry.result.reasoning);
    let _ = writeln!(out, "Full email content:\n{}", entry.email_content);
    out
}

pub fn help() -> &'static str {
    "Paste an email and finish it with a line containing only '.'.\n\
     Commands:\n  \
     :stats        classification statistics\n  \
     :history      five most recent classifications\n  \
     :show <id>    full details of one entry\n  \
     :export       write the history to a JSON file\n  \
     :clear        delete the whole history (asks first)\n  \
     :status       configuration and history file status\n  \
     :quit         exit\n"
}
