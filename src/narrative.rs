//! Recap text for the "Auto Summary" sheet.
use crate::types::Ranking;
use crate::util::format_number;

pub struct NarrativeInput<'a> {
    /// Agency or territory the recap is addressed to.
    pub subject: &'a str,
    pub current_total: f64,
    pub prior_total: f64,
    pub top_growth: &'a Ranking,
    pub top_decline: &'a Ranking,
    pub closing_line: &'a str,
}

/// Build the recap lines in template order.
///
/// The period delta only counts as "down" when strictly negative; a flat
/// period reads as "up $0".
pub fn narrative_lines(input: &NarrativeInput) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Hope everyone’s doing well! Here's your {} recap:",
        input.subject
    ));
    lines.push(String::new());

    // TODO: confirm with sales ops whether a flat period should read as "up".
    let delta = input.current_total - input.prior_total;
    let amount = format_number(delta.abs(), 0);
    if delta < 0.0 {
        lines.push(format!(
            "We ended the period down ${} vs last year. Still some wins to celebrate.",
            amount
        ));
    } else {
        lines.push(format!(
            "We ended the period up ${} over last year — great momentum!",
            amount
        ));
    }
    lines.push(String::new());

    lines.push(String::new());
    lines.push("Top dealers:".to_string());
    for entry in input.top_growth {
        lines.push(format!("- {}: +${}", entry.key, format_number(entry.value, 0)));
    }

    lines.push(String::new());
    lines.push("Dealers who pulled back:".to_string());
    for entry in input.top_decline {
        lines.push(format!(
            "- {}: -${}",
            entry.key,
            format_number(entry.value.abs(), 0)
        ));
    }

    lines.push(String::new());
    lines.push(input.closing_line.to_string());
    lines
}

pub fn generate_narrative(input: &NarrativeInput) -> String {
    narrative_lines(input).join("\n")
}
