/// Renders a minute total in the page's `"Xh Ym"` shape. Both components
/// always appear, so `0` reads as `"0h 0m"`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Reads a duration text back into a minute total. The scan accepts the
/// canonical `"Xh Ym"` shape plus squeezed variants like `"2h15m"`: each
/// digit run is attributed to the unit marker that follows it. Anything
/// unreadable contributes zero, so malformed text degrades to `0` instead
/// of an error.
pub fn parse_duration_text(text: &str) -> u32 {
    let mut total: u32 = 0;
    let mut run: Option<u32> = None;
    for ch in text.chars() {
        if let Some(digit) = ch.to_digit(10) {
            let current = run.unwrap_or(0);
            run = Some(current.saturating_mul(10).saturating_add(digit));
            continue;
        }
        match ch {
            'h' | 'H' => {
                total = total.saturating_add(run.take().unwrap_or(0).saturating_mul(60));
            }
            'm' | 'M' => {
                total = total.saturating_add(run.take().unwrap_or(0));
            }
            _ => {
                // A digit run without a unit marker never counts.
                if !ch.is_whitespace() {
                    run = None;
                }
            }
        }
    }
    total
}

/// Numeric value of a digits-only field; empty or unparsable reads as zero.
pub fn parse_numeric_field(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}
