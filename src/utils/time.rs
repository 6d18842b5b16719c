/// Countdown rendering for the delivery timer, minutes:seconds.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
