//! Small formatting helpers: listing batches and Russian duration rendering.

use std::time::Duration;

/// Batch ceiling for one catalog-listing reply. Keeps each message well
/// under Telegram's 4096-character limit even after HTML escaping.
pub const LISTING_BATCH_LIMIT: usize = 3000;

/// Group listing lines into replies of at most `limit` characters each,
/// preserving order. A line longer than the limit still becomes its own
/// batch rather than being dropped.
#[must_use]
pub fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();

    for line in lines {
        if !current.is_empty() && current.len() + line.len() + 1 > limit {
            batches.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Pick the Russian plural form for `n` (one / few / many)
#[must_use]
pub fn plural_ru(n: u64, forms: [&str; 3]) -> &str {
    let rem100 = n % 100;
    if (5..=20).contains(&rem100) {
        return forms[2];
    }
    match n % 10 {
        1 => forms[0],
        2..=4 => forms[1],
        _ => forms[2],
    }
}

/// Render a duration as "N дней N часов N минут N секунд"
#[must_use]
pub fn format_duration_ru(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = total / 3_600 % 24;
    let minutes = total / 60 % 60;
    let seconds = total % 60;

    format!(
        "{days} {} {hours} {} {minutes} {} {seconds} {}",
        plural_ru(days, ["день", "дня", "дней"]),
        plural_ru(hours, ["час", "часа", "часов"]),
        plural_ru(minutes, ["минута", "минуты", "минут"]),
        plural_ru(seconds, ["секунда", "секунды", "секунд"]),
    )
}

/// Short form used for "last update X ago": minutes and seconds only
#[must_use]
pub fn format_ago_ru(duration: Duration) -> String {
    let total = duration.as_secs();
    let minutes = total / 60;
    let seconds = total % 60;
    format!(
        "{minutes} {} {seconds} {}",
        plural_ru(minutes, ["минута", "минуты", "минут"]),
        plural_ru(seconds, ["секунда", "секунды", "секунд"]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_limit_and_order() {
        let lines: Vec<String> = (1..=100).map(|i| format!("[{i}] product-{i}")).collect();
        let batches = chunk_lines(&lines, 200);

        assert!(batches.iter().all(|b| b.len() <= 200));
        let rejoined: Vec<String> = batches
            .iter()
            .flat_map(|b| b.lines().map(str::to_string))
            .collect();
        assert_eq!(rejoined, lines);
    }

    #[test]
    fn single_oversized_line_is_kept() {
        let lines = vec!["x".repeat(500)];
        let batches = chunk_lines(&lines, 200);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 500);
    }

    #[test]
    fn empty_listing_produces_no_batches() {
        assert!(chunk_lines(&[], 200).is_empty());
    }

    #[test]
    fn russian_plurals() {
        assert_eq!(plural_ru(1, ["день", "дня", "дней"]), "день");
        assert_eq!(plural_ru(2, ["день", "дня", "дней"]), "дня");
        assert_eq!(plural_ru(5, ["день", "дня", "дней"]), "дней");
        assert_eq!(plural_ru(11, ["день", "дня", "дней"]), "дней");
        assert_eq!(plural_ru(21, ["день", "дня", "дней"]), "день");
        assert_eq!(plural_ru(114, ["день", "дня", "дней"]), "дней");
    }

    #[test]
    fn duration_rendering() {
        let d = Duration::from_secs(86_400 + 2 * 3_600 + 3 * 60 + 4);
        assert_eq!(format_duration_ru(d), "1 день 2 часа 3 минуты 4 секунды");
        assert_eq!(format_ago_ru(Duration::from_secs(61)), "1 минута 1 секунда");
    }
}
