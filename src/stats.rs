use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use time::macros::format_description as fd;
use time::{Date, Duration};

use crate::config::StatsConfig;
use crate::dates::format_day;
use crate::search::SearchEntry;

pub const HEATMAP_WEEKS: usize = 53;
/// Writing activity counted towards `yearCharTotal`.
pub const YEAR_DAYS: i64 = 365;
/// Share of the busiest day at which a heatmap cell reaches level 2, 3, 4.
pub const LEVEL_THRESHOLDS: [f64; 3] = [0.3, 0.6, 0.8];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsArtifact {
    pub year_char_total: usize,
    pub daily_total: usize,
    pub daily_window: u32,
    pub daily_series: Vec<DailyPoint>,
    pub heatmap_weeks: Vec<Vec<HeatmapDay>>,
    pub heatmap_labels: Vec<String>,
    pub heatmap_start_year: i32,
    pub heatmap_end_year: i32,
    pub top_posts: Vec<TopPost>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyPoint {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HeatmapDay {
    pub date: String,
    pub count: usize,
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopPost {
    pub title: String,
    pub date: String,
    pub char_count: usize,
}

impl StatsArtifact {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("failed to serialize stats")
    }
}

/// Aggregates writing activity up to and including `today`.
///
/// `entries` are search index entries; their `dateKey` is the local day.
pub fn build_stats(entries: &[SearchEntry], today: Date, config: &StatsConfig) -> Result<StatsArtifact> {
    let mut posts_per_day: BTreeMap<Date, usize> = BTreeMap::new();
    let mut chars_per_day: BTreeMap<Date, usize> = BTreeMap::new();
    let mut dated = Vec::with_capacity(entries.len());

    for entry in entries {
        let day = Date::parse(&entry.date_key, fd!("[year]-[month]-[day]"))
            .with_context(|| format!("invalid date key '{}' for '{}'", entry.date_key, entry.title))?;
        *posts_per_day.entry(day).or_default() += 1;
        *chars_per_day.entry(day).or_default() += entry.char_count;
        dated.push((day, entry));
    }

    let year_start = today - Duration::days(YEAR_DAYS - 1);
    let year_char_total = chars_per_day
        .range(year_start..=today)
        .map(|(_, chars)| chars)
        .sum();

    let window = i64::from(config.daily_window.max(1));
    let mut daily_series = Vec::with_capacity(window as usize);
    for offset in (0..window).rev() {
        let day = today - Duration::days(offset);
        daily_series.push(DailyPoint {
            date: format_day(day)?,
            count: posts_per_day.get(&day).copied().unwrap_or(0),
        });
    }
    let daily_total = daily_series.iter().map(|point| point.count).sum();

    let last_sunday = today - Duration::days(i64::from(today.weekday().number_days_from_sunday()));
    let first_sunday = last_sunday - Duration::weeks(HEATMAP_WEEKS as i64 - 1);
    let busiest = (0..HEATMAP_WEEKS as i64 * 7)
        .map(|offset| first_sunday + Duration::days(offset))
        .filter_map(|day| chars_per_day.get(&day).copied())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut heatmap_weeks = Vec::with_capacity(HEATMAP_WEEKS);
    let mut heatmap_labels = Vec::with_capacity(HEATMAP_WEEKS);
    let mut previous_month = None;
    for week in 0..HEATMAP_WEEKS as i64 {
        let sunday = first_sunday + Duration::weeks(week);
        let month = sunday.month();
        heatmap_labels.push(if previous_month == Some(month) {
            String::new()
        } else {
            u8::from(month).to_string()
        });
        previous_month = Some(month);

        let mut days = Vec::with_capacity(7);
        for weekday in 0..7 {
            let day = sunday + Duration::days(weekday);
            let count = chars_per_day.get(&day).copied().unwrap_or(0);
            days.push(HeatmapDay {
                date: format_day(day)?,
                count,
                level: heat_level(count, busiest),
            });
        }
        heatmap_weeks.push(days);
    }

    dated.sort_by(|(left_day, left), (right_day, right)| {
        right
            .char_count
            .cmp(&left.char_count)
            .then_with(|| right_day.cmp(left_day))
    });
    let top_posts = dated
        .into_iter()
        .take(config.top_posts)
        .map(|(_, entry)| TopPost {
            title: entry.title.clone(),
            date: entry.date.clone(),
            char_count: entry.char_count,
        })
        .collect();

    Ok(StatsArtifact {
        year_char_total,
        daily_total,
        daily_window: config.daily_window,
        daily_series,
        heatmap_weeks,
        heatmap_labels,
        heatmap_start_year: first_sunday.year(),
        heatmap_end_year: today.year(),
        top_posts,
    })
}

pub fn heat_level(count: usize, busiest: usize) -> u8 {
    if count == 0 {
        return 0;
    }
    let ratio = count as f64 / busiest.max(1) as f64;
    match LEVEL_THRESHOLDS {
        [_, _, high] if ratio >= high => 4,
        [_, mid, _] if ratio >= mid => 3,
        [low, _, _] if ratio >= low => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn entry(title: &str, date_key: &str, char_count: usize) -> SearchEntry {
        SearchEntry {
            title: title.to_string(),
            description: String::new(),
            date: date_key.replace('-', "/"),
            date_key: date_key.to_string(),
            tags: Vec::new(),
            tags_with_emoji: Vec::new(),
            url: format!("/blog/{title}"),
            og_image: String::new(),
            fallback_image: String::new(),
            word_count: 1,
            char_count,
            reading_minutes: 1,
            search: title.to_lowercase(),
        }
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(heat_level(0, 100), 0);
        assert_eq!(heat_level(1, 100), 1);
        assert_eq!(heat_level(29, 100), 1);
        assert_eq!(heat_level(30, 100), 2);
        assert_eq!(heat_level(60, 100), 3);
        assert_eq!(heat_level(79, 100), 3);
        assert_eq!(heat_level(80, 100), 4);
        assert_eq!(heat_level(100, 100), 4);
    }

    #[test]
    fn empty_input_yields_zero_filled_windows() {
        let stats = build_stats(&[], date!(2024 - 06 - 12), &StatsConfig::default()).unwrap();
        assert_eq!(stats.year_char_total, 0);
        assert_eq!(stats.daily_total, 0);
        assert_eq!(stats.daily_series.len(), 30);
        assert_eq!(stats.daily_series[29].date, "2024-06-12");
        assert_eq!(stats.heatmap_weeks.len(), HEATMAP_WEEKS);
        assert!(stats.heatmap_weeks.iter().all(|week| week.len() == 7));
        assert!(stats.top_posts.is_empty());
    }

    #[test]
    fn heatmap_weeks_start_on_sunday_and_hold_today() {
        // 2024-06-12 is a Wednesday.
        let stats = build_stats(&[], date!(2024 - 06 - 12), &StatsConfig::default()).unwrap();
        let last = stats.heatmap_weeks.last().unwrap();
        assert_eq!(last[0].date, "2024-06-09");
        assert_eq!(last[3].date, "2024-06-12");
        assert_eq!(stats.heatmap_weeks[0][0].date, "2023-06-11");
        assert_eq!(stats.heatmap_start_year, 2023);
        assert_eq!(stats.heatmap_end_year, 2024);
    }

    #[test]
    fn labels_mark_month_changes() {
        let stats = build_stats(&[], date!(2024 - 06 - 12), &StatsConfig::default()).unwrap();
        assert_eq!(stats.heatmap_labels[0], "6");
        assert_eq!(stats.heatmap_labels[1], "");
        // 2023-07-02 is the first Sunday of July.
        assert_eq!(stats.heatmap_labels[3], "7");
        assert_eq!(stats.heatmap_labels.len(), HEATMAP_WEEKS);
    }

    #[test]
    fn aggregates_characters_and_posts() {
        let entries = vec![
            entry("a", "2024-06-12", 100),
            entry("b", "2024-06-12", 20),
            entry("c", "2024-06-01", 50),
            entry("old", "2023-06-14", 7),
            entry("ancient", "2023-06-12", 1000),
        ];
        let config = StatsConfig {
            daily_window: 7,
            ..StatsConfig::default()
        };
        let stats = build_stats(&entries, date!(2024 - 06 - 12), &config).unwrap();
        assert_eq!(stats.year_char_total, 177);
        assert_eq!(stats.daily_window, 7);
        assert_eq!(stats.daily_series.len(), 7);
        assert_eq!(stats.daily_series[6].count, 2);
        assert_eq!(stats.daily_total, 2);

        let today = &stats.heatmap_weeks[52][3];
        assert_eq!(today.count, 120);
        assert_eq!(today.level, 1);
        let ancient = &stats.heatmap_weeks[0][1];
        assert_eq!(ancient.date, "2023-06-12");
        assert_eq!(ancient.level, 4);
    }

    #[test]
    fn top_posts_rank_by_characters_then_recency() {
        let entries = vec![
            entry("short", "2024-06-10", 10),
            entry("older-tie", "2024-01-01", 500),
            entry("newer-tie", "2024-05-01", 500),
            entry("longest", "2023-01-01", 900),
        ];
        let config = StatsConfig {
            top_posts: 3,
            ..StatsConfig::default()
        };
        let stats = build_stats(&entries, date!(2024 - 06 - 12), &config).unwrap();
        let titles: Vec<_> = stats.top_posts.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, vec!["longest", "newer-tie", "older-tie"]);
        assert_eq!(stats.top_posts[0].date, "2023/01/01");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let stats = build_stats(
            &[entry("a", "2024-06-12", 3)],
            date!(2024 - 06 - 12),
            &StatsConfig::default(),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&stats.to_json().unwrap()).unwrap();
        assert_eq!(json["yearCharTotal"], 3);
        assert_eq!(json["dailyWindow"], 30);
        assert_eq!(json["topPosts"][0]["charCount"], 3);
        assert!(json["heatmapWeeks"][52][3]["level"].is_number());
    }
}
