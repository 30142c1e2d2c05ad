use crate::shared::{
    text::{align_right, display_width, escape_html, pad_to_width, thousands},
    types::{DateSelection, LineFormat, Markup, RankedReport, ReportPreset, SortKey, SpikeRecord},
};
use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use rust_decimal::Decimal;
use std::borrow::Cow;
use volspike_data::{market::Market, session::SessionDate};

/// Default chunk limit, the Telegram message limit.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 4096;

/// Display columns of the name column in [`LineFormat::Compact`].
pub const COMPACT_NAME_COLUMNS: usize = 16;

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Report context shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetadata {
    /// eg/ "KOSPI/KOSDAQ 거래량 급증 리스트"
    pub title: String,
    pub recent: SessionDate,
    pub prior: SessionDate,
    pub threshold: Decimal,
    pub sort_key: SortKey,
    pub selection: DateSelection,
    /// Send time in the reference time zone
    pub generated_at: DateTime<FixedOffset>,
}

impl ReportMetadata {
    /// Title listing the scanned markets, eg/ "KOSPI/KOSDAQ 거래량 급증 리스트".
    pub fn default_title(preset: ReportPreset, markets: &[Market]) -> String {
        format!(
            "{} {}",
            markets.iter().map(Market::as_str).join("/"),
            preset.title()
        )
    }
}

/// Renders a [`RankedReport`] into message chunks no longer than `max_chunk_len` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRenderer {
    pub max_chunk_len: usize,
    pub line_format: LineFormat,
    pub markup: Markup,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self {
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            line_format: LineFormat::Verbose,
            markup: Markup::Html,
        }
    }
}

impl ReportRenderer {
    pub fn with_max_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.max_chunk_len = max_chunk_len;
        self
    }

    pub fn with_line_format(mut self, line_format: LineFormat) -> Self {
        self.line_format = line_format;
        self
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    pub fn render(&self, report: &RankedReport, metadata: &ReportMetadata) -> Vec<String> {
        let mut lines = self.header_lines(metadata);
        lines.push(String::new());

        if report.is_empty() {
            lines.push("해당 없음.".to_string());
        } else {
            lines.extend(self.record_lines(report));
        }

        if report.is_truncated() {
            lines.push(format!("... (외 {}종 더 있음)", report.omitted()));
        }

        pack_lines(&lines, self.max_chunk_len)
    }

    fn header_lines(&self, metadata: &ReportMetadata) -> Vec<String> {
        let title = self.escape(&metadata.title);
        let threshold = format!("{}배", metadata.threshold.normalize());

        vec![
            self.bold(&format!("[{title}]")),
            format!(
                "기준: {}(전일) vs {}(전전일)",
                metadata.recent, metadata.prior
            ),
            format!("조건: 전일 거래량 ≥ 전전일의 {}", self.bold(&threshold)),
            format!("정렬: {}", metadata.sort_key.description()),
            format!("전송일: {}", send_time(&metadata.generated_at)),
            metadata.selection.description().to_string(),
        ]
    }

    fn record_lines(&self, report: &RankedReport) -> Vec<String> {
        match self.line_format {
            LineFormat::Verbose => report
                .records
                .iter()
                .enumerate()
                .map(|(index, record)| self.verbose_line(index + 1, record))
                .collect(),
            LineFormat::Compact => {
                let rank_width = report.len().to_string().len();
                let volume_width = report
                    .records
                    .iter()
                    .map(|record| display_width(&thousands(record.recent_volume)))
                    .max()
                    .unwrap_or(0);

                report
                    .records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| {
                        let line = format!(
                            "{:>rank_width$}. {} {}",
                            index + 1,
                            pad_to_width(compact_name(record), COMPACT_NAME_COLUMNS),
                            align_right(&thousands(record.recent_volume), volume_width),
                        );
                        match self.markup {
                            Markup::Html => format!("<code>{}</code>", escape_html(&line)),
                            Markup::Plain => line,
                        }
                    })
                    .collect()
            }
        }
    }

    fn verbose_line(&self, rank: usize, record: &SpikeRecord) -> String {
        let label = if record.name().is_empty() {
            record.ticker().to_string()
        } else {
            format!("{} {}", record.ticker(), self.escape(record.name()))
        };

        format!(
            "{rank}. {label} ({}) {:.2}x  {} vs {}",
            record.market(),
            record.ratio,
            thousands(record.recent_volume),
            thousands(record.prior_volume),
        )
    }

    fn bold(&self, text: &str) -> String {
        match self.markup {
            Markup::Html => format!("<b>{text}</b>"),
            Markup::Plain => text.to_string(),
        }
    }

    fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self.markup {
            Markup::Html => escape_html(text),
            Markup::Plain => Cow::Borrowed(text),
        }
    }
}

fn compact_name(record: &SpikeRecord) -> &str {
    if record.name().is_empty() {
        record.ticker().as_str()
    } else {
        record.name()
    }
}

/// eg/ "2024-05-13 Mon 08:30 KST"
fn send_time(at: &DateTime<FixedOffset>) -> String {
    let zone = if at.offset().local_minus_utc() == KST_OFFSET_SECS {
        "KST".to_string()
    } else {
        at.format("UTC%:z").to_string()
    };
    format!("{} {zone}", at.format("%Y-%m-%d %a %H:%M"))
}

/// Greedily pack `lines` into `\n` joined chunks of at most `max_len` characters.
///
/// A chunk never ends mid-line, except for a single line longer than `max_len`, which is
/// split at character boundaries.
pub fn pack_lines(lines: &[String], max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut started = false;

    for line in lines {
        let line_len = line.chars().count();

        if started && current_len + 1 + line_len <= max_len {
            current.push('\n');
            current.push_str(line);
            current_len += 1 + line_len;
            continue;
        }

        if started {
            chunks.push(std::mem::take(&mut current));
        }

        if line_len <= max_len {
            current = line.clone();
            current_len = line_len;
        } else {
            let characters = line.chars().collect::<Vec<_>>();
            let mut pieces = characters
                .chunks(max_len)
                .map(|piece| piece.iter().collect::<String>())
                .collect::<Vec<_>>();
            current = pieces.pop().unwrap_or_default();
            current_len = current.chars().count();
            chunks.extend(pieces);
        }
        started = true;
    }

    if started {
        chunks.push(current);
    }
    chunks
}
