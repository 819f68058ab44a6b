pub mod charting;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::effects::{Effect, EffectSink};
use crate::metrics::{FinalMetrics, LiveMetrics};
use crate::session::Verdict;
use crate::time_series::{self, PerformanceSample};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
/// Lines of text kept above the cursor line while typing
const LINES_BEFORE_CURSOR: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    pub metrics: FinalMetrics,
    pub samples: Vec<PerformanceSample>,
}

/// What the terminal shows, rebuilt purely from the controller's effects
#[derive(Debug, Clone)]
pub struct ScreenModel {
    pub target: Vec<char>,
    pub verdicts: Vec<Verdict>,
    pub cursor: usize,
    pub live: LiveMetrics,
    pub velocity: bool,
    pub results: Option<Results>,
    pub duration_secs: u32,
}

impl ScreenModel {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            target: Vec::new(),
            verdicts: Vec::new(),
            cursor: 0,
            live: LiveMetrics {
                wpm: 0,
                accuracy: 100,
                remaining_secs: duration_secs as f64,
            },
            velocity: false,
            results: None,
            duration_secs,
        }
    }

    pub fn is_showing_results(&self) -> bool {
        self.results.is_some()
    }
}

impl EffectSink for ScreenModel {
    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::SessionReset { target_text } => {
                self.target = target_text.chars().collect();
                self.verdicts = vec![Verdict::Untested; self.target.len()];
                self.cursor = 0;
                self.velocity = false;
                self.results = None;
            }
            Effect::CursorMoved(idx) => self.cursor = *idx,
            Effect::CellVerdictChanged { index, verdict } => {
                if let Some(slot) = self.verdicts.get_mut(*index) {
                    *slot = *verdict;
                }
            }
            Effect::LiveMetricsUpdated(live) => self.live = *live,
            Effect::VelocityChanged(active) => self.velocity = *active,
            Effect::SessionFinished { metrics, samples } => {
                self.results = Some(Results {
                    metrics: *metrics,
                    samples: samples.clone(),
                });
            }
        }
    }
}

/// Hard-wrap `len` cells into rows of at most `width` columns. Returns the
/// index range of each row.
pub fn wrap_rows(chars: &[char], width: usize) -> Vec<std::ops::Range<usize>> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (idx, c) in chars.iter().enumerate() {
        let w = c.width().unwrap_or(1).max(1);
        if used + w > width && idx > start {
            rows.push(start..idx);
            start = idx;
            used = 0;
        }
        used += w;
    }
    rows.push(start..chars.len());
    rows
}

/// Rows to draw so the cursor row stays in view
pub fn visible_rows(
    rows: &[std::ops::Range<usize>],
    cursor: usize,
    height: usize,
) -> std::ops::Range<usize> {
    let cursor_row = rows
        .iter()
        .position(|r| r.contains(&cursor))
        .unwrap_or(rows.len().saturating_sub(1));
    let first = cursor_row.saturating_sub(LINES_BEFORE_CURSOR);
    first..(first + height.max(1)).min(rows.len())
}

fn cell_style(verdict: Verdict, is_cursor: bool) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let style = match verdict {
        Verdict::Correct => bold.fg(Color::Green),
        Verdict::Incorrect => bold.fg(Color::Red),
        Verdict::Untested => bold.add_modifier(Modifier::DIM),
    };
    if is_cursor {
        style.add_modifier(Modifier::UNDERLINED)
    } else {
        style
    }
}

fn row_line<'a>(model: &ScreenModel, row: std::ops::Range<usize>) -> Line<'a> {
    let spans = row
        .map(|idx| {
            let verdict = model.verdicts.get(idx).copied().unwrap_or(Verdict::Untested);
            (idx, cell_style(verdict, idx == model.cursor))
        })
        .chunk_by(|(_, style)| *style)
        .into_iter()
        .map(|(style, cells)| {
            let text: String = cells
                .map(|(idx, _)| match (model.target[idx], model.verdicts[idx]) {
                    (' ', Verdict::Incorrect) => '·',
                    (c, _) => c,
                })
                .collect();
            Span::styled(text, style)
        })
        .collect::<Vec<Span>>();
    Line::from(spans)
}

fn render_typing(model: &ScreenModel, area: Rect, buf: &mut Buffer) {
    let dim_bold_style = Style::default()
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::DIM);
    let text_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2) as usize;
    let rows = wrap_rows(&model.target, text_width);
    let text_height = (rows.len() as u16).min(area.height.saturating_sub(4)).max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(text_height + 2) / 2),
            Constraint::Length(2),
            Constraint::Length(text_height),
            Constraint::Min(0),
        ])
        .split(area);

    let mut status = vec![Span::styled(
        format!(
            "{:.1}s   {} wpm   {}% acc",
            model.live.remaining_secs, model.live.wpm, model.live.accuracy
        ),
        dim_bold_style,
    )];
    if model.velocity {
        status.push(Span::styled(
            "   >> velocity",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ));
    }
    Paragraph::new(Line::from(status))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let window = visible_rows(&rows, model.cursor, text_height as usize);
    let lines: Vec<Line> = rows[window]
        .iter()
        .map(|row| row_line(model, row.clone()))
        .collect();
    Paragraph::new(lines).render(chunks[2], buf);
}

fn render_results(model: &ScreenModel, results: &Results, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let metrics = &results.metrics;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(&results.samples, model.duration_secs);
    let wpm_points = time_series::wpm_points(&results.samples);
    let accuracy_points = time_series::accuracy_points(&results.samples);

    let datasets = vec![
        Dataset::default()
            .name("wpm")
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&wpm_points),
        Dataset::default()
            .name("acc %")
            .marker(ratatui::symbols::Marker::Dot)
            .style(Style::default().fg(Color::DarkGray))
            .graph_type(GraphType::Scatter)
            .data(&accuracy_points),
    ];

    let y_max = highest_wpm.max(100.0);
    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(y_max), bold_style),
                ]),
        );
    chart.render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {} raw   {}% acc   {:.2} sd",
            metrics.wpm, metrics.raw_wpm, metrics.accuracy, metrics.consistency
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} chars ({} correct / {} wrong) in {}s",
            metrics.judged, metrics.correct, metrics.incorrect, metrics.elapsed_secs
        ),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (tab) new / (up/down) duration / (esc)ape",
        italic_style,
    ))
    .render(chunks[4], buf);
}

impl Widget for &ScreenModel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.results {
            Some(results) => render_results(self, results, area, buf),
            None => render_typing(self, area, buf),
        }
    }
}
