//! src/view/ui.rs
//! ============================================================
//! Frame renderer that draws the whole TUI from the navigation
//! state. Painting never mutates state; the event loop owns it.

use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use tracing::{instrument, warn};

use crate::{
    model::nav_state::{NavigationState, Phase},
    view::{
        components::{
            entry_table::EntryTable, error_overlay::ErrorOverlay, loading_overlay::LoadingOverlay,
            status_bar::StatusBar,
        },
        text, theme,
    },
};

pub struct UIRenderer {
    stats: RenderStats,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RenderStats {
    pub frames: u64,
    pub slow: u64,
    pub total: Duration,
}

impl RenderStats {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / self.frames as f64
        }
    }
}

impl UIRenderer {
    pub fn new() -> Self {
        Self {
            stats: RenderStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> RenderStats {
        self.stats
    }

    #[instrument(level = "trace", skip_all)]
    pub fn render(&mut self, f: &mut Frame<'_>, state: &NavigationState, backend: &str) {
        let start = Instant::now();

        // banner / body / status; the body block plus table header leave
        // exactly `text::list_rows(height)` entry rows
        let [banner, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(f.area());

        f.render_widget(Block::default().style(theme::base_style()), f.area());

        Self::draw_banner(f, state, banner);
        Self::draw_body(f, state, body);
        StatusBar::render(f, state, backend, status);

        let dur = start.elapsed();
        self.stats.total += dur;
        self.stats.frames += 1;
        if dur.as_millis() > 16 {
            self.stats.slow += 1;
            warn!("Slow render: {}ms (target: <16ms)", dur.as_millis());
        }
    }

    fn draw_banner(f: &mut Frame<'_>, state: &NavigationState, area: Rect) {
        if let Some(banner) = text::session_banner(state) {
            f.render_widget(
                Paragraph::new(format!(" {banner}")).style(theme::banner_style()),
                area,
            );
        }
    }

    fn draw_body(f: &mut Frame<'_>, state: &NavigationState, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", text::breadcrumb_title(state.path())))
            .title_style(theme::title_style())
            .border_style(theme::border_style())
            .style(theme::base_style());

        let inner = block.inner(area);
        f.render_widget(block, area);

        match state.phase() {
            Phase::Loading => {
                LoadingOverlay::render(f, &state.current_folder().name, inner);
            }

            Phase::Errored(error) => {
                ErrorOverlay::new(error.to_string()).render(f, inner);
            }

            Phase::Ready if state.entries().is_empty() => {
                f.render_widget(
                    Paragraph::new(text::EMPTY_FOLDER_TEXT)
                        .style(theme::muted_style())
                        .alignment(Alignment::Center),
                    inner,
                );
            }

            Phase::Ready => EntryTable::render(f, state, inner),
        }
    }
}

impl Default for UIRenderer {
    fn default() -> Self {
        Self::new()
    }
}
