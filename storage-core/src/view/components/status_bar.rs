//! src/view/components/status_bar.rs
//!
//! Item count and key hints on the left, backend name on the right.

use crate::{
    model::nav_state::NavigationState,
    view::{text, theme},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Widget},
};

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame<'_>, state: &NavigationState, backend: &str, area: Rect) {
        let right_text = format!("{backend} ");

        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(right_text.len() as u16),
            ])
            .split(area);

        Paragraph::new(format!(" {}", text::status_line(state)))
            .style(theme::base_style())
            .alignment(Alignment::Left)
            .render(layout[0], frame.buffer_mut());

        Paragraph::new(right_text)
            .style(theme::muted_style().bg(theme::BACKGROUND))
            .alignment(Alignment::Right)
            .render(layout[1], frame.buffer_mut());
    }
}
