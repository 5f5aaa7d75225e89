//! src/view/components/loading_overlay.rs
//!
//! Indeterminate loading indicator for the folder body. The listing is fetched
//! as a whole, so there is no progress to report.

use crate::view::{text::LOADING_TEXT, theme};
use ratatui::{
    layout::Flex,
    prelude::*,
    widgets::{Clear, Paragraph},
};

pub struct LoadingOverlay;

impl LoadingOverlay {
    /// * `folder` - name of the folder being listed.
    /// * `rect`   - body rectangle the indicator is centred in.
    pub fn render(frame: &mut Frame<'_>, folder: &str, rect: Rect) {
        frame.render_widget(Clear, rect);

        let text = Text::from(vec![
            Line::from(Span::styled(
                LOADING_TEXT,
                Style::default()
                    .fg(theme::YELLOW)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(folder.to_owned(), theme::muted_style())),
        ]);

        let [middle] = Layout::vertical([Constraint::Length(2)])
            .flex(Flex::Center)
            .areas(rect);

        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), middle);
    }
}
