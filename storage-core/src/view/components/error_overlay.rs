//! src/view/components/error_overlay.rs
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::view::theme;

pub struct ErrorOverlay {
    message: String,
}

impl ErrorOverlay {
    pub fn new(message: String) -> Self {
        Self { message }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_style(theme::error_style());

        let text = Paragraph::new(vec![
            Line::from(self.message.as_str()),
            Line::from(""),
            Line::from(Span::styled(
                "r: retry | backspace/h: back",
                theme::muted_style(),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

        frame.render_widget(Clear, area);
        frame.render_widget(text, area);
    }
}
