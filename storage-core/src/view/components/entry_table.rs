//! src/view/components/entry_table.rs

use crate::{
    model::{entry::Entry, nav_state::NavigationState},
    util::humanize::human_readable_size,
    view::{icons, text, theme},
};
use ratatui::{
    prelude::*,
    widgets::{Cell, HighlightSpacing, Row, Table, TableState},
};

pub struct EntryTable;

impl EntryTable {
    /// Paint the visible window of entries into `area` (no border; the caller
    /// owns the surrounding block).
    pub fn render(frame: &mut Frame<'_>, state: &NavigationState, area: Rect) {
        let entries: &[Entry] = state.entries();

        let header = Row::new(vec!["Name", "Size"]).style(theme::header_style());

        // one row goes to the header
        let rows_available = usize::from(area.height.saturating_sub(1));
        let window = text::visible_window(entries.len(), state.cursor(), rows_available);
        let offset = window.start;

        let rows: Vec<Row> = entries[window]
            .iter()
            .map(|entry| {
                let style = if entry.is_folder() {
                    theme::folder_style()
                } else {
                    theme::file_style()
                };

                Row::new(vec![
                    Cell::from(format!(
                        "{}{}",
                        icons::icon_for(entry.is_folder()),
                        entry.name()
                    )),
                    Cell::from(human_readable_size(entry.size())),
                ])
                .style(style)
            })
            .collect();

        let widths = [Constraint::Fill(1), Constraint::Length(10)];

        let mut table_state = TableState::default().with_selected(Some(state.cursor().saturating_sub(offset)));

        let table = Table::new(rows, widths)
            .header(header)
            .style(theme::base_style())
            .row_highlight_style(theme::highlight_style())
            .highlight_symbol("▶ ")
            .highlight_spacing(HighlightSpacing::Always);

        frame.render_stateful_widget(table, area, &mut table_state);
    }
}
