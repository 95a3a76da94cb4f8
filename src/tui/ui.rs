use ratatui::{
    Frame,
    layout::{ Constraint, Direction, Layout },
    style::{ Color, Modifier, Style },
    text::{ Line, Span },
    widgets::{ Block, Borders, Cell, Paragraph, Row, Table },
};

use crate::display::{ format_decimal, DisplayRow };
use crate::enums::side::Side;
use crate::tui::app::TuiApp;

const ASK_COLOR: (u8, u8, u8) = (235, 87, 87);
const BID_COLOR: (u8, u8, u8) = (39, 174, 96);

pub fn draw(f: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // header
            Constraint::Min(6), // ladder
            Constraint::Length(1), // key help
        ])
        .split(f.area());

    // --- HEADER ---
    let status = match (&app.state.last_error, app.state.last_success_at) {
        (Some(err), _) => Span::styled(format!("stale: {}", err), Style::default().fg(Color::Yellow)),
        (None, Some(at)) =>
            Span::styled(
                format!("updated {}", at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray)
            ),
        (None, None) => Span::styled("waiting for first snapshot", Style::default().fg(Color::DarkGray)),
    };
    let header = Paragraph::new(
        vec![
            Line::from(
                vec![
                    Span::styled(app.symbol.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!("  via {}  ", app.source)),
                    status
                ]
            ),
            Line::from(
                format!(
                    "step {}  price dp {}  qty dp {}  levels {}  ticks {}  failures {}",
                    app.settings.step,
                    app.settings.price_precision,
                    app.settings.quantity_precision,
                    app.settings.levels_to_show,
                    app.state.ticks,
                    app.state.failures
                )
            )
        ]
    ).block(Block::default().title("Depth").borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    // --- LADDER ---
    let mut rows: Vec<Row> = Vec::new();
    if let Some(view) = &app.state.view {
        let rendered = view.render_rows(app.settings.price_precision, app.settings.quantity_precision);
        let (asks, bids): (Vec<&DisplayRow>, Vec<&DisplayRow>) = rendered
            .iter()
            .partition(|r| r.side == Side::Ask);

        rows.extend(asks.into_iter().map(ladder_row));

        let mid = view.mid_price
            .map(|m| format_decimal(m, app.settings.price_precision))
            .unwrap_or_else(|| "-".to_string());
        let spread = view.spread
            .map(|s| format_decimal(s, app.settings.price_precision))
            .unwrap_or_else(|| "-".to_string());
        rows.push(
            Row::new(
                vec![
                    Cell::from(mid).style(
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                    ),
                    Cell::from(format!("spread {}", spread)).style(
                        Style::default().fg(Color::DarkGray)
                    ),
                    Cell::from("")
                ]
            )
        );

        rows.extend(bids.into_iter().map(ladder_row));
    }

    let table = Table::new(rows, [
        Constraint::Length(16), // Price
        Constraint::Length(18), // Quantity
        Constraint::Length(18), // Total
    ])
        .header(
            Row::new(vec!["Price", "Quantity", "Total"]).style(
                Style::default().add_modifier(Modifier::UNDERLINED)
            )
        )
        .block(Block::default().title("Order book").borders(Borders::ALL));
    f.render_widget(table, chunks[1]);

    // --- KEYS ---
    let help = Paragraph::new(
        "[ ] step  p/P price dp  o/O qty dp  +/- levels  r refresh  q quit"
    ).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[2]);
}

fn ladder_row(row: &DisplayRow) -> Row<'static> {
    let (r, g, b) = match row.side {
        Side::Ask => ASK_COLOR,
        Side::Bid => BID_COLOR,
    };
    Row::new(
        vec![
            Cell::from(row.price.clone()).style(Style::default().fg(Color::Rgb(r, g, b))),
            Cell::from(row.quantity.clone()).style(shade(row.depth_ratio, (r, g, b))),
            Cell::from(row.cumulative.clone())
        ]
    )
}

/// Background intensity proportional to the row's depth ratio
pub fn shade(ratio: f64, (r, g, b): (u8, u8, u8)) -> Style {
    let ratio = ratio.clamp(0.0, 1.0);
    let scale = |c: u8| ((c as f64) * ratio * 0.6).round() as u8;
    let style = Style::default().bg(Color::Rgb(scale(r), scale(g), scale(b)));
    if ratio > 0.5 {
        style.fg(Color::White)
    } else {
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{ backend::TestBackend, Terminal };
    use rust_decimal_macros::dec;

    use crate::display::{ DepthView, DisplaySettings };
    use crate::models::level::AggregatedLevel;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn draws_ladder_with_mid_price() {
        let mut app = TuiApp::new("ETHUSDT", "Synthetic", DisplaySettings::default());
        app.state.view = Some(
            DepthView::assemble(
                vec![AggregatedLevel::new(dec!(2499.5), dec!(3))],
                vec![AggregatedLevel::new(dec!(2500.5), dec!(1))],
                10
            ).unwrap()
        );

        let mut terminal = Terminal::new(TestBackend::new(70, 16)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("ETHUSDT"));
        assert!(text.contains("2500.50"));
        assert!(text.contains("2500.00"));
        assert!(text.contains("2499.50"));
        assert!(text.contains("3.0000"));
    }

    #[test]
    fn draws_waiting_state_without_view() {
        let app = TuiApp::new("BTCUSDT", "Binance", DisplaySettings::default());
        let mut terminal = Terminal::new(TestBackend::new(70, 12)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(screen_text(&terminal).contains("waiting for first snapshot"));
    }

    #[test]
    fn shade_scales_with_ratio() {
        assert_eq!(shade(0.0, (200, 100, 50)).bg, Some(Color::Rgb(0, 0, 0)));
        assert_eq!(shade(1.0, (200, 100, 50)).bg, Some(Color::Rgb(120, 60, 30)));
    }
}
