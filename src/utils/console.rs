use crate::config::Config;
use crate::display::{ DepthView, DisplayRow, DisplaySettings, format_decimal };
use crate::enums::side::Side;
use tracing::info;
use colored::*;
use figlet_rs::FIGfont;

pub fn print_config(config: &Config) {
    let json = serde_json::to_string_pretty(config).unwrap_or_default();

    info!("\n{}: \n{}", String::from("[CONFIG]").blue().underline(), json.magenta());
}

/// Startup banner; skipped silently when the bundled font cannot be loaded
pub fn print_banner(symbol: &str) {
    if let Ok(font) = FIGfont::standard() {
        if let Some(figure) = font.convert(symbol) {
            println!("{}", figure.to_string().cyan());
        }
    }
}

/// Render the ladder as colored text for the headless and one-shot modes
pub fn render_ladder(symbol: &str, view: &DepthView, settings: &DisplaySettings) -> String {
    let mut out = String::new();
    let rows = view.render_rows(settings.price_precision, settings.quantity_precision);
    let (asks, bids): (Vec<&DisplayRow>, Vec<&DisplayRow>) = rows
        .iter()
        .partition(|row| row.side == Side::Ask);

    out.push_str(
        &format!(
            "{} | step {} | levels {}\n",
            symbol.bold(),
            settings.step,
            settings.levels_to_show
        )
    );
    out.push_str(&format!("{:>14} {:>16} {:>16}\n", "PRICE", "QUANTITY", "TOTAL"));

    for row in asks {
        out.push_str(&shade_row(row, (255, 80, 80)));
        out.push('\n');
    }

    let mid = view.mid_price
        .map(|m| format_decimal(m, settings.price_precision))
        .unwrap_or_else(|| "-".to_string());
    let spread = view.spread
        .map(|s| format_decimal(s, settings.price_precision))
        .unwrap_or_else(|| "-".to_string());
    out.push_str(&format!("{:>14} {}\n", mid.bold().yellow(), format!("spread {}", spread).dimmed()));

    for row in bids {
        out.push_str(&shade_row(row, (80, 220, 120)));
        out.push('\n');
    }

    out
}

/// Quantity cell background scales with the row's share of the side's largest level
fn shade_row(row: &DisplayRow, (r, g, b): (u8, u8, u8)) -> String {
    let scale = |c: u8| ((c as f64) * row.depth_ratio * 0.6).round() as u8;
    format!(
        "{} {} {:>16}",
        format!("{:>14}", row.price).truecolor(r, g, b),
        format!("{:>16}", row.quantity).on_truecolor(scale(r), scale(g), scale(b)),
        row.cumulative
    )
}
