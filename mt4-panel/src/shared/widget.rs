//! Ratatui rendering for the panel - one table per display mode plus the footer

use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};

use super::error::RenderError;
use super::view::{Footer, OrderRow, PanelFrame, PendingRow, PositionRow, View};

const C_PROFIT: Color = Color::LightGreen;
const C_LOSS: Color = Color::LightRed;
const C_HEADER: Color = Color::Yellow;
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_ALERT: Color = Color::Rgb(220, 180, 60);

/// Draws a [`PanelFrame`]
///
/// Called by the dashboard while it holds its lock, at most once per state change.
pub trait Renderer: Send {
    fn render(&mut self, frame: &PanelFrame) -> Result<(), RenderError>;
}

/// Renderer backed by a ratatui [`Terminal`]
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }
}

impl<B: Backend + Send> Renderer for TerminalRenderer<B> {
    fn render(&mut self, frame: &PanelFrame) -> Result<(), RenderError> {
        self.terminal.draw(|f| draw_panel(f, frame))?;
        Ok(())
    }
}

/// Draw a whole panel frame
pub fn draw_panel(f: &mut Frame, frame: &PanelFrame) {
    let area = f.area();
    match frame {
        PanelFrame::NoData { account } => draw_no_data(f, area, account),
        PanelFrame::Live { view, footer } => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(1)])
                .split(area);

            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", view.mode().label()))
                .title_alignment(Alignment::Center);

            match view {
                View::Positions(rows) => draw_positions(f, chunks[0], block, rows),
                View::Orders { rows, show_stops } => {
                    draw_orders(f, chunks[0], block, rows, *show_stops)
                }
                View::Pending(rows) => draw_pending(f, chunks[0], block, rows),
            }
            draw_footer(f, chunks[1], footer);
        }
    }
}

fn draw_no_data(f: &mut Frame, area: Rect, account: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .style(Style::default().fg(Color::Red));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1), Constraint::Fill(1)])
        .split(inner);

    let banner = Paragraph::new(format!("{account} - NO DATA"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    f.render_widget(banner, rows[1]);
}

fn header(titles: &[&'static str]) -> Row<'static> {
    Row::new(
        titles
            .iter()
            .map(|title| Cell::from(*title).style(Style::default().fg(C_HEADER).add_modifier(Modifier::BOLD))),
    )
}

fn draw_positions(f: &mut Frame, area: Rect, block: Block, rows: &[PositionRow]) {
    let rows = rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.instrument.clone()),
            Cell::from(row.position.clone()),
            amount_cell(row.profit),
            amount_cell(row.swap),
            amount_cell(row.total).style(
                Style::default()
                    .fg(signed_color(row.total))
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header(&["Symbol", "Position", "Profit", "Swap", "Total"]))
    .block(block);

    f.render_widget(table, area);
}

fn draw_orders(f: &mut Frame, area: Rect, block: Block, rows: &[OrderRow], show_stops: bool) {
    let mut titles = vec!["Symbol", "Ticket", "Type", "Size", "Price"];
    if show_stops {
        titles.extend(["SL", "TP"]);
    }
    titles.extend(["Swap", "Profit"]);

    let mut widths = vec![
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(10),
    ];
    if show_stops {
        widths.extend([Constraint::Length(10), Constraint::Length(10)]);
    }
    widths.extend([Constraint::Length(12), Constraint::Length(12)]);

    let rows = rows.iter().map(|row| {
        let mut cells = vec![
            Cell::from(row.instrument.clone()),
            Cell::from(row.ticket.to_string()),
            Cell::from(row.kind.as_str()),
            Cell::from(format!("{:.2}", row.size)),
            Cell::from(format_price(row.open_price, row.digits)),
        ];
        if show_stops {
            cells.push(Cell::from(format_price(row.stop_loss, row.digits)));
            cells.push(Cell::from(format_price(row.take_profit, row.digits)));
        }
        cells.push(amount_cell(row.swap));
        cells.push(amount_cell(row.profit));

        let style = if row.kind.is_pending() {
            Style::default().fg(C_DIM)
        } else {
            Style::default()
        };
        Row::new(cells).style(style)
    });

    let table = Table::new(rows, widths)
        .header(header(&titles))
        .block(block);

    f.render_widget(table, area);
}

fn draw_pending(f: &mut Frame, area: Rect, block: Block, rows: &[PendingRow]) {
    let rows = rows.iter().map(|row| {
        let style = if row.near_trigger {
            Style::default().fg(C_ALERT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(row.instrument.clone()),
            Cell::from(row.ticket.to_string()),
            Cell::from(row.kind.as_str()),
            Cell::from(format!("{:.2}", row.size)),
            Cell::from(format_price(row.price, row.digits)),
            Cell::from(format_price(row.bid, row.digits)),
            Cell::from(format_price(row.ask, row.digits)),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header(&["Symbol", "Ticket", "Type", "Size", "Price", "Bid", "Ask"]))
    .block(block);

    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, area: Rect, footer: &Footer) {
    let profit_style = Style::default().fg(signed_color(footer.profit));

    let line = if footer.hide_balance {
        Line::from(vec![
            Span::raw("Profit: "),
            Span::styled(format!("${}", format_amount(footer.profit)), profit_style),
        ])
    } else {
        Line::from(vec![
            Span::raw(format!("{} | ", format_amount(footer.balance))),
            Span::styled(
                format!(
                    "{} ({:.2}%)",
                    format_amount(footer.profit),
                    footer.profit_percent
                ),
                profit_style,
            ),
            Span::raw(format!(" | {}", format_amount(footer.equity))),
        ])
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn signed_color(value: f64) -> Color {
    if value < 0.0 {
        C_LOSS
    } else {
        C_PROFIT
    }
}

fn amount_cell(value: f64) -> Cell<'static> {
    Cell::from(format_amount(value)).style(Style::default().fg(signed_color(value)))
}

/// Upper bound on decimals shown for a price
const MAX_DIGITS: u32 = 10;

fn format_price(price: f64, digits: u32) -> String {
    format!("{:.*}", digits.min(MAX_DIGITS) as usize, price)
}

/// Two decimals with thousands separators, e.g. `-12,345.60`
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
