use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;

use crate::aggregate::{expense_breakdown, total_expenses};
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_money, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Totals
            Constraint::Min(8),    // Chart + breakdown
        ])
        .split(area);

    render_totals(f, chunks[0], app);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_spending_chart(f, lower[0], app);
    render_breakdown(f, lower[1], app);
}

fn render_totals(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let totals = app.totals();
    let over = app.over_budget_count();

    render_card(
        f,
        cards[0],
        "Total Limit",
        format_money(totals.total_limit, &app.currency),
        theme::ACCENT,
        format!("{} budgets", app.budgets.len()),
    );
    render_card(
        f,
        cards[1],
        "Total Spent",
        format_money(totals.total_spent, &app.currency),
        if totals.total_spent > totals.total_limit {
            theme::RED
        } else {
            theme::YELLOW
        },
        String::new(),
    );
    render_card(
        f,
        cards[2],
        "Savings",
        format_money(totals.total_savings, &app.currency),
        theme::GREEN,
        String::new(),
    );
    render_card(
        f,
        cards[3],
        "Over Budget",
        over.to_string(),
        if over > 0 { theme::RED } else { theme::GREEN },
        if over == 1 { "category" } else { "categories" }.to_string(),
    );
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: String, color: Color, sub: String) {
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(sub, theme::dim_style())),
    ])
    .centered()
    .block(theme::panel(title));

    f.render_widget(text, area);
}

fn render_spending_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = theme::panel("Spending by Budget");

    if app.budgets.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No budgets yet. Add one with :add-budget Food 5000",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = app
        .budgets
        .iter()
        .take(12)
        .map(|b| {
            let color = theme::usage_color(b.spent_ratio(), b.is_over_budget());
            Bar::default()
                .value(b.current_spent.round().to_u64().unwrap_or(0))
                .text_value(format_amount(b.current_spent.round()))
                .label(Line::from(truncate(&b.category, 10)))
                .style(Style::default().fg(color))
                .value_style(
                    Style::default()
                        .fg(theme::HEADER_BG)
                        .bg(color)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1);

    f.render_widget(chart, area);
}

fn render_breakdown(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(
        "Expenses · {}",
        format_money(total_expenses(&app.expenses), &app.currency)
    );
    let block = theme::panel(&title);

    let rows = expense_breakdown(&app.expenses);
    if rows.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses recorded",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let name_width = (area.width as usize).saturating_sub(24).clamp(6, 20);
    let items: Vec<ListItem> = rows
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(
                        "{:<width$} ",
                        truncate(&row.category, name_width),
                        width = name_width
                    ),
                    theme::normal_style(),
                ),
                Span::styled(
                    format!("{:>12}", format_amount(row.total)),
                    theme::over_budget_style().remove_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {:>6}", format!("{:.1}%", row.share)),
                    theme::dim_style(),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}
