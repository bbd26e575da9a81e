use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, ratio_bar, truncate};

const BAR_WIDTH: usize = 16;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.budgets.is_empty() {
        render_empty(f, area);
        return;
    }

    let header_cells = ["Category", "Limit", "Spent", "Savings", "Used", ""]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .budgets
        .iter()
        .enumerate()
        .skip(app.budget_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, budget)| {
            let over = budget.is_over_budget();
            let ratio = budget.spent_ratio();
            let color = theme::usage_color(ratio, over);

            let style = if i == app.budget_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            let mut category = truncate(&budget.category, 22);
            if budget.image_url.is_some() {
                category.push_str(" ◆");
            }

            let marker = if over {
                Span::styled("OVER", theme::over_budget_style())
            } else {
                Span::raw("")
            };

            Row::new(vec![
                Cell::from(category),
                Cell::from(format_amount(budget.limit)),
                Cell::from(Span::styled(
                    format_amount(budget.current_spent),
                    Style::default().fg(color),
                )),
                Cell::from(Span::styled(
                    format_amount(budget.savings()),
                    theme::savings_style(),
                )),
                Cell::from(Span::styled(
                    ratio_bar(ratio, BAR_WIDTH),
                    Style::default().fg(color),
                )),
                Cell::from(marker),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(BAR_WIDTH as u16 + 1),
        Constraint::Length(5),
    ];

    let totals = app.totals();
    let title = format!(
        "Budgets ({}) · {} left of {}",
        app.budgets.len(),
        format_amount(totals.total_savings),
        format_amount(totals.total_limit)
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(&title));

    f.render_widget(table, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("No budgets yet", theme::dim_style())),
        Line::from(""),
        Line::from(Span::styled(
            "Use :add-budget <category> <limit> [spent] to create one",
            theme::dim_style().add_modifier(Modifier::ITALIC),
        )),
    ])
    .centered()
    .block(theme::panel("Budgets"));
    f.render_widget(msg, area);
}
