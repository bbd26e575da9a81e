use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::aggregate::total_expenses;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_money, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.expenses.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No expenses recorded", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :add-expense Food 250 [YYYY-MM-DD] [description]",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(theme::panel("Expenses (0)"));
        f.render_widget(msg, area);
        return;
    }

    let header_cells = ["Date", "Category", "Description", "Amount"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .expenses
        .iter()
        .enumerate()
        .skip(app.expense_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, expense)| {
            let style = if i == app.expense_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            // Expenses whose category has no budget are dimmed.
            let category_style = if app
                .budgets
                .iter()
                .any(|b| expense.matches_category(&b.category))
            {
                style
            } else {
                theme::dim_style()
            };

            Row::new(vec![
                Cell::from(expense.date.format("%Y-%m-%d").to_string()),
                Cell::from(Span::styled(
                    truncate(&expense.category, 18),
                    category_style,
                )),
                Cell::from(truncate(expense.description_or_empty(), 40)),
                Cell::from(format_amount(expense.amount)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(20),
        Constraint::Min(20),
        Constraint::Length(14),
    ];

    let title = format!(
        "Expenses ({}) · {}",
        app.expenses.len(),
        format_money(total_expenses(&app.expenses), &app.currency)
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(&title));

    f.render_widget(table, area);
}
