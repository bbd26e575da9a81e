use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;

fn field<'a>(name: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {name:<10}"), theme::dim_style()),
        Span::styled(
            value,
            Style::default()
                .fg(theme::TEXT)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(6)])
        .split(area);

    let account = match app.user() {
        Some(user) => vec![
            Line::from(""),
            field("Username", user.username.clone()),
            field("Email", user.email.clone()),
            field("User ID", user.id.to_string()),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Profile not loaded yet. Press r to refresh.",
                theme::dim_style(),
            )),
        ],
    };
    f.render_widget(
        Paragraph::new(account).block(theme::panel("Account")),
        chunks[0],
    );

    let actions = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  :username <name>     Change your username",
            theme::normal_style(),
        )),
        Line::from(Span::styled(
            "  :email <address>     Change your email address",
            theme::normal_style(),
        )),
        Line::from(Span::styled(
            "  :export [path]       Save expenses as CSV",
            theme::normal_style(),
        )),
        Line::from(Span::styled(
            "  :logout              Log out of this device",
            theme::normal_style(),
        )),
        Line::from(Span::styled(
            "  :delete-account      Delete the account and all its data",
            theme::over_budget_style(),
        )),
    ];
    f.render_widget(
        Paragraph::new(actions).block(theme::panel("Actions")),
        chunks[1],
    );
}
